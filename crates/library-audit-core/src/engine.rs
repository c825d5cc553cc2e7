use crate::cancel::CancelFlag;
use crate::compare::compare;
use crate::dedupe::dedupe_found;
use crate::matcher::match_libraries;
use crate::progress::ProgressSink;
use crate::search::CatalogReconciler;
use library_audit_models::{LibraryEntry, MediaKind, Report};
use library_audit_sources::CatalogSearcher;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("audit cancelled")]
    Cancelled,
}

/// Catalog search on each side
#[derive(Clone, Copy)]
pub struct Searchers<'s> {
    pub anilist: &'s dyn CatalogSearcher,
    pub kitsu: &'s dyn CatalogSearcher,
}

/// Build the full report for two fetched libraries
pub async fn reconcile(
    anilist: &[LibraryEntry],
    kitsu: &[LibraryEntry],
    kind: MediaKind,
    searchers: Searchers<'_>,
    sink: &mut dyn ProgressSink,
    cancel: &CancelFlag,
) -> Result<Report, ReconcileError> {
    if cancel.is_cancelled() {
        return Err(ReconcileError::Cancelled);
    }

    let mut report = Report::new(kind);
    let outcome = match_libraries(anilist, kitsu, sink);
    for pair in &outcome.pairs {
        let (bucket, item) = compare(pair.anilist, pair.kitsu);
        report.push(bucket, item);
    }
    info!("Matched {} of {} AniList / {} Kitsu entries", outcome.pairs.len(), anilist.len(), kitsu.len());

    let mut state = outcome.state;
    CatalogReconciler::new(searchers.anilist, searchers.kitsu, kind, cancel.clone())
        .run(anilist, kitsu, &mut state, &mut report, sink)
        .await?;

    let removed = dedupe_found(&mut report);
    if removed > 0 {
        sink.log(format!("Removed {} duplicate or resolved report rows", removed));
    }

    report.summarize(anilist.len(), kitsu.len());
    sink.log("--- Audit complete ---".to_string());
    Ok(report)
}
