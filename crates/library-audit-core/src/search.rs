use crate::cancel::CancelFlag;
use crate::engine::ReconcileError;
use crate::matcher::MatchState;
use crate::normalize::search_query;
use crate::progress::ProgressSink;
use library_audit_models::{
    CatalogItem, EntrySnapshot, LibraryEntry, MediaKind, Report, ReportBucket, ReportItem, Service, SuppressedMatch,
};
use library_audit_sources::CatalogSearcher;
use std::collections::HashSet;
use tracing::{debug, warn};

/// Looks up entries left unmatched in the other service's full catalog
pub struct CatalogReconciler<'s> {
    anilist: &'s dyn CatalogSearcher,
    kitsu: &'s dyn CatalogSearcher,
    kind: MediaKind,
    cancel: CancelFlag,
}

enum Outcome {
    /// The hit is already in the user's library on the target service
    Suppressed(CatalogItem),
    /// Another entry already found this catalog item
    Duplicate,
    Found(CatalogItem),
    NotFound,
}

impl<'s> CatalogReconciler<'s> {
    pub fn new(
        anilist: &'s dyn CatalogSearcher,
        kitsu: &'s dyn CatalogSearcher,
        kind: MediaKind,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            anilist,
            kitsu,
            kind,
            cancel,
        }
    }

    fn searcher(&self, target: Service) -> &'s dyn CatalogSearcher {
        match target {
            Service::AniList => self.anilist,
            Service::Kitsu => self.kitsu,
        }
    }

    /// Search unmatched Kitsu entries on AniList, then the AniList entries
    /// still unmatched on Kitsu, filling the found/not-found buckets.
    pub async fn run(
        &self,
        anilist_entries: &[LibraryEntry],
        kitsu_entries: &[LibraryEntry],
        state: &mut MatchState,
        report: &mut Report,
        sink: &mut dyn ProgressSink,
    ) -> Result<(), ReconcileError> {
        let anilist_library: HashSet<&str> = anilist_entries.iter().map(|e| e.media_id.as_str()).collect();
        let kitsu_library: HashSet<&str> = kitsu_entries.iter().map(|e| e.media_id.as_str()).collect();

        let unmatched_kitsu = state.unmatched_kitsu(kitsu_entries);
        let mut total = unmatched_kitsu.len() + state.unmatched_anilist(anilist_entries).len();
        let mut current = 0;

        sink.log("--- Searching for database matches for missing items ---".to_string());

        let mut found_on_anilist = HashSet::new();
        for entry in unmatched_kitsu {
            current += 1;
            let title = entry.display_title();
            sink.progress(format!("Searching AniList for: {}", title), current, total);

            let outcome = self
                .resolve(Service::AniList, entry, &anilist_library, &mut found_on_anilist, sink)
                .await?;
            match outcome {
                Outcome::Suppressed(hit) => {
                    sink.log(format!("  -> SKIP: AniList media {} for {} is already in user library.", hit.media_id, title));
                    state.mark_anilist(&hit.media_id);
                    report.suppressed.push(SuppressedMatch {
                        target: Service::AniList,
                        source_title: title.to_string(),
                        target_media_id: hit.media_id,
                    });
                }
                Outcome::Duplicate => {
                    sink.log(format!("  -> Skipping duplicate AniList DB match for: {}", title));
                }
                Outcome::Found(hit) => {
                    sink.log(format!("  -> Found AniList DB match for: {}", title));
                    report.push(
                        ReportBucket::FoundOnAnilist,
                        ReportItem {
                            anilist: Some(EntrySnapshot::from_catalog(&hit)),
                            kitsu: Some(EntrySnapshot::from_entry(entry)),
                        },
                    );
                }
                Outcome::NotFound => {
                    sink.log(format!("  -> No AniList DB match for: {}", title));
                    report.push(
                        ReportBucket::NotFoundOnAnilist,
                        ReportItem {
                            anilist: None,
                            kitsu: Some(EntrySnapshot::from_entry(entry)),
                        },
                    );
                }
            }
        }

        // suppressions above may have resolved AniList entries
        let unmatched_anilist = state.unmatched_anilist(anilist_entries);
        total = current + unmatched_anilist.len();

        let mut found_on_kitsu = HashSet::new();
        for entry in unmatched_anilist {
            current += 1;
            let title = entry.display_title();
            sink.progress(format!("Searching Kitsu for: {}", title), current, total);

            let outcome = self
                .resolve(Service::Kitsu, entry, &kitsu_library, &mut found_on_kitsu, sink)
                .await?;
            match outcome {
                Outcome::Suppressed(hit) => {
                    sink.log(format!("  -> SKIP: Kitsu media {} for {} is already in user library.", hit.media_id, title));
                    state.mark_kitsu(&hit.media_id);
                    report.suppressed.push(SuppressedMatch {
                        target: Service::Kitsu,
                        source_title: title.to_string(),
                        target_media_id: hit.media_id,
                    });
                }
                Outcome::Duplicate => {
                    sink.log(format!("  -> Skipping duplicate Kitsu DB match for: {}", title));
                }
                Outcome::Found(hit) => {
                    sink.log(format!("  -> Found Kitsu DB match for: {}", title));
                    report.push(
                        ReportBucket::FoundOnKitsu,
                        ReportItem {
                            anilist: Some(EntrySnapshot::from_entry(entry)),
                            kitsu: Some(EntrySnapshot::from_catalog(&hit)),
                        },
                    );
                }
                Outcome::NotFound => {
                    sink.log(format!("  -> No Kitsu DB match for: {}", title));
                    report.push(
                        ReportBucket::NotFoundOnKitsu,
                        ReportItem {
                            anilist: Some(EntrySnapshot::from_entry(entry)),
                            kitsu: None,
                        },
                    );
                }
            }
        }

        Ok(())
    }

    async fn resolve(
        &self,
        target: Service,
        entry: &LibraryEntry,
        library: &HashSet<&str>,
        found: &mut HashSet<String>,
        sink: &mut dyn ProgressSink,
    ) -> Result<Outcome, ReconcileError> {
        let Some(hit) = self.search_aliases(target, entry, sink).await? else {
            return Ok(Outcome::NotFound);
        };
        if library.contains(hit.media_id.as_str()) {
            return Ok(Outcome::Suppressed(hit));
        }
        if !found.insert(hit.media_id.clone()) {
            return Ok(Outcome::Duplicate);
        }
        Ok(Outcome::Found(hit))
    }

    /// Try each alias in order until the catalog returns something
    async fn search_aliases(
        &self,
        target: Service,
        entry: &LibraryEntry,
        sink: &mut dyn ProgressSink,
    ) -> Result<Option<CatalogItem>, ReconcileError> {
        let searcher = self.searcher(target);
        for alias in &entry.titles {
            let Some(query) = search_query(alias) else {
                continue;
            };
            if self.cancel.is_cancelled() {
                return Err(ReconcileError::Cancelled);
            }
            match searcher.search(&query, self.kind).await {
                Ok(Some(hit)) => {
                    debug!("{} search '{}' hit {}", target, query, hit.media_id);
                    return Ok(Some(hit));
                }
                Ok(None) => debug!("{} search '{}' returned nothing", target, query),
                Err(e) => {
                    // a failed search only means no match for this alias
                    warn!("{} search for '{}' failed: {}", target, query, e);
                    sink.warning(format!("{} search for '{}' failed: {}", target, query, e));
                }
            }
        }
        Ok(None)
    }
}
