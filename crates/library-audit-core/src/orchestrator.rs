use crate::cancel::CancelFlag;
use crate::engine::{reconcile, ReconcileError, Searchers};
use crate::progress::ProgressSink;
use library_audit_config::{AuditOptions, Config, CredentialStore};
use library_audit_models::{LibraryEntry, MediaKind, Report, Service};
use library_audit_sources::kitsu::TokenInfo;
use library_audit_sources::{
    connect_services, CatalogSearcher, ConnectedServices, LibraryFetcher, PageProgress, RateLimited, ServiceEndpoints,
    SourceError,
};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum AuditError {
    #[error("could not connect: {0}")]
    Connect(#[source] SourceError),
    #[error("failed to fetch {service} library: {source}")]
    Fetch {
        service: Service,
        #[source]
        source: SourceError,
    },
    #[error("audit cancelled")]
    Cancelled,
}

impl AuditError {
    pub fn is_auth(&self) -> bool {
        match self {
            AuditError::Connect(source) | AuditError::Fetch { source, .. } => source.is_auth(),
            AuditError::Cancelled => false,
        }
    }
}

impl From<ReconcileError> for AuditError {
    fn from(err: ReconcileError) -> Self {
        match err {
            ReconcileError::Cancelled => AuditError::Cancelled,
        }
    }
}

/// One full audit: fetch both libraries, then reconcile them
pub struct AuditOrchestrator {
    anilist_fetcher: Arc<dyn LibraryFetcher>,
    kitsu_fetcher: Arc<dyn LibraryFetcher>,
    anilist_searcher: Arc<dyn CatalogSearcher>,
    kitsu_searcher: Arc<dyn CatalogSearcher>,
    anilist_user_id: String,
    kitsu_user_id: String,
    kind: MediaKind,
    cancel: CancelFlag,
}

impl AuditOrchestrator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        anilist_fetcher: Arc<dyn LibraryFetcher>,
        kitsu_fetcher: Arc<dyn LibraryFetcher>,
        anilist_searcher: Arc<dyn CatalogSearcher>,
        kitsu_searcher: Arc<dyn CatalogSearcher>,
        anilist_user_id: String,
        kitsu_user_id: String,
        kind: MediaKind,
        cancel: CancelFlag,
    ) -> Self {
        Self {
            anilist_fetcher,
            kitsu_fetcher,
            anilist_searcher,
            kitsu_searcher,
            anilist_user_id,
            kitsu_user_id,
            kind,
            cancel,
        }
    }

    /// Wire connected clients, rate-limiting catalog searches by `search_delay_ms`
    pub fn from_services(services: ConnectedServices, options: &AuditOptions, cancel: CancelFlag) -> Self {
        let delay = Duration::from_millis(options.search_delay_ms);
        Self::new(
            Arc::new(services.anilist.clone()),
            Arc::new(services.kitsu.clone()),
            Arc::new(RateLimited::new(services.anilist, delay)),
            Arc::new(RateLimited::new(services.kitsu, delay)),
            services.anilist_user_id,
            services.kitsu_user_id,
            options.media_kind,
            cancel,
        )
    }

    /// Authenticate both services; also returns a freshly issued Kitsu token to persist
    pub async fn connect(
        config: &Config,
        credentials: &CredentialStore,
        endpoints: &ServiceEndpoints,
        cancel: CancelFlag,
    ) -> Result<(Self, Option<TokenInfo>), AuditError> {
        let mut services = connect_services(config, credentials, endpoints)
            .await
            .map_err(AuditError::Connect)?;
        let token = services.refreshed_kitsu_token.take();
        Ok((Self::from_services(services, &config.audit, cancel), token))
    }

    pub fn with_media_kind(mut self, kind: MediaKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn media_kind(&self) -> MediaKind {
        self.kind
    }

    pub fn cancel_flag(&self) -> CancelFlag {
        self.cancel.clone()
    }

    pub async fn run(&self, sink: &mut dyn ProgressSink) -> Result<Report, AuditError> {
        info!("Starting {} audit", self.kind);

        let anilist = self
            .fetch(self.anilist_fetcher.as_ref(), &self.anilist_user_id, sink)
            .await?;
        let kitsu = self
            .fetch(self.kitsu_fetcher.as_ref(), &self.kitsu_user_id, sink)
            .await?;

        let searchers = Searchers {
            anilist: self.anilist_searcher.as_ref(),
            kitsu: self.kitsu_searcher.as_ref(),
        };
        let report = reconcile(&anilist, &kitsu, self.kind, searchers, sink, &self.cancel).await?;

        info!(
            ok = report.summary.ok,
            mismatch_status = report.summary.mismatch_status,
            anilist_higher = report.summary.anilist_higher,
            kitsu_higher = report.summary.kitsu_higher,
            "Audit finished"
        );
        Ok(report)
    }

    async fn fetch(
        &self,
        fetcher: &dyn LibraryFetcher,
        user_id: &str,
        sink: &mut dyn ProgressSink,
    ) -> Result<Vec<LibraryEntry>, AuditError> {
        if self.cancel.is_cancelled() {
            return Err(AuditError::Cancelled);
        }

        let service = fetcher.service();
        sink.log(format!("Fetching {} {} library (this may take a moment)...", service, self.kind));

        let fetched = {
            let mut on_page = |page: PageProgress| {
                sink.progress(
                    format!("Fetching {} page {}...", service, page.page),
                    page.page,
                    page.total.unwrap_or(page.page),
                );
            };
            // Dropping the fetch future abandons its in-flight request and remaining pages
            tokio::select! {
                biased;
                _ = self.cancel.cancelled() => {
                    info!("{} fetch cancelled", service);
                    return Err(AuditError::Cancelled);
                }
                fetched = fetcher.fetch(user_id, self.kind, &mut on_page) => {
                    fetched.map_err(|source| AuditError::Fetch { service, source })?
                }
            }
        };

        for message in fetched.dropped {
            sink.warning(message);
        }
        sink.log(format!("  -> {} fetch complete: {} entries.", service, fetched.entries.len()));
        Ok(fetched.entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::progress::{CollectingSink, ProgressEvent};
    use async_trait::async_trait;
    use library_audit_models::{CanonicalStatus, CatalogItem};
    use library_audit_sources::LibraryFetch;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeLibrary {
        service: Service,
        pages: Vec<Vec<LibraryEntry>>,
        dropped: Vec<String>,
        reject: bool,
        page_delay: Duration,
        pages_served: Arc<AtomicUsize>,
    }

    impl FakeLibrary {
        fn new(service: Service, pages: Vec<Vec<LibraryEntry>>) -> Self {
            Self {
                service,
                pages,
                dropped: Vec::new(),
                reject: false,
                page_delay: Duration::ZERO,
                pages_served: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl LibraryFetcher for FakeLibrary {
        fn service(&self) -> Service {
            self.service
        }

        async fn fetch(
            &self,
            _user_id: &str,
            _kind: MediaKind,
            on_page: &mut (dyn FnMut(PageProgress) + Send),
        ) -> Result<LibraryFetch, SourceError> {
            if self.reject {
                return Err(SourceError::Auth("token expired".to_string()));
            }
            let mut fetch = LibraryFetch::default();
            for (i, page) in self.pages.iter().enumerate() {
                if !self.page_delay.is_zero() {
                    tokio::time::sleep(self.page_delay).await;
                }
                self.pages_served.fetch_add(1, Ordering::SeqCst);
                fetch.entries.extend(page.iter().cloned());
                on_page(PageProgress {
                    page: i + 1,
                    total: Some(self.pages.len()),
                });
            }
            fetch.dropped = self.dropped.clone();
            Ok(fetch)
        }
    }

    struct EmptyCatalog(Service);

    #[async_trait]
    impl CatalogSearcher for EmptyCatalog {
        fn service(&self) -> Service {
            self.0
        }

        async fn search(&self, _title: &str, _kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
            Ok(None)
        }
    }

    fn entry(id: &str, title: &str, progress: u32) -> LibraryEntry {
        LibraryEntry::new(id, vec![title.to_string()], CanonicalStatus::Current, progress, "https://example.test")
    }

    fn orchestrator(anilist: FakeLibrary, kitsu: FakeLibrary) -> AuditOrchestrator {
        AuditOrchestrator::new(
            Arc::new(anilist),
            Arc::new(kitsu),
            Arc::new(EmptyCatalog(Service::AniList)),
            Arc::new(EmptyCatalog(Service::Kitsu)),
            "1".to_string(),
            "2".to_string(),
            MediaKind::Manga,
            CancelFlag::new(),
        )
    }

    #[tokio::test]
    async fn test_run_reports_pages_and_dropped_rows() {
        let anilist = FakeLibrary::new(
            Service::AniList,
            vec![vec![entry("a1", "Monster", 162)], vec![entry("a2", "Pluto", 8)]],
        );
        let mut kitsu = FakeLibrary::new(Service::Kitsu, vec![vec![entry("k1", "Monster", 100)]]);
        kitsu.dropped.push("Kitsu manga 77 has no titles".to_string());

        let mut sink = CollectingSink::new();
        let report = orchestrator(anilist, kitsu).run(&mut sink).await.unwrap();

        assert_eq!(report.summary.anilist_higher, 1);
        assert_eq!(report.summary.not_found_on_kitsu, 1);
        assert_eq!(report.summary.anilist_total, 2);
        assert_eq!(sink.warnings(), vec!["Kitsu manga 77 has no titles"]);

        let pages: Vec<_> = sink
            .events
            .iter()
            .filter_map(|e| match e {
                ProgressEvent::Progress { message, current, total } if message.starts_with("Fetching") => {
                    Some((message.clone(), *current, *total))
                }
                _ => None,
            })
            .collect();
        assert_eq!(pages, vec![
            ("Fetching AniList page 1...".to_string(), 1, 2),
            ("Fetching AniList page 2...".to_string(), 2, 2),
            ("Fetching Kitsu page 1...".to_string(), 1, 1),
        ]);
    }

    #[tokio::test]
    async fn test_auth_failure_halts_run() {
        let anilist = FakeLibrary::new(Service::AniList, vec![vec![entry("a1", "Monster", 1)]]);
        let mut kitsu = FakeLibrary::new(Service::Kitsu, vec![]);
        kitsu.reject = true;

        let err = orchestrator(anilist, kitsu).run(&mut CollectingSink::new()).await.unwrap_err();

        assert!(err.is_auth());
        assert!(matches!(err, AuditError::Fetch { service: Service::Kitsu, .. }));
    }

    #[tokio::test]
    async fn test_cancelled_before_fetch() {
        let audit = orchestrator(
            FakeLibrary::new(Service::AniList, vec![]),
            FakeLibrary::new(Service::Kitsu, vec![]),
        )
        .with_media_kind(MediaKind::Anime);
        audit.cancel_flag().cancel();

        let err = audit.run(&mut CollectingSink::new()).await.unwrap_err();
        assert!(matches!(err, AuditError::Cancelled));
        assert_eq!(audit.media_kind(), MediaKind::Anime);
    }

    #[tokio::test]
    async fn test_cancel_during_fetch_stops_paging() {
        let pages = (0..20).map(|i| vec![entry(&format!("k{}", i), "Monster", 1)]).collect();
        let mut kitsu = FakeLibrary::new(Service::Kitsu, pages);
        kitsu.page_delay = Duration::from_millis(20);
        let served = kitsu.pages_served.clone();

        let audit = orchestrator(FakeLibrary::new(Service::AniList, vec![]), kitsu);
        let cancel = audit.cancel_flag();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(70)).await;
            cancel.cancel();
        });

        let err = audit.run(&mut CollectingSink::new()).await.unwrap_err();

        assert!(matches!(err, AuditError::Cancelled));
        let served_at_cancel = served.load(Ordering::SeqCst);
        assert!(served_at_cancel < 20, "all pages were fetched");
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(served.load(Ordering::SeqCst), served_at_cancel);
    }
}
