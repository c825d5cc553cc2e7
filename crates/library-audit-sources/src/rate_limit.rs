use async_trait::async_trait;
use library_audit_models::{CatalogItem, MediaKind, Service};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use crate::error::SourceError;
use crate::traits::CatalogSearcher;

/// Wraps a searcher and waits `delay` before every call except the first
pub struct RateLimited<S> {
    inner: S,
    delay: Duration,
    called: AtomicBool,
}

impl<S> RateLimited<S> {
    pub fn new(inner: S, delay: Duration) -> Self {
        Self {
            inner,
            delay,
            called: AtomicBool::new(false),
        }
    }
}

#[async_trait]
impl<S: CatalogSearcher> CatalogSearcher for RateLimited<S> {
    fn service(&self) -> Service {
        self.inner.service()
    }

    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
        if self.called.swap(true, Ordering::SeqCst) && !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.search(title, kind).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;
    use std::time::Instant;

    struct Counting {
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl CatalogSearcher for Counting {
        fn service(&self) -> Service {
            Service::Kitsu
        }

        async fn search(&self, title: &str, _kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Some(CatalogItem {
                media_id: title.to_string(),
                title: Some(title.to_string()),
                url: String::new(),
                image: None,
            }))
        }
    }

    #[tokio::test]
    async fn test_delay_applies_between_calls_only() {
        let calls = Arc::new(AtomicUsize::new(0));
        let limited = RateLimited::new(Counting { calls: calls.clone() }, Duration::from_millis(30));

        let start = Instant::now();
        let first = limited.search("Monster", MediaKind::Manga).await.unwrap();
        assert!(start.elapsed() < Duration::from_millis(30));
        assert_eq!(first.unwrap().media_id, "Monster");

        limited.search("Pluto", MediaKind::Manga).await.unwrap();
        assert!(start.elapsed() >= Duration::from_millis(30));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(limited.service(), Service::Kitsu);
    }
}
