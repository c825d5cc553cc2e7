use async_trait::async_trait;
use library_audit_models::{CatalogItem, LibraryEntry, MediaKind, Service};
use crate::error::SourceError;

/// Page counter reported while a library is being fetched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageProgress {
    /// 1-based page just fetched
    pub page: usize,
    /// Total pages, when the service reports it
    pub total: Option<usize>,
}

/// Entries fetched from one user's library
#[derive(Debug, Default)]
pub struct LibraryFetch {
    pub entries: Vec<LibraryEntry>,
    /// One message per row dropped for missing data
    pub dropped: Vec<String>,
}

/// Reads a user's tracked library from one service
#[async_trait]
pub trait LibraryFetcher: Send + Sync {
    fn service(&self) -> Service;

    /// Fetch every page of the user's library for `kind`, calling `on_page` after each page
    async fn fetch(
        &self,
        user_id: &str,
        kind: MediaKind,
        on_page: &mut (dyn FnMut(PageProgress) + Send),
    ) -> Result<LibraryFetch, SourceError>;
}

/// Looks up a title in one service's public catalog
#[async_trait]
pub trait CatalogSearcher: Send + Sync {
    fn service(&self) -> Service;

    /// Best single match for `title`, or `None` when the catalog has nothing
    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError>;
}

#[async_trait]
impl<T: CatalogSearcher + ?Sized> CatalogSearcher for Box<T> {
    fn service(&self) -> Service {
        (**self).service()
    }

    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
        (**self).search(title, kind).await
    }
}

#[async_trait]
impl<T: CatalogSearcher + ?Sized> CatalogSearcher for std::sync::Arc<T> {
    fn service(&self) -> Service {
        (**self).service()
    }

    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
        (**self).search(title, kind).await
    }
}
