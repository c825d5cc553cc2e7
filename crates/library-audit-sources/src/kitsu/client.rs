use crate::error::SourceError;
use crate::kitsu::api::{self, MediaResource};
use crate::kitsu::auth::{self, TokenInfo};
use crate::status;
use crate::traits::{CatalogSearcher, LibraryFetch, LibraryFetcher, PageProgress};
use async_trait::async_trait;
use library_audit_models::{CatalogItem, LibraryEntry, MediaKind, Service};
use reqwest::Client;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct KitsuClient {
    client: Arc<Client>,
    api_root: String,
    access_token: String,
    exclude_novels: bool,
    page_delay: Duration,
}

impl KitsuClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Arc::new(auth::create_kitsu_client()),
            api_root: auth::API_ROOT.to_string(),
            access_token,
            exclude_novels: true,
            page_delay: Duration::ZERO,
        }
    }

    /// Log in with a password grant and build a client around the new token
    pub async fn login(api_root: &str, username: &str, password: &str) -> Result<(Self, TokenInfo), SourceError> {
        let http = auth::create_kitsu_client();
        let token = auth::password_grant(&http, api_root, username, password).await?;
        info!("Authenticated to Kitsu as {}", username);
        let client = Self {
            client: Arc::new(http),
            api_root: api_root.to_string(),
            access_token: token.access_token.clone(),
            exclude_novels: true,
            page_delay: Duration::ZERO,
        };
        Ok((client, token))
    }

    pub fn with_api_root(mut self, api_root: impl Into<String>) -> Self {
        self.api_root = api_root.into();
        self
    }

    pub fn with_exclude_novels(mut self, exclude: bool) -> Self {
        self.exclude_novels = exclude;
        self
    }

    /// Pause between library pages and before fallback media lookups
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub async fn resolve_user_id(&self) -> Result<String, SourceError> {
        let user_id = api::get_self_user_id(&self.client, &self.api_root, &self.access_token).await?;
        info!("Resolved Kitsu user id {}", user_id);
        Ok(user_id)
    }

    async fn pause(&self) {
        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }
    }

    fn to_entry(&self, media: &MediaResource, record: &api::LibraryEntryResource, kind: MediaKind) -> Result<Option<LibraryEntry>, String> {
        if self.exclude_novels && kind == MediaKind::Manga && media.is_novel() {
            return Ok(None);
        }
        let titles = media.aliases();
        if titles.is_empty() {
            return Err(format!("Kitsu {} {} has no titles", kind.kitsu_type(), media.id));
        }
        let entry = LibraryEntry::new(
            media.id.clone(),
            titles,
            status::from_kitsu(record.attributes.status.as_deref()),
            record.attributes.progress.unwrap_or(0),
            media.url(kind),
        )
        .with_image(media.poster())
        .with_library_record_id(Some(record.id.clone()));
        Ok(Some(entry))
    }
}

#[async_trait]
impl LibraryFetcher for KitsuClient {
    fn service(&self) -> Service {
        Service::Kitsu
    }

    async fn fetch(
        &self,
        user_id: &str,
        kind: MediaKind,
        on_page: &mut (dyn FnMut(PageProgress) + Send),
    ) -> Result<LibraryFetch, SourceError> {
        let mut fetch = LibraryFetch::default();
        let mut media_by_id: HashMap<String, MediaResource> = HashMap::new();
        let mut page = 1;

        let mut doc = api::get_first_library_page(&self.client, &self.api_root, &self.access_token, user_id, kind).await?;
        let total = doc
            .meta
            .as_ref()
            .and_then(|m| m.count)
            .map(|count| count.div_ceil(api::PAGE_LIMIT).max(1));

        loop {
            for media in doc.included.drain(..) {
                if media.kind == kind.kitsu_type() {
                    media_by_id.entry(media.id.clone()).or_insert(media);
                }
            }

            for record in &doc.data {
                let Some(media_id) = record.media_id(kind) else {
                    let message = format!("Kitsu library entry {} has no {} attached", record.id, kind.kitsu_type());
                    warn!("{}", message);
                    fetch.dropped.push(message);
                    continue;
                };

                if !media_by_id.contains_key(media_id) {
                    debug!("Kitsu included data missing {}, fetching it directly", media_id);
                    self.pause().await;
                    match api::get_media(&self.client, &self.api_root, &self.access_token, kind, media_id).await {
                        Ok(media) => {
                            media_by_id.insert(media_id.to_string(), media);
                        }
                        Err(e) => {
                            let message = format!("Kitsu {} {} could not be loaded: {}", kind.kitsu_type(), media_id, e);
                            warn!("{}", message);
                            fetch.dropped.push(message);
                            continue;
                        }
                    }
                }

                let Some(media) = media_by_id.get(media_id) else {
                    continue;
                };
                match self.to_entry(media, record, kind) {
                    Ok(Some(entry)) => fetch.entries.push(entry),
                    Ok(None) => {}
                    Err(message) => {
                        warn!("{}", message);
                        fetch.dropped.push(message);
                    }
                }
            }

            on_page(PageProgress { page, total });

            let Some(next) = doc.links.as_ref().and_then(|l| l.next.clone()) else {
                break;
            };
            page += 1;
            self.pause().await;
            doc = api::get_library_page(&self.client, &next, &self.access_token).await?;
        }

        info!("Fetched {} {} entries from Kitsu", fetch.entries.len(), kind);
        Ok(fetch)
    }
}

#[async_trait]
impl CatalogSearcher for KitsuClient {
    fn service(&self) -> Service {
        Service::Kitsu
    }

    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
        let results = api::search_media(&self.client, &self.api_root, &self.access_token, title, kind).await?;
        let hit = results
            .iter()
            .find(|m| !(self.exclude_novels && kind == MediaKind::Manga && m.is_novel()))
            .map(|m| m.to_catalog_item(kind));
        debug!("Kitsu search '{}' -> {:?}", title, hit.as_ref().map(|h| &h.media_id));
        Ok(hit)
    }
}
