use crate::anilist::api;
use crate::error::SourceError;
use crate::traits::{CatalogSearcher, LibraryFetch, LibraryFetcher, PageProgress};
use async_trait::async_trait;
use library_audit_models::{CatalogItem, MediaKind, Service};
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Create a reqwest Client identifying the tool
pub fn create_anilist_client() -> Client {
    Client::builder()
        .user_agent(concat!("dualshelf/", env!("CARGO_PKG_VERSION")))
        .timeout(Duration::from_secs(30))
        .build()
        .unwrap_or_else(|_| Client::new())
}

#[derive(Clone)]
pub struct AniListClient {
    client: Arc<Client>,
    api_url: String,
    access_token: String,
    exclude_novels: bool,
    page_delay: Duration,
}

impl AniListClient {
    pub fn new(access_token: String) -> Self {
        Self {
            client: Arc::new(create_anilist_client()),
            api_url: api::API_URL.to_string(),
            access_token,
            exclude_novels: true,
            page_delay: Duration::ZERO,
        }
    }

    /// Point the client at another GraphQL endpoint
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn with_exclude_novels(mut self, exclude: bool) -> Self {
        self.exclude_novels = exclude;
        self
    }

    /// Pause between library pages
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub async fn resolve_user_id(&self, username: &str) -> Result<String, SourceError> {
        let user_id = api::get_user_id(&self.client, &self.api_url, &self.access_token, username).await?;
        info!("Resolved AniList user '{}' to id {}", username, user_id);
        Ok(user_id)
    }
}

#[async_trait]
impl LibraryFetcher for AniListClient {
    fn service(&self) -> Service {
        Service::AniList
    }

    async fn fetch(
        &self,
        user_id: &str,
        kind: MediaKind,
        on_page: &mut (dyn FnMut(PageProgress) + Send),
    ) -> Result<LibraryFetch, SourceError> {
        let user_id: i64 = user_id
            .parse()
            .map_err(|_| SourceError::DataShape(format!("AniList user id '{}' is not numeric", user_id)))?;

        let mut fetch = LibraryFetch::default();
        let mut page = 1;

        loop {
            let data = api::get_library_page(&self.client, &self.api_url, &self.access_token, user_id, kind, page).await?;
            debug!("AniList page {} returned {} rows", page, data.media_list.len());

            for row in data.media_list {
                match api::library_entry_from_row(row, kind, self.exclude_novels) {
                    Ok(Some(entry)) => fetch.entries.push(entry),
                    Ok(None) => {}
                    Err(message) => {
                        warn!("{}", message);
                        fetch.dropped.push(message);
                    }
                }
            }

            on_page(PageProgress {
                page: data.page_info.current_page.unwrap_or(page),
                total: data.page_info.last_page,
            });

            if !data.page_info.has_next_page {
                break;
            }
            page += 1;
            if !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        info!("Fetched {} {} entries from AniList", fetch.entries.len(), kind);
        Ok(fetch)
    }
}

#[async_trait]
impl CatalogSearcher for AniListClient {
    fn service(&self) -> Service {
        Service::AniList
    }

    async fn search(&self, title: &str, kind: MediaKind) -> Result<Option<CatalogItem>, SourceError> {
        let results = api::search_media(&self.client, &self.api_url, &self.access_token, title, kind).await?;
        let hit = results
            .iter()
            .filter(|m| !(self.exclude_novels && kind == MediaKind::Manga && m.is_novel()))
            .find_map(|m| m.to_catalog_item(kind));
        debug!("AniList search '{}' -> {:?}", title, hit.as_ref().map(|h| &h.media_id));
        Ok(hit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use serde_json::json;

    fn media(id: i64, romaji: &str, format: &str) -> serde_json::Value {
        json!({
            "id": id,
            "siteUrl": format!("https://anilist.co/manga/{}", id),
            "format": format,
            "synonyms": [],
            "title": { "romaji": romaji, "english": null, "native": null },
            "coverImage": { "large": "https://img.test/l.jpg", "medium": null }
        })
    }

    fn page(current: usize, last: usize, rows: Vec<serde_json::Value>) -> String {
        json!({
            "data": { "Page": {
                "pageInfo": { "currentPage": current, "lastPage": last, "hasNextPage": current < last },
                "mediaList": rows
            }}
        })
        .to_string()
    }

    #[tokio::test]
    async fn test_fetch_walks_pages_and_drops_bad_rows() {
        let mut server = mockito::Server::new_async().await;
        let first = server
            .mock("POST", "/")
            .match_header("authorization", "Bearer token")
            .match_body(Matcher::PartialJson(json!({ "variables": { "page": 1 } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(1, 2, vec![
                json!({ "id": 1, "status": "CURRENT", "progress": 10, "media": media(100, "Monster", "MANGA") }),
                json!({ "id": 2, "status": "PLANNING", "progress": 0, "media": media(101, "Spice", "NOVEL") }),
            ]))
            .create_async()
            .await;
        let second = server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "variables": { "page": 2 } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(page(2, 2, vec![
                json!({ "id": 3, "status": "COMPLETED", "progress": 162, "media": media(102, "Pluto", "MANGA") }),
                json!({ "id": 4, "status": "COMPLETED", "progress": 1, "media": null }),
                json!({ "id": 5, "status": "CURRENT", "progress": 2, "media": { "title": { "romaji": "Idless" } } }),
            ]))
            .create_async()
            .await;

        let client = AniListClient::new("token".to_string()).with_api_url(server.url());
        let mut pages = Vec::new();
        let fetch = client
            .fetch("42", MediaKind::Manga, &mut |p| pages.push(p))
            .await
            .unwrap();

        first.assert_async().await;
        second.assert_async().await;
        let ids: Vec<_> = fetch.entries.iter().map(|e| e.media_id.as_str()).collect();
        assert_eq!(ids, vec!["100", "102"]);
        assert_eq!(fetch.dropped.len(), 2);
        assert_eq!(pages, vec![
            PageProgress { page: 1, total: Some(2) },
            PageProgress { page: 2, total: Some(2) },
        ]);
    }

    #[tokio::test]
    async fn test_invalid_token_is_auth_error() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(400)
            .with_body(r#"{"errors":[{"message":"Invalid token","status":400}],"data":null}"#)
            .create_async()
            .await;

        let client = AniListClient::new("bad".to_string()).with_api_url(server.url());
        let err = client.fetch("42", MediaKind::Manga, &mut |_| {}).await.unwrap_err();
        assert!(err.is_auth());
    }

    #[tokio::test]
    async fn test_search_skips_novels() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "variables": { "search": "Spice and Wolf" } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(json!({ "data": { "Page": { "media": [
                media(1, "Ookami to Koushinryou", "NOVEL"),
                media(2, "Ookami to Koushinryou", "MANGA"),
            ]}}}).to_string())
            .create_async()
            .await;

        let client = AniListClient::new("token".to_string()).with_api_url(server.url());
        let hit = client.search("Spice and Wolf", MediaKind::Manga).await.unwrap().unwrap();
        assert_eq!(hit.media_id, "2");
        assert_eq!(hit.title.as_deref(), Some("Ookami to Koushinryou"));
        assert_eq!(hit.image.as_deref(), Some("https://img.test/l.jpg"));
    }

    #[tokio::test]
    async fn test_search_empty_and_user_lookup() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "variables": { "userName": "reader" } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"User":{"id":777,"name":"reader"}}}"#)
            .create_async()
            .await;
        server
            .mock("POST", "/")
            .match_body(Matcher::PartialJson(json!({ "variables": { "search": "Nothing" } })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"Page":{"media":[]}}}"#)
            .create_async()
            .await;

        let client = AniListClient::new("token".to_string()).with_api_url(server.url());
        assert_eq!(client.resolve_user_id("reader").await.unwrap(), "777");
        assert!(client.search("Nothing", MediaKind::Manga).await.unwrap().is_none());
    }
}
