use library_audit_models::{CatalogItem, LibraryEntry, MediaKind};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use crate::error::SourceError;
use crate::status;

// AniList GraphQL endpoint
pub const API_URL: &str = "https://graphql.anilist.co";

pub const PER_PAGE: u32 = 50;
const SEARCH_PER_PAGE: u32 = 5;

const USER_QUERY: &str = "query ($userName: String) { User(name: $userName) { id name } }";

const LIBRARY_QUERY: &str = r#"
query ($page: Int, $perPage: Int, $userId: Int, $mediaType: MediaType) {
    Page (page: $page, perPage: $perPage) {
        pageInfo { currentPage lastPage hasNextPage }
        mediaList(userId: $userId, type: $mediaType) {
            id
            status
            progress
            media {
                id
                siteUrl
                format
                synonyms
                title { romaji english native }
                coverImage { large medium }
            }
        }
    }
}
"#;

const SEARCH_QUERY: &str = r#"
query ($search: String, $page: Int, $perPage: Int, $mediaType: MediaType) {
    Page (page: $page, perPage: $perPage) {
        media(search: $search, type: $mediaType, sort: SEARCH_MATCH) {
            id
            siteUrl
            format
            synonyms
            title { romaji english native }
            coverImage { large medium }
        }
    }
}
"#;

#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
    #[serde(default)]
    status: Option<u16>,
}

#[derive(Debug, Deserialize)]
struct UserData {
    #[serde(rename = "User")]
    user: Option<UserNode>,
}

#[derive(Debug, Deserialize)]
struct UserNode {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct PageData<T> {
    #[serde(rename = "Page")]
    page: Option<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LibraryPage {
    pub page_info: PageInfo,
    #[serde(default)]
    pub media_list: Vec<MediaListEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub current_page: Option<usize>,
    pub last_page: Option<usize>,
    #[serde(default)]
    pub has_next_page: bool,
}

#[derive(Debug, Deserialize)]
pub struct MediaListEntry {
    pub id: Option<i64>,
    pub status: Option<String>,
    pub progress: Option<u32>,
    pub media: Option<Media>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: Option<i64>,
    pub site_url: Option<String>,
    pub format: Option<String>,
    pub synonyms: Option<Vec<String>>,
    pub title: Option<MediaTitle>,
    pub cover_image: Option<CoverImage>,
}

#[derive(Debug, Deserialize)]
pub struct MediaTitle {
    pub romaji: Option<String>,
    pub english: Option<String>,
    pub native: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CoverImage {
    pub large: Option<String>,
    pub medium: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    media: Vec<Media>,
}

impl Media {
    /// Romaji, English, native, then synonyms
    pub fn aliases(&self) -> Vec<String> {
        let mut titles = Vec::new();
        if let Some(title) = &self.title {
            titles.extend(title.romaji.clone());
            titles.extend(title.english.clone());
            titles.extend(title.native.clone());
        }
        if let Some(synonyms) = &self.synonyms {
            titles.extend(synonyms.iter().cloned());
        }
        library_audit_models::entry::ordered_aliases(titles)
    }

    /// Title used on report rows for catalog hits
    pub fn display_title(&self) -> Option<String> {
        self.title
            .as_ref()
            .and_then(|t| t.romaji.clone().or_else(|| t.english.clone()).or_else(|| t.native.clone()))
    }

    /// `siteUrl`, or one built from the id
    pub fn url(&self, kind: MediaKind) -> Option<String> {
        self.site_url
            .clone()
            .or_else(|| self.id.map(|id| format!("https://anilist.co/{}/{}", kind.kitsu_type(), id)))
    }

    pub fn cover(&self) -> Option<String> {
        self.cover_image
            .as_ref()
            .and_then(|c| c.large.clone().or_else(|| c.medium.clone()))
    }

    pub fn is_novel(&self) -> bool {
        self.format.as_deref() == Some("NOVEL")
    }

    /// `None` when the hit carries no id
    pub fn to_catalog_item(&self, kind: MediaKind) -> Option<CatalogItem> {
        let id = self.id?;
        Some(CatalogItem {
            media_id: id.to_string(),
            title: self.display_title(),
            url: self.url(kind).unwrap_or_default(),
            image: self.cover(),
        })
    }
}

/// Convert one list row. `Ok(None)` means the row is deliberately skipped (novels);
/// `Err` carries a warning for a row with missing data.
pub fn library_entry_from_row(
    row: MediaListEntry,
    kind: MediaKind,
    exclude_novels: bool,
) -> Result<Option<LibraryEntry>, String> {
    let media = row
        .media
        .ok_or_else(|| format!("AniList list entry {:?} has no media attached", row.id))?;
    let media_id = media
        .id
        .ok_or_else(|| format!("AniList list entry {:?} has no media id", row.id))?;

    if exclude_novels && kind == MediaKind::Manga && media.is_novel() {
        return Ok(None);
    }

    let titles = media.aliases();
    if titles.is_empty() {
        return Err(format!("AniList media {} has no titles", media_id));
    }

    let entry = LibraryEntry::new(
        media_id.to_string(),
        titles,
        status::from_anilist(row.status.as_deref()),
        row.progress.unwrap_or(0),
        media.url(kind).unwrap_or_default(),
    )
    .with_image(media.cover())
    .with_library_record_id(row.id.map(|id| id.to_string()));

    Ok(Some(entry))
}

async fn post_graphql<T: DeserializeOwned>(
    client: &Client,
    api_url: &str,
    access_token: &str,
    query: &str,
    variables: serde_json::Value,
    context: &str,
) -> Result<T, SourceError> {
    let response = client
        .post(api_url)
        .header("Authorization", format!("Bearer {}", access_token))
        .header("Accept", "application/json")
        .header("Content-Type", "application/json")
        .json(&json!({ "query": query, "variables": variables }))
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        // AniList answers a bad token with 400 "Invalid token"
        if error_text.contains("Invalid token") {
            return Err(SourceError::Auth(format!("{}: {}", context, error_text)));
        }
        return Err(SourceError::from_status(status, context, &error_text));
    }

    let body: GraphQlResponse<T> = response.json().await?;
    if let Some(error) = body.errors.first() {
        return Err(match error.status {
            Some(401) | Some(403) => SourceError::Auth(format!("{}: {}", context, error.message)),
            _ => SourceError::Network(format!("{}: {}", context, error.message)),
        });
    }

    body.data
        .ok_or_else(|| SourceError::DataShape(format!("{}: response has no data", context)))
}

/// Look up the numeric user id for a username
pub async fn get_user_id(
    client: &Client,
    api_url: &str,
    access_token: &str,
    username: &str,
) -> Result<String, SourceError> {
    let data: UserData = post_graphql(
        client,
        api_url,
        access_token,
        USER_QUERY,
        json!({ "userName": username }),
        "AniList user lookup",
    )
    .await?;

    data.user
        .map(|u| u.id.to_string())
        .ok_or_else(|| SourceError::Auth(format!("AniList user '{}' not found", username)))
}

/// Fetch one page of a user's media list
pub async fn get_library_page(
    client: &Client,
    api_url: &str,
    access_token: &str,
    user_id: i64,
    kind: MediaKind,
    page: usize,
) -> Result<LibraryPage, SourceError> {
    let data: PageData<LibraryPage> = post_graphql(
        client,
        api_url,
        access_token,
        LIBRARY_QUERY,
        json!({
            "userId": user_id,
            "page": page,
            "perPage": PER_PAGE,
            "mediaType": kind.anilist_type(),
        }),
        "AniList library page",
    )
    .await?;

    data.page
        .ok_or_else(|| SourceError::DataShape(format!("AniList library page {} missing", page)))
}

/// Search the catalog; results come back in SEARCH_MATCH order
pub async fn search_media(
    client: &Client,
    api_url: &str,
    access_token: &str,
    title: &str,
    kind: MediaKind,
) -> Result<Vec<Media>, SourceError> {
    let data: PageData<SearchPage> = post_graphql(
        client,
        api_url,
        access_token,
        SEARCH_QUERY,
        json!({
            "search": title,
            "page": 1,
            "perPage": SEARCH_PER_PAGE,
            "mediaType": kind.anilist_type(),
        }),
        "AniList search",
    )
    .await?;

    Ok(data.page.map(|p| p.media).unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn media_json() -> serde_json::Value {
        json!({
            "id": 53390,
            "siteUrl": "https://anilist.co/manga/53390",
            "format": "MANGA",
            "synonyms": ["AoT", "Attack on Titan"],
            "title": { "romaji": "Shingeki no Kyojin", "english": "Attack on Titan", "native": "進撃の巨人" },
            "coverImage": { "large": null, "medium": "https://img.test/medium.jpg" }
        })
    }

    #[test]
    fn test_media_aliases_order_and_dedup() {
        let media: Media = serde_json::from_value(media_json()).unwrap();
        assert_eq!(
            media.aliases(),
            vec!["Shingeki no Kyojin", "Attack on Titan", "進撃の巨人", "AoT"]
        );
        assert_eq!(media.cover().as_deref(), Some("https://img.test/medium.jpg"));
        assert_eq!(media.display_title().as_deref(), Some("Shingeki no Kyojin"));
    }

    #[test]
    fn test_library_entry_from_row() {
        let row: MediaListEntry = serde_json::from_value(json!({
            "id": 991,
            "status": "REPEATING",
            "progress": 139,
            "media": media_json()
        }))
        .unwrap();
        let entry = library_entry_from_row(row, MediaKind::Manga, true).unwrap().unwrap();
        assert_eq!(entry.media_id, "53390");
        assert_eq!(entry.progress, 139);
        assert_eq!(entry.status, library_audit_models::CanonicalStatus::Current);
        assert_eq!(entry.library_record_id.as_deref(), Some("991"));
    }

    #[test]
    fn test_library_entry_from_row_skips_novels_and_drops_missing_media() {
        let mut novel = media_json();
        novel["format"] = json!("NOVEL");
        let row: MediaListEntry = serde_json::from_value(json!({ "id": 1, "status": null, "progress": null, "media": novel.clone() })).unwrap();
        assert_eq!(library_entry_from_row(row, MediaKind::Manga, true).unwrap(), None);

        let row: MediaListEntry = serde_json::from_value(json!({ "id": 1, "status": null, "progress": null, "media": novel })).unwrap();
        let kept = library_entry_from_row(row, MediaKind::Manga, false).unwrap().unwrap();
        assert_eq!(kept.status, library_audit_models::CanonicalStatus::Planning);
        assert_eq!(kept.progress, 0);

        let row: MediaListEntry = serde_json::from_value(json!({ "id": 2, "status": "CURRENT", "progress": 1, "media": null })).unwrap();
        assert!(library_entry_from_row(row, MediaKind::Manga, true).is_err());
    }

    #[test]
    fn test_url_fallback() {
        let media: Media = serde_json::from_value(json!({ "id": 5, "title": { "english": "Only English" } })).unwrap();
        assert_eq!(media.url(MediaKind::Anime).as_deref(), Some("https://anilist.co/anime/5"));
        assert_eq!(media.display_title().as_deref(), Some("Only English"));
        assert!(!media.is_novel());
    }

    #[test]
    fn test_row_without_media_id_is_dropped() {
        let mut media = media_json();
        media.as_object_mut().unwrap().remove("id");
        let row: MediaListEntry =
            serde_json::from_value(json!({ "id": 7, "status": "CURRENT", "progress": 3, "media": media })).unwrap();

        let err = library_entry_from_row(row, MediaKind::Manga, true).unwrap_err();
        assert!(err.contains("no media id"), "{}", err);
    }

    #[test]
    fn test_catalog_item_needs_an_id() {
        let media: Media = serde_json::from_value(json!({ "title": { "romaji": "Nameless" } })).unwrap();
        assert!(media.to_catalog_item(MediaKind::Manga).is_none());
        assert_eq!(media.url(MediaKind::Manga), None);

        let media: Media = serde_json::from_value(media_json()).unwrap();
        assert_eq!(media.to_catalog_item(MediaKind::Manga).unwrap().media_id, "53390");
    }
}
