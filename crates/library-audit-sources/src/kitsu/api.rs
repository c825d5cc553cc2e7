use crate::error::SourceError;
use library_audit_models::{CatalogItem, MediaKind};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const PAGE_LIMIT: usize = 50;
const SEARCH_LIMIT: usize = 5;
const LIBRARY_STATUSES: &str = "current,completed,on_hold,dropped,planned";

#[derive(Debug, Deserialize)]
pub struct Document<T> {
    pub data: T,
    #[serde(default)]
    pub included: Vec<MediaResource>,
    #[serde(default)]
    pub links: Option<Links>,
    #[serde(default)]
    pub meta: Option<Meta>,
}

#[derive(Debug, Deserialize)]
pub struct Links {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Meta {
    pub count: Option<usize>,
}

#[derive(Debug, Deserialize)]
pub struct ResourceId {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RelationshipData {
    One(ResourceId),
    Many(Vec<ResourceId>),
}

#[derive(Debug, Deserialize)]
pub struct Relationship {
    #[serde(default)]
    pub data: Option<RelationshipData>,
}

#[derive(Debug, Deserialize)]
pub struct EntryAttributes {
    pub status: Option<String>,
    pub progress: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct LibraryEntryResource {
    pub id: String,
    pub attributes: EntryAttributes,
    #[serde(default)]
    pub relationships: BTreeMap<String, Relationship>,
}

impl LibraryEntryResource {
    /// Id of the anime or manga this entry tracks
    pub fn media_id(&self, kind: MediaKind) -> Option<&str> {
        match self.relationships.get(kind.kitsu_type())?.data.as_ref()? {
            RelationshipData::One(r) => Some(r.id.as_str()),
            RelationshipData::Many(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PosterImage {
    pub large: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaAttributes {
    pub canonical_title: Option<String>,
    /// Insertion-ordered, so aliases follow the document's key order
    #[serde(default)]
    pub titles: Option<serde_json::Map<String, serde_json::Value>>,
    pub abbreviated_titles: Option<Vec<String>>,
    pub synonyms: Option<Vec<String>>,
    pub slug: Option<String>,
    pub subtype: Option<String>,
    pub poster_image: Option<PosterImage>,
}

#[derive(Debug, Deserialize)]
pub struct MediaResource {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub attributes: MediaAttributes,
}

impl MediaResource {
    /// Canonical title, localized titles as listed, abbreviations, then synonyms
    pub fn aliases(&self) -> Vec<String> {
        let attr = &self.attributes;
        let mut titles = Vec::new();
        titles.extend(attr.canonical_title.clone());
        if let Some(localized) = &attr.titles {
            titles.extend(localized.values().filter_map(|v| v.as_str()).map(str::to_string));
        }
        if let Some(abbreviated) = &attr.abbreviated_titles {
            titles.extend(abbreviated.iter().cloned());
        }
        if let Some(synonyms) = &attr.synonyms {
            titles.extend(synonyms.iter().cloned());
        }
        library_audit_models::entry::ordered_aliases(titles)
    }

    pub fn url(&self, kind: MediaKind) -> String {
        let slug = self.attributes.slug.as_deref().unwrap_or(self.id.as_str());
        format!("https://kitsu.io/{}/{}", kind.kitsu_type(), slug)
    }

    pub fn poster(&self) -> Option<String> {
        self.attributes.poster_image.as_ref().and_then(|p| p.large.clone())
    }

    pub fn is_novel(&self) -> bool {
        self.attributes
            .subtype
            .as_deref()
            .map(|s| s.eq_ignore_ascii_case("novel"))
            .unwrap_or(false)
    }

    pub fn to_catalog_item(&self, kind: MediaKind) -> CatalogItem {
        CatalogItem {
            media_id: self.id.clone(),
            title: self.attributes.canonical_title.clone(),
            url: self.url(kind),
            image: self.poster(),
        }
    }
}

fn authorized(request: RequestBuilder, access_token: &str) -> RequestBuilder {
    request
        .header("Authorization", format!("Bearer {}", access_token))
        .header("Accept", "application/vnd.api+json")
        .header("Content-Type", "application/vnd.api+json")
}

async fn send_json<T: DeserializeOwned>(request: RequestBuilder, context: &str) -> Result<T, SourceError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let error_text = response.text().await.unwrap_or_default();
        return Err(SourceError::from_status(status, context, &error_text));
    }
    Ok(response.json().await?)
}

/// Id of the user owning `access_token`
pub async fn get_self_user_id(client: &Client, api_root: &str, access_token: &str) -> Result<String, SourceError> {
    let request = authorized(client.get(format!("{}/edge/users", api_root)), access_token)
        .query(&[("filter[self]", "true")]);
    let doc: Document<Vec<ResourceId>> = send_json(request, "Kitsu user lookup").await?;
    doc.data
        .into_iter()
        .next()
        .map(|u| u.id)
        .ok_or_else(|| SourceError::Auth("Kitsu returned no user for this token".to_string()))
}

/// First page of a user's library; follow `links.next` for the rest
pub async fn get_first_library_page(
    client: &Client,
    api_root: &str,
    access_token: &str,
    user_id: &str,
    kind: MediaKind,
) -> Result<Document<Vec<LibraryEntryResource>>, SourceError> {
    let url = format!("{}/edge/users/{}/library-entries", api_root, user_id);
    let limit = PAGE_LIMIT.to_string();
    let request = authorized(client.get(url), access_token).query(&[
        ("filter[kind]", kind.kitsu_type()),
        ("filter[status]", LIBRARY_STATUSES),
        ("include", kind.kitsu_type()),
        ("page[limit]", limit.as_str()),
    ]);
    send_json(request, "Kitsu library page").await
}

/// Follow a `links.next` URL, which already carries its query
pub async fn get_library_page(
    client: &Client,
    next_url: &str,
    access_token: &str,
) -> Result<Document<Vec<LibraryEntryResource>>, SourceError> {
    send_json(authorized(client.get(next_url), access_token), "Kitsu library page").await
}

/// Single media record, used when `included` is missing one
pub async fn get_media(
    client: &Client,
    api_root: &str,
    access_token: &str,
    kind: MediaKind,
    media_id: &str,
) -> Result<MediaResource, SourceError> {
    let url = format!("{}/edge/{}/{}", api_root, kind.kitsu_type(), media_id);
    let doc: Document<MediaResource> = send_json(authorized(client.get(url), access_token), "Kitsu media lookup").await?;
    Ok(doc.data)
}

/// Text search over the catalog
pub async fn search_media(
    client: &Client,
    api_root: &str,
    access_token: &str,
    title: &str,
    kind: MediaKind,
) -> Result<Vec<MediaResource>, SourceError> {
    let url = format!("{}/edge/{}", api_root, kind.kitsu_type());
    let limit = SEARCH_LIMIT.to_string();
    let request = authorized(client.get(url), access_token)
        .query(&[("filter[text]", title), ("page[limit]", limit.as_str())]);
    let doc: Document<Vec<MediaResource>> = send_json(request, "Kitsu search").await?;
    Ok(doc.data)
}
