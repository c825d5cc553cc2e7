use serde::{Deserialize, Serialize};
use crate::status::CanonicalStatus;

/// Service-neutral shape of one tracked item in a user's library
///
/// `titles` is the alias title set in the order the service declared it:
/// the canonical title first, then translations and synonyms. The order is
/// significant during matching ("first alias that hits wins").
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LibraryEntry {
    /// Service-scoped media identifier
    pub media_id: String,
    pub titles: Vec<String>,
    pub status: CanonicalStatus,
    /// Units consumed (episodes or chapters)
    pub progress: u32,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Identifier of the user's tracking record; only set for library entries
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_record_id: Option<String>,
}

impl LibraryEntry {
    pub fn new(
        media_id: impl Into<String>,
        titles: impl IntoIterator<Item = String>,
        status: CanonicalStatus,
        progress: u32,
        url: impl Into<String>,
    ) -> Self {
        Self {
            media_id: media_id.into(),
            titles: ordered_aliases(titles),
            status,
            progress,
            url: url.into(),
            image: None,
            library_record_id: None,
        }
    }

    pub fn with_image(mut self, image: Option<String>) -> Self {
        self.image = image;
        self
    }

    pub fn with_library_record_id(mut self, id: Option<String>) -> Self {
        self.library_record_id = id;
        self
    }

    /// Title shown in reports: the first declared alias
    pub fn display_title(&self) -> &str {
        self.titles.first().map(|s| s.as_str()).unwrap_or("")
    }
}

/// A single best-match hit from a service's public catalog
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CatalogItem {
    pub media_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

/// Trim, drop blanks and drop repeats while keeping first-seen order
pub fn ordered_aliases(titles: impl IntoIterator<Item = String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for title in titles {
        let trimmed = title.trim();
        if trimmed.is_empty() || out.iter().any(|t| t == trimmed) {
            continue;
        }
        out.push(trimmed.to_string());
    }
    out
}
