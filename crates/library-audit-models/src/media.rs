use serde::{Deserialize, Serialize};
use std::fmt;

/// Content category being reconciled. Decides which catalog each service searches.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Anime,
    #[default]
    Manga,
}

impl MediaKind {
    /// Parse a user-supplied kind. Anything unrecognised falls back to manga.
    pub fn parse_lenient(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "anime" => MediaKind::Anime,
            _ => MediaKind::Manga,
        }
    }

    /// GraphQL `MediaType` value used by AniList
    pub fn anilist_type(&self) -> &'static str {
        match self {
            MediaKind::Anime => "ANIME",
            MediaKind::Manga => "MANGA",
        }
    }

    /// Resource type / path segment used by Kitsu
    pub fn kitsu_type(&self) -> &'static str {
        match self {
            MediaKind::Anime => "anime",
            MediaKind::Manga => "manga",
        }
    }
}

impl fmt::Display for MediaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaKind::Anime => write!(f, "Anime"),
            MediaKind::Manga => write!(f, "Manga"),
        }
    }
}

/// The two catalog services being reconciled
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    AniList,
    Kitsu,
}

impl Service {
    pub fn name(&self) -> &'static str {
        match self {
            Service::AniList => "AniList",
            Service::Kitsu => "Kitsu",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
