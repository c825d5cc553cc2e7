use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use crate::entry::{CatalogItem, LibraryEntry};
use crate::media::MediaKind;
use crate::status::CanonicalStatus;

/// Display projection of one side of a report row
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct EntrySnapshot {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub media_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CanonicalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub progress: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library_record_id: Option<String>,
}

impl EntrySnapshot {
    pub fn from_entry(entry: &LibraryEntry) -> Self {
        Self {
            media_id: Some(entry.media_id.clone()),
            title: Some(entry.display_title().to_string()).filter(|t| !t.is_empty()),
            url: Some(entry.url.clone()),
            image: entry.image.clone(),
            status: Some(entry.status),
            progress: Some(entry.progress),
            library_record_id: entry.library_record_id.clone(),
        }
    }

    /// Catalog hits carry no status or progress: the user does not track them
    pub fn from_catalog(item: &CatalogItem) -> Self {
        Self {
            media_id: Some(item.media_id.clone()),
            title: item.title.clone(),
            url: Some(item.url.clone()),
            image: item.image.clone(),
            status: None,
            progress: None,
            library_record_id: None,
        }
    }
}

/// One report row. Matched pairs fill both sides; one-sided rows fill only the tracked side.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportItem {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anilist: Option<EntrySnapshot>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub kitsu: Option<EntrySnapshot>,
}

impl ReportItem {
    pub fn anilist_title(&self) -> Option<&str> {
        self.anilist.as_ref().and_then(|s| s.title.as_deref())
    }

    pub fn kitsu_title(&self) -> Option<&str> {
        self.kitsu.as_ref().and_then(|s| s.title.as_deref())
    }

    pub fn anilist_media_id(&self) -> Option<&str> {
        self.anilist.as_ref().and_then(|s| s.media_id.as_deref())
    }

    pub fn kitsu_media_id(&self) -> Option<&str> {
        self.kitsu.as_ref().and_then(|s| s.media_id.as_deref())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ReportBucket {
    Ok,
    MismatchStatus,
    AnilistHigher,
    KitsuHigher,
    FoundOnAnilist,
    NotFoundOnAnilist,
    FoundOnKitsu,
    NotFoundOnKitsu,
}

impl ReportBucket {
    pub const ALL: [ReportBucket; 8] = [
        ReportBucket::Ok,
        ReportBucket::MismatchStatus,
        ReportBucket::AnilistHigher,
        ReportBucket::KitsuHigher,
        ReportBucket::FoundOnAnilist,
        ReportBucket::NotFoundOnAnilist,
        ReportBucket::FoundOnKitsu,
        ReportBucket::NotFoundOnKitsu,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ReportBucket::Ok => "ok",
            ReportBucket::MismatchStatus => "mismatch_status",
            ReportBucket::AnilistHigher => "anilist_higher",
            ReportBucket::KitsuHigher => "kitsu_higher",
            ReportBucket::FoundOnAnilist => "found_on_anilist",
            ReportBucket::NotFoundOnAnilist => "not_found_on_anilist",
            ReportBucket::FoundOnKitsu => "found_on_kitsu",
            ReportBucket::NotFoundOnKitsu => "not_found_on_kitsu",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        Self::ALL.into_iter().find(|b| b.as_str() == wanted)
    }
}

/// A catalog hit that turned out to already be in the user's own library on the target service
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuppressedMatch {
    /// Service searched
    pub target: crate::media::Service,
    pub source_title: String,
    pub target_media_id: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct ReportSummary {
    pub anilist_total: usize,
    pub kitsu_total: usize,
    pub ok: usize,
    pub mismatch_status: usize,
    pub anilist_higher: usize,
    pub kitsu_higher: usize,
    pub found_on_anilist: usize,
    pub not_found_on_anilist: usize,
    pub found_on_kitsu: usize,
    pub not_found_on_kitsu: usize,
    pub suppressed: usize,
}

impl ReportSummary {
    pub fn count(&self, bucket: ReportBucket) -> usize {
        match bucket {
            ReportBucket::Ok => self.ok,
            ReportBucket::MismatchStatus => self.mismatch_status,
            ReportBucket::AnilistHigher => self.anilist_higher,
            ReportBucket::KitsuHigher => self.kitsu_higher,
            ReportBucket::FoundOnAnilist => self.found_on_anilist,
            ReportBucket::NotFoundOnAnilist => self.not_found_on_anilist,
            ReportBucket::FoundOnKitsu => self.found_on_kitsu,
            ReportBucket::NotFoundOnKitsu => self.not_found_on_kitsu,
        }
    }
}

/// Result of one reconciliation run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Report {
    pub media_kind: MediaKind,
    pub generated_at: DateTime<Utc>,
    pub ok: Vec<ReportItem>,
    pub mismatch_status: Vec<ReportItem>,
    pub anilist_higher: Vec<ReportItem>,
    pub kitsu_higher: Vec<ReportItem>,
    pub found_on_anilist: Vec<ReportItem>,
    pub not_found_on_anilist: Vec<ReportItem>,
    pub found_on_kitsu: Vec<ReportItem>,
    pub not_found_on_kitsu: Vec<ReportItem>,
    #[serde(default)]
    pub suppressed: Vec<SuppressedMatch>,
    pub summary: ReportSummary,
}

impl Report {
    pub fn new(media_kind: MediaKind) -> Self {
        Self {
            media_kind,
            generated_at: Utc::now(),
            ok: Vec::new(),
            mismatch_status: Vec::new(),
            anilist_higher: Vec::new(),
            kitsu_higher: Vec::new(),
            found_on_anilist: Vec::new(),
            not_found_on_anilist: Vec::new(),
            found_on_kitsu: Vec::new(),
            not_found_on_kitsu: Vec::new(),
            suppressed: Vec::new(),
            summary: ReportSummary::default(),
        }
    }

    pub fn bucket(&self, bucket: ReportBucket) -> &[ReportItem] {
        match bucket {
            ReportBucket::Ok => &self.ok,
            ReportBucket::MismatchStatus => &self.mismatch_status,
            ReportBucket::AnilistHigher => &self.anilist_higher,
            ReportBucket::KitsuHigher => &self.kitsu_higher,
            ReportBucket::FoundOnAnilist => &self.found_on_anilist,
            ReportBucket::NotFoundOnAnilist => &self.not_found_on_anilist,
            ReportBucket::FoundOnKitsu => &self.found_on_kitsu,
            ReportBucket::NotFoundOnKitsu => &self.not_found_on_kitsu,
        }
    }

    pub fn bucket_mut(&mut self, bucket: ReportBucket) -> &mut Vec<ReportItem> {
        match bucket {
            ReportBucket::Ok => &mut self.ok,
            ReportBucket::MismatchStatus => &mut self.mismatch_status,
            ReportBucket::AnilistHigher => &mut self.anilist_higher,
            ReportBucket::KitsuHigher => &mut self.kitsu_higher,
            ReportBucket::FoundOnAnilist => &mut self.found_on_anilist,
            ReportBucket::NotFoundOnAnilist => &mut self.not_found_on_anilist,
            ReportBucket::FoundOnKitsu => &mut self.found_on_kitsu,
            ReportBucket::NotFoundOnKitsu => &mut self.not_found_on_kitsu,
        }
    }

    pub fn push(&mut self, bucket: ReportBucket, item: ReportItem) {
        self.bucket_mut(bucket).push(item);
    }

    /// Recompute the summary counts from the current bucket contents
    pub fn summarize(&mut self, anilist_total: usize, kitsu_total: usize) {
        self.summary = ReportSummary {
            anilist_total,
            kitsu_total,
            ok: self.ok.len(),
            mismatch_status: self.mismatch_status.len(),
            anilist_higher: self.anilist_higher.len(),
            kitsu_higher: self.kitsu_higher.len(),
            found_on_anilist: self.found_on_anilist.len(),
            not_found_on_anilist: self.not_found_on_anilist.len(),
            found_on_kitsu: self.found_on_kitsu.len(),
            not_found_on_kitsu: self.not_found_on_kitsu.len(),
            suppressed: self.suppressed.len(),
        };
    }
}
