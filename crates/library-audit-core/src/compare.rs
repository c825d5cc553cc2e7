use library_audit_models::{CanonicalStatus, EntrySnapshot, LibraryEntry, ReportBucket, ReportItem};

/// Bucket for a matched pair; a progress difference outranks a status difference
pub fn classify(
    anilist_status: CanonicalStatus,
    anilist_progress: u32,
    kitsu_status: CanonicalStatus,
    kitsu_progress: u32,
) -> ReportBucket {
    if anilist_progress != kitsu_progress {
        if anilist_progress > kitsu_progress {
            ReportBucket::AnilistHigher
        } else {
            ReportBucket::KitsuHigher
        }
    } else if anilist_status != kitsu_status {
        ReportBucket::MismatchStatus
    } else {
        ReportBucket::Ok
    }
}

pub fn compare(anilist: &LibraryEntry, kitsu: &LibraryEntry) -> (ReportBucket, ReportItem) {
    let bucket = classify(anilist.status, anilist.progress, kitsu.status, kitsu.progress);
    let item = ReportItem {
        anilist: Some(EntrySnapshot::from_entry(anilist)),
        kitsu: Some(EntrySnapshot::from_entry(kitsu)),
    };
    (bucket, item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use CanonicalStatus::*;

    fn entry(id: &str, status: CanonicalStatus, progress: u32) -> LibraryEntry {
        LibraryEntry::new(id, vec!["Attack on Titan".to_string()], status, progress, "https://example.test")
    }

    #[test]
    fn test_classify_table() {
        assert_eq!(classify(Current, 10, Current, 10), ReportBucket::Ok);
        assert_eq!(classify(Current, 10, Current, 5), ReportBucket::AnilistHigher);
        assert_eq!(classify(Current, 5, Current, 10), ReportBucket::KitsuHigher);
        assert_eq!(classify(Completed, 10, Current, 10), ReportBucket::MismatchStatus);
        // progress wins over status
        assert_eq!(classify(Completed, 139, Paused, 120), ReportBucket::AnilistHigher);
        assert_eq!(classify(Planning, 0, Dropped, 3), ReportBucket::KitsuHigher);
    }

    #[test]
    fn test_compare_carries_both_sides() {
        let (bucket, item) = compare(&entry("a1", Current, 10), &entry("k1", Current, 5));
        assert_eq!(bucket, ReportBucket::AnilistHigher);
        assert_eq!(item.anilist_media_id(), Some("a1"));
        assert_eq!(item.kitsu_media_id(), Some("k1"));
        assert_eq!(item.kitsu.unwrap().progress, Some(5));
    }
}
