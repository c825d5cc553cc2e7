use library_audit_models::CanonicalStatus;

/// Map an AniList `MediaListStatus` onto the canonical vocabulary
///
/// REPEATING is an active re-read/re-watch, so it counts as CURRENT.
pub fn from_anilist(status: Option<&str>) -> CanonicalStatus {
    let mapped = status.and_then(|s| match s.trim().to_uppercase().as_str() {
        "CURRENT" | "REPEATING" => Some(CanonicalStatus::Current),
        "COMPLETED" => Some(CanonicalStatus::Completed),
        "PAUSED" => Some(CanonicalStatus::Paused),
        "DROPPED" => Some(CanonicalStatus::Dropped),
        "PLANNING" => Some(CanonicalStatus::Planning),
        _ => None,
    });
    CanonicalStatus::or_planning(mapped)
}

/// Map a Kitsu library-entry status onto the canonical vocabulary
pub fn from_kitsu(status: Option<&str>) -> CanonicalStatus {
    let mapped = status.and_then(|s| match s.trim() {
        "current" => Some(CanonicalStatus::Current),
        "completed" => Some(CanonicalStatus::Completed),
        "onHold" | "on_hold" => Some(CanonicalStatus::Paused),
        "dropped" => Some(CanonicalStatus::Dropped),
        "planned" => Some(CanonicalStatus::Planning),
        _ => None,
    });
    CanonicalStatus::or_planning(mapped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_anilist() {
        assert_eq!(from_anilist(Some("REPEATING")), CanonicalStatus::Current);
        assert_eq!(from_anilist(Some("PAUSED")), CanonicalStatus::Paused);
        assert_eq!(from_anilist(Some("mystery")), CanonicalStatus::Planning);
        assert_eq!(from_anilist(None), CanonicalStatus::Planning);
    }

    #[test]
    fn test_from_kitsu() {
        assert_eq!(from_kitsu(Some("onHold")), CanonicalStatus::Paused);
        assert_eq!(from_kitsu(Some("on_hold")), CanonicalStatus::Paused);
        assert_eq!(from_kitsu(Some("planned")), CanonicalStatus::Planning);
        assert_eq!(from_kitsu(Some("completed")), CanonicalStatus::Completed);
        assert_eq!(from_kitsu(None), CanonicalStatus::Planning);
    }
}
