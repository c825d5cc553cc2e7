use super::*;
use crate::progress::{CollectingSink, NullSink, ProgressEvent};
use library_audit_models::CanonicalStatus;

fn entry(id: &str, titles: &[&str]) -> LibraryEntry {
    LibraryEntry::new(
        id,
        titles.iter().map(|t| t.to_string()),
        CanonicalStatus::Current,
        10,
        format!("https://example.test/{}", id),
    )
}

fn ids(outcome: &MatchOutcome<'_>) -> Vec<(String, String)> {
    outcome
        .pairs
        .iter()
        .map(|p| (p.anilist.media_id.clone(), p.kitsu.media_id.clone()))
        .collect()
}

#[test]
fn test_forward_pass_matches_on_shared_alias() {
    let anilist = vec![entry("a1", &["Attack on Titan", "進撃の巨人"])];
    let kitsu = vec![entry("k1", &["Attack on Titan"])];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(ids(&outcome), vec![("a1".to_string(), "k1".to_string())]);
    assert!(outcome.state.unmatched_anilist(&anilist).is_empty());
    assert!(outcome.state.unmatched_kitsu(&kitsu).is_empty());
}

#[test]
fn test_forward_pass_uses_first_alias_that_hits() {
    let anilist = vec![
        entry("a1", &["Berserk"]),
        entry("a2", &["Berserk of Gluttony"]),
    ];
    // first alias hits a2 even though a later alias would hit a1
    let kitsu = vec![entry("k1", &["Berserk of Gluttony", "Berserk"])];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(ids(&outcome), vec![("a2".to_string(), "k1".to_string())]);
    let unmatched: Vec<_> = outcome.state.unmatched_anilist(&anilist).iter().map(|e| e.media_id.as_str()).collect();
    assert_eq!(unmatched, vec!["a1"]);
}

#[test]
fn test_first_claim_wins() {
    let anilist = vec![entry("a1", &["Vagabond"])];
    let kitsu = vec![entry("k1", &["Vagabond"]), entry("k2", &["VAGABOND!"])];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(ids(&outcome), vec![("a1".to_string(), "k1".to_string())]);
    let unmatched: Vec<_> = outcome.state.unmatched_kitsu(&kitsu).iter().map(|e| e.media_id.as_str()).collect();
    assert_eq!(unmatched, vec!["k2"]);
}

#[test]
fn test_later_alias_hits_when_earlier_ones_miss() {
    let anilist = vec![entry("a1", &["Dorohedoro"])];
    let kitsu = vec![entry("k1", &["Unrelated"]), entry("k2", &["Something", "Dorohedoro"])];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(ids(&outcome), vec![("a1".to_string(), "k2".to_string())]);
}

#[test]
fn test_reverse_pass_catches_secondary_synonym() {
    // k2's first alias lands on the already claimed a0, so the forward pass
    // gives up on it; its second alias is a1's only title
    let anilist = vec![entry("a0", &["Gintama"]), entry("a1", &["Gin Tama Remake"])];
    let kitsu = vec![
        entry("k1", &["Gintama"]),
        entry("k2", &["Gintama", "Gin Tama Remake"]),
    ];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(
        ids(&outcome),
        vec![("a0".to_string(), "k1".to_string()), ("a1".to_string(), "k2".to_string())]
    );
}

#[test]
fn test_reverse_pass_picks_first_unmatched_kitsu_entry() {
    let anilist = vec![entry("a0", &["Dorohedoro"]), entry("a1", &["Dorohedoro Omake"])];
    let kitsu = vec![
        entry("k0", &["Dorohedoro"]),
        entry("k1", &["Dorohedoro", "Dorohedoro Omake"]),
        entry("k2", &["Dorohedoro", "Dorohedoro: Omake"]),
    ];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert_eq!(
        ids(&outcome),
        vec![("a0".to_string(), "k0".to_string()), ("a1".to_string(), "k1".to_string())]
    );
    let unmatched: Vec<_> = outcome.state.unmatched_kitsu(&kitsu).iter().map(|e| e.media_id.as_str()).collect();
    assert_eq!(unmatched, vec!["k2"]);
}

#[test]
fn test_no_overlap_leaves_everything_unmatched() {
    let anilist = vec![entry("a1", &["Blame!"])];
    let kitsu = vec![entry("k1", &["Biomega"])];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    assert!(outcome.pairs.is_empty());
    assert_eq!(outcome.state.unmatched_anilist(&anilist).len(), 1);
    assert_eq!(outcome.state.unmatched_kitsu(&kitsu).len(), 1);
}

#[test]
fn test_ids_appear_in_at_most_one_pair() {
    let anilist = vec![
        entry("a1", &["One", "Uno"]),
        entry("a2", &["Two", "Uno"]),
        entry("a3", &["Three", "Dos"]),
    ];
    let kitsu = vec![
        entry("k1", &["Uno"]),
        entry("k2", &["Uno", "Two"]),
        entry("k3", &["Dos", "One"]),
        entry("k4", &["Three"]),
    ];

    let outcome = match_libraries(&anilist, &kitsu, &mut NullSink);

    let mut seen_a = HashSet::new();
    let mut seen_k = HashSet::new();
    for pair in &outcome.pairs {
        assert!(seen_a.insert(pair.anilist.media_id.clone()));
        assert!(seen_k.insert(pair.kitsu.media_id.clone()));
    }
    assert_eq!(outcome.pairs.len(), 3);
}

#[test]
fn test_matching_is_idempotent() {
    let anilist = vec![
        entry("a1", &["Akira"]),
        entry("a2", &["Pluto", "Pluto: Urasawa x Tezuka"]),
        entry("a3", &["Solanin"]),
    ];
    let kitsu = vec![
        entry("k1", &["Pluto Urasawa x Tezuka"]),
        entry("k2", &["AKIRA"]),
        entry("k3", &["Goodnight Punpun"]),
    ];

    let first = ids(&match_libraries(&anilist, &kitsu, &mut NullSink));
    let second = ids(&match_libraries(&anilist, &kitsu, &mut NullSink));
    assert_eq!(first, second);
    assert_eq!(first.len(), 2);
}

#[test]
fn test_progress_once_per_entry_checked() {
    let anilist = vec![entry("a1", &["Akira"]), entry("a2", &["Solanin"])];
    let kitsu = vec![entry("k1", &["Akira"]), entry("k2", &["Punpun"]), entry("k3", &["Nijigahara"])];

    let mut sink = CollectingSink::new();
    match_libraries(&anilist, &kitsu, &mut sink);

    let progress: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            ProgressEvent::Progress { current, total, .. } => Some((*current, *total)),
            _ => None,
        })
        .collect();
    // three forward checks, then one reverse check for the unmatched a2
    assert_eq!(progress, vec![(1, 3), (2, 3), (3, 3), (2, 2)]);
    assert_eq!(sink.progress_messages()[0], "Checking (1/2): Akira");
}
