// Two-pass title matching between the AniList and Kitsu libraries

use crate::index::{entry_keys, LibraryIndex};
use crate::progress::ProgressSink;
use library_audit_models::LibraryEntry;
use std::collections::HashSet;
use tracing::debug;

/// Media ids already paired or otherwise resolved during one run
#[derive(Debug, Default, Clone)]
pub struct MatchState {
    anilist: HashSet<String>,
    kitsu: HashSet<String>,
}

impl MatchState {
    pub fn is_anilist_matched(&self, media_id: &str) -> bool {
        self.anilist.contains(media_id)
    }

    pub fn is_kitsu_matched(&self, media_id: &str) -> bool {
        self.kitsu.contains(media_id)
    }

    /// Returns false if the id was already marked
    pub fn mark_anilist(&mut self, media_id: &str) -> bool {
        self.anilist.insert(media_id.to_string())
    }

    pub fn mark_kitsu(&mut self, media_id: &str) -> bool {
        self.kitsu.insert(media_id.to_string())
    }

    pub fn unmatched_anilist<'a>(&self, entries: &'a [LibraryEntry]) -> Vec<&'a LibraryEntry> {
        entries.iter().filter(|e| !self.is_anilist_matched(&e.media_id)).collect()
    }

    pub fn unmatched_kitsu<'a>(&self, entries: &'a [LibraryEntry]) -> Vec<&'a LibraryEntry> {
        entries.iter().filter(|e| !self.is_kitsu_matched(&e.media_id)).collect()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct MatchedPair<'a> {
    pub anilist: &'a LibraryEntry,
    pub kitsu: &'a LibraryEntry,
}

/// Pairs in the order they were found, plus the ids they consumed
#[derive(Debug)]
pub struct MatchOutcome<'a> {
    pub pairs: Vec<MatchedPair<'a>>,
    pub state: MatchState,
}

/// Pair entries across the two libraries
///
/// Pass 1 walks Kitsu entries in order and takes the first alias whose key
/// names an AniList entry; an AniList id already claimed is not claimed again.
/// Pass 2 walks the AniList entries still unmatched and pairs each with the
/// first unmatched Kitsu entry sharing any normalized alias.
pub fn match_libraries<'a>(
    anilist: &'a [LibraryEntry],
    kitsu: &'a [LibraryEntry],
    sink: &mut dyn ProgressSink,
) -> MatchOutcome<'a> {
    let index = LibraryIndex::build(anilist);
    let mut state = MatchState::default();
    let mut pairs = Vec::new();

    sink.log("--- Comparing libraries (pass 1: Kitsu -> AniList) ---".to_string());
    sink.log(format!("Found {} Kitsu entries to check.", kitsu.len()));

    for (i, kitsu_entry) in kitsu.iter().enumerate() {
        sink.progress(
            format!("Checking (1/2): {}", kitsu_entry.display_title()),
            i + 1,
            kitsu.len(),
        );

        let Some(position) = entry_keys(kitsu_entry).find_map(|key| index.lookup(&key)) else {
            continue;
        };
        let anilist_entry = &anilist[position];

        if state.is_anilist_matched(&anilist_entry.media_id) || state.is_kitsu_matched(&kitsu_entry.media_id) {
            debug!(
                "AniList {} already claimed, skipping Kitsu {}",
                anilist_entry.media_id, kitsu_entry.media_id
            );
            continue;
        }

        state.mark_anilist(&anilist_entry.media_id);
        state.mark_kitsu(&kitsu_entry.media_id);
        pairs.push(MatchedPair { anilist: anilist_entry, kitsu: kitsu_entry });
    }

    sink.log("--- Comparing libraries (pass 2: AniList -> Kitsu) ---".to_string());

    let kitsu_keys: Vec<HashSet<String>> = kitsu.iter().map(|e| entry_keys(e).collect()).collect();

    for (i, anilist_entry) in anilist.iter().enumerate() {
        if state.is_anilist_matched(&anilist_entry.media_id) {
            continue;
        }
        sink.progress(
            format!("Checking (2/2): unmatched AniList item {}", anilist_entry.media_id),
            i + 1,
            anilist.len(),
        );

        let Some(anilist_keys) = index.titles_for(&anilist_entry.media_id) else {
            continue;
        };

        let hit = kitsu.iter().zip(&kitsu_keys).find(|(kitsu_entry, keys)| {
            !state.is_kitsu_matched(&kitsu_entry.media_id) && !keys.is_disjoint(anilist_keys)
        });

        if let Some((kitsu_entry, keys)) = hit {
            if let Some(shared) = keys.intersection(anilist_keys).next() {
                sink.log(format!("  -> Found reverse match for AniList item: {}", shared));
            }
            state.mark_anilist(&anilist_entry.media_id);
            state.mark_kitsu(&kitsu_entry.media_id);
            pairs.push(MatchedPair { anilist: anilist_entry, kitsu: kitsu_entry });
        }
    }

    debug!("Matched {} pairs", pairs.len());
    MatchOutcome { pairs, state }
}

#[cfg(test)]
mod tests;
