use crate::normalize::match_key;
use library_audit_models::LibraryEntry;
use std::collections::{HashMap, HashSet};
use tracing::debug;

/// Lookup structures over one service's library
///
/// Entries are referred to by their position in the input slice.
pub struct LibraryIndex<'a> {
    by_title: HashMap<String, usize>,
    titles_by_id: HashMap<&'a str, HashSet<String>>,
}

impl<'a> LibraryIndex<'a> {
    pub fn build(entries: &'a [LibraryEntry]) -> Self {
        let mut by_title = HashMap::new();
        let mut titles_by_id: HashMap<&'a str, HashSet<String>> = HashMap::new();
        let mut shadowed = 0;

        for (position, entry) in entries.iter().enumerate() {
            let keys = titles_by_id.entry(entry.media_id.as_str()).or_default();
            for title in &entry.titles {
                let Some(key) = match_key(title) else {
                    continue;
                };
                keys.insert(key.clone());
                // first entry to claim a title keeps it
                match by_title.get(&key) {
                    Some(&owner) if owner != position => shadowed += 1,
                    Some(_) => {}
                    None => {
                        by_title.insert(key, position);
                    }
                }
            }
        }

        if shadowed > 0 {
            debug!("{} titles shared by more than one library entry; kept the first", shadowed);
        }

        Self {
            by_title,
            titles_by_id,
        }
    }

    /// Position of the representative entry for a normalized title
    pub fn lookup(&self, key: &str) -> Option<usize> {
        self.by_title.get(key).copied()
    }

    /// Every normalized title a media id is known under
    pub fn titles_for(&self, media_id: &str) -> Option<&HashSet<String>> {
        self.titles_by_id.get(media_id)
    }
}

/// Normalized keys for one entry's aliases, in alias order
pub fn entry_keys(entry: &LibraryEntry) -> impl Iterator<Item = String> + '_ {
    entry.titles.iter().filter_map(|t| match_key(t))
}
