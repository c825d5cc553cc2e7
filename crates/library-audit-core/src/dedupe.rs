use crate::normalize::dedupe_key;
use library_audit_models::{Report, ReportItem};
use std::collections::HashSet;
use tracing::debug;

type TitlePair = (Option<String>, Option<String>);

#[derive(Default)]
struct Seen {
    anilist_ids: HashSet<String>,
    kitsu_ids: HashSet<String>,
    pairs: HashSet<TitlePair>,
}

/// (Kitsu title, AniList title) under the strict key
fn title_pair(item: &ReportItem) -> TitlePair {
    (
        item.kitsu_title().and_then(dedupe_key),
        item.anilist_title().and_then(dedupe_key),
    )
}

impl Seen {
    /// Keep the item unless one of its ids or its title pair was already kept.
    ///
    /// A pair whose titles both fold to nothing (e.g. two all-kana titles) is
    /// never recorded or compared, so such items dedupe by id alone.
    fn admit(&mut self, item: &ReportItem) -> bool {
        let anilist_id = item.anilist_media_id();
        let kitsu_id = item.kitsu_media_id();
        let pair = title_pair(item);
        // a pair with no ASCII text on either side says nothing about identity
        let has_pair = pair.0.is_some() || pair.1.is_some();

        if anilist_id.is_some_and(|id| self.anilist_ids.contains(id))
            || kitsu_id.is_some_and(|id| self.kitsu_ids.contains(id))
            || (has_pair && self.pairs.contains(&pair))
        {
            return false;
        }

        if let Some(id) = anilist_id {
            self.anilist_ids.insert(id.to_string());
        }
        if let Some(id) = kitsu_id {
            self.kitsu_ids.insert(id.to_string());
        }
        if has_pair {
            self.pairs.insert(pair);
        }
        true
    }
}

fn is_resolved(title: Option<&str>, strict_keys: &HashSet<String>, raw_titles: &HashSet<String>) -> bool {
    let Some(title) = title else {
        return false;
    };
    raw_titles.contains(title) || dedupe_key(title).is_some_and(|key| strict_keys.contains(&key))
}

/// Merge the two found buckets and drop not-found rows that were resolved
///
/// `found_on_anilist` is walked before `found_on_kitsu`. Returns how many rows were removed.
pub fn dedupe_found(report: &mut Report) -> usize {
    let before = report.found_on_anilist.len()
        + report.found_on_kitsu.len()
        + report.not_found_on_anilist.len()
        + report.not_found_on_kitsu.len();

    let mut seen = Seen::default();
    let found_on_anilist = std::mem::take(&mut report.found_on_anilist);
    report.found_on_anilist = found_on_anilist.into_iter().filter(|item| seen.admit(item)).collect();
    let found_on_kitsu = std::mem::take(&mut report.found_on_kitsu);
    report.found_on_kitsu = found_on_kitsu.into_iter().filter(|item| seen.admit(item)).collect();

    let resolved_anilist_keys: HashSet<String> = seen.pairs.iter().filter_map(|(_, a)| a.clone()).collect();
    let resolved_kitsu_keys: HashSet<String> = seen.pairs.iter().filter_map(|(k, _)| k.clone()).collect();
    let found_anilist_titles: HashSet<String> = report
        .found_on_anilist
        .iter()
        .filter_map(|item| item.anilist_title().map(str::to_string))
        .collect();
    let found_kitsu_titles: HashSet<String> = report
        .found_on_kitsu
        .iter()
        .filter_map(|item| item.kitsu_title().map(str::to_string))
        .collect();

    report
        .not_found_on_kitsu
        .retain(|item| !is_resolved(item.anilist_title(), &resolved_anilist_keys, &found_anilist_titles));
    report
        .not_found_on_anilist
        .retain(|item| !is_resolved(item.kitsu_title(), &resolved_kitsu_keys, &found_kitsu_titles));

    let after = report.found_on_anilist.len()
        + report.found_on_kitsu.len()
        + report.not_found_on_anilist.len()
        + report.not_found_on_kitsu.len();
    let removed = before - after;
    if removed > 0 {
        debug!("Report dedup removed {} rows", removed);
    }
    removed
}
