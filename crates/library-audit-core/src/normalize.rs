//! Title keys used for matching, catalog search and report dedup.
//!
//! `match_key` keeps non-Latin scripts so native titles still meet each other;
//! `dedupe_key` folds to ASCII so accented and plain spellings collapse.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

/// Punctuation removed before matching: `~ : ; , - – — . … · ! ? " ' ( ) [ ] { } / \ &`
static MATCH_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[~:;,\-–—.…·!?"'()\[\]{}/\\&]"#).unwrap());

/// Same class without `&`, which the catalog search engines understand
static SEARCH_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"[~:;,\-–—.…·!?"'()\[\]{}/\\]"#).unwrap());

static NON_ALPHANUMERIC: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9A-Za-z\s]").unwrap());

static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

fn collapse(s: &str) -> String {
    WHITESPACE.replace_all(s, " ").trim().to_string()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Key two aliases share iff they name the same title for matching purposes
pub fn match_key(raw: &str) -> Option<String> {
    let cleaned = MATCH_PUNCTUATION.replace_all(raw, " ");
    non_empty(collapse(&cleaned).to_lowercase())
}

/// Alias text sent to a catalog search: punctuation stripped, case and script kept
pub fn search_query(raw: &str) -> Option<String> {
    let cleaned = SEARCH_PUNCTUATION.replace_all(raw, " ");
    non_empty(collapse(&cleaned))
}

/// Strict key for the final report merge: NFKD, ASCII letters and digits only
pub fn dedupe_key(raw: &str) -> Option<String> {
    let ascii: String = raw.nfkd().filter(|c| c.is_ascii()).collect();
    let cleaned = NON_ALPHANUMERIC.replace_all(&ascii, " ");
    non_empty(collapse(&cleaned).to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_key_strips_punctuation() {
        assert_eq!(match_key("Attack on Titan: Final Season").as_deref(), Some("attack on titan final season"));
        assert_eq!(match_key("Kaguya-sama: Love Is War!").as_deref(), Some("kaguya sama love is war"));
        assert_eq!(match_key("Yotsuba&!").as_deref(), Some("yotsuba"));
        assert_eq!(match_key("  Dr.  STONE  ").as_deref(), Some("dr stone"));
        assert_eq!(match_key("Re:Zero ~Starting Life~").as_deref(), Some("re zero starting life"));
        assert_eq!(match_key("Oshi no Ko…").as_deref(), Some("oshi no ko"));
    }

    #[test]
    fn test_match_key_keeps_native_scripts() {
        assert_eq!(match_key("進撃の巨人").as_deref(), Some("進撃の巨人"));
        assert_eq!(match_key("Pokémon").as_deref(), Some("pokémon"));
    }

    #[test]
    fn test_match_key_absent_when_empty() {
        assert_eq!(match_key(""), None);
        assert_eq!(match_key("   "), None);
        assert_eq!(match_key("?!…"), None);
    }

    #[test]
    fn test_match_key_is_idempotent() {
        for raw in ["Fullmetal Alchemist: Brotherhood", "ONE PIECE", "Spy×Family", "Dandadan (2024)"] {
            let once = match_key(raw).unwrap();
            assert_eq!(match_key(&once).as_deref(), Some(once.as_str()));
        }
    }

    #[test]
    fn test_search_query_preserves_case_and_ampersand() {
        assert_eq!(search_query("Yotsuba&!").as_deref(), Some("Yotsuba&"));
        assert_eq!(search_query("Steins;Gate").as_deref(), Some("Steins Gate"));
        assert_eq!(search_query("..."), None);
    }

    #[test]
    fn test_dedupe_key_folds_accents() {
        assert_eq!(dedupe_key("Pokémon Adventures").as_deref(), Some("pokemon adventures"));
        assert_eq!(dedupe_key("Pokemon   Adventures!").as_deref(), Some("pokemon adventures"));
        assert_eq!(dedupe_key("ＡＢＣ"), Some("abc".to_string()));
        assert_eq!(dedupe_key("進撃の巨人"), None);
        assert_eq!(dedupe_key("Attack on Titan: 進撃"), Some("attack on titan".to_string()));
    }
}
