//! Deny-list quality gate for upstream records.
//!
//! Registries are full of scaffolding servers ("my first mcp", "test server",
//! tutorial demos). A record whose display name or native name contains one of
//! the markers below is dropped before it can reach the ledger.
//!
//! Matching is case-insensitive and word based. Both sides are split into
//! alphanumeric words. A term matches when its words appear consecutively and
//! the last text word *starts with* the last term word, so `"test"` matches
//! `"Tests"` and `"testing"` but not `"latest"` or `"contest"`.
//!
//! Known misfires (accepted, not corrected):
//! - false positives: `"Todoist"` (prefix `todo`), `"TestRail"`, `"Sample
//!   Rate Analyzer"`, `"Example.com DNS"` are real products that get dropped.
//! - false negatives: glued tokens such as `"mytestserver"` or leetspeak
//!   (`"t3st"`) pass the gate.

use msync_schemas::SourceKind;

/// Markers shared by every source.
pub const DENY_TERMS: &[&str] = &[
    "test",
    "demo",
    "example",
    "sample",
    "hello world",
    "my first",
    "todo",
];

/// Source-specific junk markers.
pub fn source_junk_markers(kind: SourceKind) -> &'static [&'static str] {
    match kind {
        SourceKind::Official => &["placeholder", "dummy"],
        SourceKind::Smithery => &["playground", "boilerplate", "starter template"],
    }
}

fn words(s: &str) -> Vec<String> {
    s.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(|w| w.to_lowercase())
        .collect()
}

fn term_matches(text_words: &[String], term: &str) -> bool {
    let term_words = words(term);
    let Some((last, head)) = term_words.split_last() else {
        return false;
    };
    let n = term_words.len();
    if text_words.len() < n {
        return false;
    }

    text_words.windows(n).any(|win| {
        let (win_last, win_head) = match win.split_last() {
            Some(parts) => parts,
            None => return false,
        };
        win_head == head && win_last.starts_with(last.as_str())
    })
}

/// Returns the first deny-list marker found in any of `texts`, or `None` when
/// the record passes the gate.
pub fn deny_listed(kind: SourceKind, texts: &[&str]) -> Option<&'static str> {
    let tokenized: Vec<Vec<String>> = texts.iter().map(|t| words(t)).collect();
    DENY_TERMS
        .iter()
        .chain(source_junk_markers(kind).iter())
        .copied()
        .find(|term| tokenized.iter().any(|tw| term_matches(tw, term)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn denied(text: &str) -> Option<&'static str> {
        deny_listed(SourceKind::Official, &[text])
    }

    #[test]
    fn whole_and_partial_word_matches() {
        assert_eq!(denied("Test Server"), Some("test"));
        assert_eq!(denied("integration-testing"), Some("test"));
        assert_eq!(denied("DEMOS for MCP"), Some("demo"));
        assert_eq!(denied("io.github.acme/example-mcp"), Some("example"));
    }

    #[test]
    fn inner_substrings_do_not_match() {
        assert_eq!(denied("Latest News"), None);
        assert_eq!(denied("Contest Tracker"), None);
        assert_eq!(denied("Weather"), None);
    }

    #[test]
    fn multi_word_terms_need_consecutive_words() {
        assert_eq!(denied("Hello World MCP"), Some("hello world"));
        assert_eq!(denied("my-first-server"), Some("my first"));
        assert_eq!(denied("hello brave world"), None);
    }

    #[test]
    fn documented_false_positive_is_kept() {
        assert_eq!(denied("Todoist"), Some("todo"));
    }

    #[test]
    fn source_specific_markers_only_apply_to_their_source() {
        assert_eq!(
            deny_listed(SourceKind::Smithery, &["Smithery Playground"]),
            Some("playground")
        );
        assert_eq!(deny_listed(SourceKind::Official, &["Smithery Playground"]), None);
        assert_eq!(deny_listed(SourceKind::Official, &["Placeholder"]), Some("placeholder"));
    }

    #[test]
    fn any_text_can_trigger() {
        assert_eq!(
            deny_listed(SourceKind::Smithery, &["Nice Name", "@someone/demo-server"]),
            Some("demo")
        );
    }
}
