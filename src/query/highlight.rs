//! Snippet highlighting
//!
//! Works from the stored field text alone: the text is re-analyzed with the
//! field's analyzer and tokens whose term matched are wrapped in tags.

use std::collections::BTreeSet;

use super::types::Hit;
use crate::config::HighlightConfig;
use crate::models::StoredDocument;
use crate::segment::Searcher;
use crate::tokenizer::Analyzer;

const ELLIPSIS: &str = "...";

/// Builds highlighted fragments for search hits
#[derive(Clone, Debug)]
pub struct Highlighter {
    config: HighlightConfig,
}

impl Highlighter {
    pub fn new(config: HighlightConfig) -> Self {
        Self { config }
    }

    /// Highlight of every content field of a hit
    ///
    /// Fields are highlighted independently; identical fragments are emitted
    /// once and distinct ones are joined with a newline.
    pub fn highlight_hit(&self, doc: &StoredDocument, hit: &Hit, searcher: &Searcher) -> String {
        let empty = BTreeSet::new();
        let mut fragments: Vec<String> = Vec::new();

        for field in searcher.schema().content_field_names() {
            let Some(text) = doc.content(field) else {
                continue;
            };
            let Some(analyzer) = searcher.analyzers().get(field).and_then(|a| a.as_text()) else {
                continue;
            };
            let matched = hit.matched_in(field).unwrap_or(&empty);
            let fragment = self.fragment(text, matched, analyzer);
            if !fragments.contains(&fragment) {
                fragments.push(fragment);
            }
        }

        fragments.join("\n")
    }

    /// Best fragment of `text` around the tokens whose term is in `matched`
    ///
    /// Falls back to a prefix of the text when nothing matches.
    pub fn fragment(&self, text: &str, matched: &BTreeSet<String>, analyzer: &Analyzer) -> String {
        let spans: Vec<(usize, usize)> = if matched.is_empty() {
            Vec::new()
        } else {
            analyzer
                .analyze(text)
                .filter(|t| matched.contains(&t.term))
                .map(|t| (t.start, t.end))
                .collect()
        };

        let Some((window_start, window_end)) = best_window(&spans, self.config.max_chars) else {
            return self.prefix(text);
        };

        let start = floor_char_boundary(text, window_start.saturating_sub(self.config.surround));
        let end = ceil_char_boundary(text, window_end.saturating_add(self.config.surround));

        let mut out = String::with_capacity(end - start + 16);
        if start > 0 {
            out.push_str(ELLIPSIS);
        }

        let mut cursor = start;
        for &(s, e) in spans.iter().filter(|(s, e)| *s >= start && *e <= end) {
            out.push_str(&text[cursor..s]);
            out.push_str(&self.config.pre_tag);
            out.push_str(&text[s..e]);
            out.push_str(&self.config.post_tag);
            cursor = e;
        }
        out.push_str(&text[cursor..end]);

        if end < text.len() {
            out.push_str(ELLIPSIS);
        }
        out
    }

    fn prefix(&self, text: &str) -> String {
        if text.len() <= self.config.max_chars {
            return text.to_string();
        }
        let end = floor_char_boundary(text, self.config.max_chars);
        format!("{}{}", &text[..end], ELLIPSIS)
    }
}

/// Span `(start, end)` covering the most matches within `max_chars`
///
/// The earliest window wins a tie.
fn best_window(spans: &[(usize, usize)], max_chars: usize) -> Option<(usize, usize)> {
    let mut best: Option<(usize, usize, usize)> = None;
    let mut j = 0;

    for (i, &(start, _)) in spans.iter().enumerate() {
        j = j.max(i);
        while j + 1 < spans.len() && spans[j + 1].1 - start <= max_chars {
            j += 1;
        }
        let count = j - i + 1;
        if best.map_or(true, |(c, _, _)| count > c) {
            best = Some((count, start, spans[j].1));
        }
    }

    best.map(|(_, start, end)| (start, end))
}

fn floor_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index -= 1;
    }
    index
}

fn ceil_char_boundary(text: &str, mut index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    while !text.is_char_boundary(index) {
        index += 1;
    }
    index
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AnalyzerConfig;
    use crate::schema::Language;

    fn english() -> Analyzer {
        Analyzer::new(&AnalyzerConfig::default(), Some(Language::English))
    }

    fn terms(items: &[&str]) -> BTreeSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn highlighter(max_chars: usize, surround: usize) -> Highlighter {
        Highlighter::new(HighlightConfig {
            max_chars,
            surround,
            ..HighlightConfig::default()
        })
    }

    #[test]
    fn test_short_text_is_fully_highlighted() {
        let h = Highlighter::new(HighlightConfig::default());
        let text = "The quick brown fox jumps over the lazy dog";
        assert_eq!(
            h.fragment(text, &terms(&["fox"]), &english()),
            "The quick brown <b>fox</b> jumps over the lazy dog"
        );
    }

    #[test]
    fn test_stemmed_match_highlights_surface_word() {
        let h = Highlighter::new(HighlightConfig::default());
        assert_eq!(
            h.fragment("Running late", &terms(&["run"]), &english()),
            "<b>Running</b> late"
        );
    }

    #[test]
    fn test_cut_fragment_gets_ellipses() {
        let h = highlighter(10, 5);
        let text = "aaaa bbbb cccc fox dddd eeee ffff";
        assert_eq!(
            h.fragment(text, &terms(&["fox"]), &english()),
            "...cccc <b>fox</b> dddd..."
        );
    }

    #[test]
    fn test_window_with_most_matches_wins() {
        let h = highlighter(20, 0);
        let text = format!("beta {} beta beta beta", "x".repeat(30));
        assert_eq!(
            h.fragment(&text, &terms(&["beta"]), &english()),
            "...<b>beta</b> <b>beta</b> <b>beta</b>"
        );
    }

    #[test]
    fn test_no_match_returns_prefix() {
        let h = Highlighter::new(HighlightConfig::default());
        assert_eq!(h.fragment("short text", &terms(&["zzz"]), &english()), "short text");

        let long = "word ".repeat(100);
        let fragment = h.fragment(&long, &BTreeSet::new(), &english());
        assert!(fragment.ends_with("..."));
        assert_eq!(fragment.len(), 200 + 3);
    }

    #[test]
    fn test_char_boundaries_are_respected() {
        let h = highlighter(3, 1);
        let text = "àèìòù città è bella";
        let fragment = h.fragment(text, &terms(&["citt"]), &Analyzer::neutral(&AnalyzerConfig::default()));
        assert!(!fragment.contains("<b>"));

        let fragment = h.fragment(text, &terms(&["è"]), &Analyzer::neutral(&AnalyzerConfig::default()));
        assert!(fragment.contains("<b>è</b>"));
        assert!(fragment.starts_with("..."));
    }

    #[test]
    fn test_best_window() {
        assert_eq!(best_window(&[], 10), None);
        assert_eq!(best_window(&[(0, 3), (50, 53), (55, 58)], 10), Some((50, 58)));
        assert_eq!(best_window(&[(0, 3), (50, 53)], 10), Some((0, 3)));
    }
}
