use regex::RegexBuilder;
use std::ops::Range;
use tracing::warn;

use super::query_parser::Keyword;

/// Wraps keyword occurrences in visual markers.
///
/// Keywords are matched literally and case-insensitively, longest first. A
/// match that overlaps a span already claimed by an earlier (longer or
/// equal-length) keyword is left unmarked, so markers never nest.
///
/// Highlighting is not idempotent: marker text is not stripped before
/// matching, so a second pass can mark text inside the first pass's markers.
#[derive(Debug, Clone)]
pub struct Highlighter {
    open: String,
    close: String,
}

impl Highlighter {
    pub fn new(open: impl Into<String>, close: impl Into<String>) -> Self {
        Self {
            open: open.into(),
            close: close.into(),
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(&config.highlight_open, &config.highlight_close)
    }

    pub fn highlight(&self, text: &str, keywords: &[Keyword]) -> String {
        if text.is_empty() || keywords.is_empty() {
            return text.to_string();
        }

        let mut claimed: Vec<Range<usize>> = Vec::new();

        for keyword in ordered_keywords(keywords) {
            let matcher = match RegexBuilder::new(&regex::escape(keyword))
                .case_insensitive(true)
                .build()
            {
                Ok(matcher) => matcher,
                Err(e) => {
                    warn!("Skipping highlight for {:?}: {}", keyword, e);
                    continue;
                }
            };

            for found in matcher.find_iter(text) {
                let span = found.range();
                if !claimed.iter().any(|c| overlaps(c, &span)) {
                    claimed.push(span);
                }
            }
        }

        if claimed.is_empty() {
            return text.to_string();
        }

        claimed.sort_by_key(|span| span.start);

        let extra = claimed.len() * (self.open.len() + self.close.len());
        let mut marked = String::with_capacity(text.len() + extra);
        let mut cursor = 0;
        for span in claimed {
            marked.push_str(&text[cursor..span.start]);
            marked.push_str(&self.open);
            marked.push_str(&text[span.clone()]);
            marked.push_str(&self.close);
            cursor = span.end;
        }
        marked.push_str(&text[cursor..]);

        marked
    }
}

impl Default for Highlighter {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default())
    }
}

/// Distinct keywords (case-insensitive), longest first. Ties keep input order.
fn ordered_keywords(keywords: &[Keyword]) -> Vec<&str> {
    let mut seen: Vec<String> = Vec::new();
    let mut ordered: Vec<&str> = Vec::new();

    for keyword in keywords {
        let folded = keyword.as_str().to_lowercase();
        if !seen.contains(&folded) {
            seen.push(folded);
            ordered.push(keyword.as_str());
        }
    }

    ordered.sort_by(|a, b| b.chars().count().cmp(&a.chars().count()));
    ordered
}

fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    a.start < b.end && b.start < a.end
}
