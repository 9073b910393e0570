use serde::{Deserialize, Serialize};
use std::fmt;

/// A trimmed, non-empty search term.
///
/// Case is preserved for display; every comparison made with a keyword is
/// case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyword(String);

impl Keyword {
    /// Returns `None` for blank input
    pub fn new(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(Self(trimmed.to_string()))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Keyword {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Keywords combined with OR. Never empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryGroup {
    terms: Vec<Keyword>,
}

impl QueryGroup {
    fn from_terms(terms: Vec<Keyword>) -> Option<Self> {
        if terms.is_empty() {
            None
        } else {
            Some(Self { terms })
        }
    }

    pub fn terms(&self) -> &[Keyword] {
        &self.terms
    }
}

/// Groups combined with AND, in input order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryExpression {
    groups: Vec<QueryGroup>,
}

impl QueryExpression {
    pub fn groups(&self) -> &[QueryGroup] {
        &self.groups
    }

    /// An expression without groups cannot be executed
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Every keyword of every group, in order. Duplicates are kept.
    pub fn flatten(&self) -> Vec<Keyword> {
        self.groups
            .iter()
            .flat_map(|group| group.terms.iter().cloned())
            .collect()
    }
}

impl fmt::Display for QueryExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .groups
            .iter()
            .map(|group| {
                let terms: Vec<&str> = group.terms.iter().map(Keyword::as_str).collect();
                format!("({})", terms.join(" | "))
            })
            .collect();
        write!(f, "{}", rendered.join(" & "))
    }
}

/// Parser for the comma / OR keyword syntax
pub struct QueryParser;

impl QueryParser {
    /// Parse a raw keyword string into an AND of OR-groups.
    ///
    /// Commas separate AND-ed segments. A segment containing a standalone `OR`
    /// token (any case) becomes one group of OR-ed terms; any other segment is
    /// split on whitespace and each word becomes its own group.
    ///
    /// # Examples
    /// ```
    /// use news_search::search::query_parser::QueryParser;
    ///
    /// let expr = QueryParser::parse("alpha OR beta, gamma delta");
    /// assert_eq!(expr.groups().len(), 3);
    /// assert_eq!(expr.groups()[0].terms().len(), 2);
    /// assert_eq!(expr.to_string(), "(alpha | beta) & (gamma) & (delta)");
    /// ```
    pub fn parse(raw: &str) -> QueryExpression {
        let mut groups = Vec::new();

        for segment in raw.split(',') {
            let tokens = token_spans(segment);
            let has_or = tokens
                .iter()
                .any(|&(start, end)| is_or_operator(&segment[start..end]));

            if has_or {
                let mut terms = Vec::new();
                let mut term_start = 0;
                for &(start, end) in &tokens {
                    if is_or_operator(&segment[start..end]) {
                        terms.extend(Keyword::new(&segment[term_start..start]));
                        term_start = end;
                    }
                }
                terms.extend(Keyword::new(&segment[term_start..]));
                groups.extend(QueryGroup::from_terms(terms));
            } else {
                for (start, end) in tokens {
                    groups.extend(
                        Keyword::new(&segment[start..end])
                            .and_then(|keyword| QueryGroup::from_terms(vec![keyword])),
                    );
                }
            }
        }

        QueryExpression { groups }
    }
}

/// `OR` only acts as an operator when it is a whole whitespace-delimited token
fn is_or_operator(token: &str) -> bool {
    token.eq_ignore_ascii_case("or")
}

/// Byte ranges of the whitespace-separated tokens in `text`
fn token_spans(text: &str) -> Vec<(usize, usize)> {
    let mut spans = Vec::new();
    let mut start = None;

    for (idx, ch) in text.char_indices() {
        match (ch.is_whitespace(), start) {
            (true, Some(s)) => {
                spans.push((s, idx));
                start = None;
            }
            (false, None) => start = Some(idx),
            _ => {}
        }
    }
    if let Some(s) = start {
        spans.push((s, text.len()));
    }

    spans
}
