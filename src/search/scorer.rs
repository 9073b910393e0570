use super::query_parser::Keyword;

/// Added once when a keyword appears in the title
pub const TITLE_WEIGHT: f64 = 3.0;

/// Added for the first occurrence of a keyword in the content
pub const CONTENT_WEIGHT: f64 = 1.0;

/// Added for every further occurrence in the content
pub const FREQUENCY_FACTOR: f64 = 0.5;

/// Content length (in characters) at which the length penalty starts to bite
const LENGTH_NORM: f64 = 500.0;

/// Term-frequency relevance with a title boost and length normalization
#[derive(Debug, Clone, Default)]
pub struct RelevanceScorer;

impl RelevanceScorer {
    pub fn new() -> Self {
        Self
    }

    /// Score one record. Pure and never negative; zero means no keyword
    /// matched anywhere.
    pub fn score(&self, title: &str, content: &str, keywords: &[Keyword]) -> f64 {
        let title_lower = title.to_lowercase();
        let content_lower = content.to_lowercase();

        let mut seen: Vec<String> = Vec::with_capacity(keywords.len());
        let mut score = 0.0;

        for keyword in keywords {
            let needle = keyword.as_str().to_lowercase();
            if seen.contains(&needle) {
                continue;
            }

            if title_lower.contains(&needle) {
                score += TITLE_WEIGHT;
            }

            let occurrences = content_lower.matches(needle.as_str()).count();
            if occurrences > 0 {
                score += CONTENT_WEIGHT + (occurrences - 1) as f64 * FREQUENCY_FACTOR;
            }

            seen.push(needle);
        }

        let length = content.chars().count() as f64;
        score * length_factor(length)
    }
}

/// `1 / (1 + ln(1 + length / 500))`, always in (0, 1]
fn length_factor(length: f64) -> f64 {
    1.0 / (1.0 + (1.0 + length / LENGTH_NORM).ln())
}
