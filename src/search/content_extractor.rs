use quick_xml::events::Event;
use quick_xml::reader::Reader;
use regex::Regex;
use tracing::{debug, warn};

/// Returned whenever no text can be recovered from a body
pub const NO_CONTENT: &str = "no content extracted";

/// Marker appended to truncated content
const ELLIPSIS: &str = "...";

/// Pulls the plain text of designated elements out of an embedded XML body.
///
/// Extraction degrades through three tiers and never fails: a structured
/// parse, then a regex scan for literal `<Tag>...</Tag>` pairs, then the
/// [`NO_CONTENT`] sentinel.
#[derive(Debug, Clone)]
pub struct ContentExtractor {
    tag: String,
    max_chars: usize,
    fallback: Option<Regex>,
}

impl ContentExtractor {
    pub fn new(tag: impl Into<String>, max_chars: usize) -> Self {
        let tag = tag.into();
        let pattern = format!("(?s)<{0}>(.*?)</{0}>", regex::escape(&tag));
        let fallback = Regex::new(&pattern)
            .map_err(|e| warn!("Regex fallback disabled for <{}>: {}", tag, e))
            .ok();

        Self {
            tag,
            max_chars,
            fallback,
        }
    }

    pub fn from_config(config: &crate::config::Config) -> Self {
        Self::new(&config.content_tag, config.max_content_chars)
    }

    /// Extract the text of every designated element, joined by newlines and
    /// capped at the configured length.
    pub fn extract(&self, xml: &str) -> String {
        self.try_extract(xml).unwrap_or_else(|| NO_CONTENT.to_string())
    }

    /// Like [`Self::extract`], but `None` where `extract` would return the
    /// sentinel, so callers can tell a placeholder from real text.
    pub fn try_extract(&self, xml: &str) -> Option<String> {
        if xml.trim().is_empty() {
            return None;
        }

        let parts = match self.parse_structured(xml) {
            Ok(parts) if !parts.is_empty() => parts,
            Ok(_) => {
                debug!("No non-empty <{}> element found, trying regex scan", self.tag);
                self.scan_fallback(xml)
            }
            Err(e) => {
                debug!("XML parse failed ({}), trying regex scan", e);
                self.scan_fallback(xml)
            }
        };

        if parts.is_empty() {
            warn!("No content extracted from body of {} bytes", xml.len());
            return None;
        }

        Some(truncate_chars(&parts.join("\n"), self.max_chars))
    }

    /// Walk the document and collect the trimmed text of each designated
    /// element, in document order. Text of child elements is included.
    fn parse_structured(&self, xml: &str) -> anyhow::Result<Vec<String>> {
        let mut reader = Reader::from_str(xml);
        let tag = self.tag.as_bytes();

        let mut open_elements: Vec<Vec<u8>> = Vec::new();
        // (depth of the capturing element, accumulated text)
        let mut capture: Option<(usize, String)> = None;
        let mut parts = Vec::new();

        loop {
            match reader.read_event()? {
                Event::Start(start) => {
                    open_elements.push(start.name().as_ref().to_vec());
                    if capture.is_none() && start.name().as_ref() == tag {
                        capture = Some((open_elements.len(), String::new()));
                    }
                }
                Event::End(_) => {
                    if let Some((depth, text)) = capture.take() {
                        if depth == open_elements.len() {
                            push_trimmed(&mut parts, &text);
                        } else {
                            capture = Some((depth, text));
                        }
                    }
                    open_elements.pop();
                }
                Event::Text(text) => {
                    if let Some((_, buffer)) = capture.as_mut() {
                        buffer.push_str(&text.unescape()?);
                    }
                }
                Event::CData(data) => {
                    if let Some((_, buffer)) = capture.as_mut() {
                        buffer.push_str(&String::from_utf8_lossy(&data));
                    }
                }
                Event::Eof => break,
                _ => {}
            }
        }

        if let Some(name) = open_elements.last() {
            anyhow::bail!("unclosed element <{}>", String::from_utf8_lossy(name));
        }

        debug!("Found {} <{}> element(s)", parts.len(), self.tag);
        Ok(parts)
    }

    fn scan_fallback(&self, xml: &str) -> Vec<String> {
        let Some(pattern) = &self.fallback else {
            return Vec::new();
        };

        let mut parts = Vec::new();
        for captures in pattern.captures_iter(xml) {
            if let Some(inner) = captures.get(1) {
                let text = quick_xml::escape::unescape(inner.as_str())
                    .map(|cow| cow.into_owned())
                    .unwrap_or_else(|_| inner.as_str().to_string());
                push_trimmed(&mut parts, &text);
            }
        }
        parts
    }
}

impl Default for ContentExtractor {
    fn default() -> Self {
        Self::from_config(&crate::config::Config::default())
    }
}

fn push_trimmed(parts: &mut Vec<String>, text: &str) {
    let trimmed = text.trim();
    if !trimmed.is_empty() {
        parts.push(trimmed.to_string());
    }
}

/// Cut to at most `max_chars` characters, marking the cut with an ellipsis
fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((cut, _)) => format!("{}{}", &text[..cut], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn extractor() -> ContentExtractor {
        ContentExtractor::new("Content", 500)
    }

    #[test]
    fn test_blank_input() {
        assert_eq!(extractor().extract(""), NO_CONTENT);
        assert_eq!(extractor().extract("   \n"), NO_CONTENT);
    }

    #[test]
    fn test_no_designated_element() {
        assert_eq!(extractor().extract("<root/>"), NO_CONTENT);
        assert_eq!(extractor().extract("<root><Title>x</Title></root>"), NO_CONTENT);
    }

    #[test]
    fn test_multiple_elements_in_order() {
        let xml = "<Doc><Content>  first </Content><Other>skip</Other><Content>second</Content></Doc>";
        assert_eq!(extractor().extract(xml), "first\nsecond");
    }

    #[test]
    fn test_empty_elements_skipped() {
        let xml = "<Doc><Content>  </Content><Content/><Content>kept</Content></Doc>";
        assert_eq!(extractor().extract(xml), "kept");
    }

    #[test]
    fn test_tag_match_is_case_sensitive() {
        let xml = "<Doc><content>lower</content><CONTENT>upper</CONTENT></Doc>";
        assert_eq!(extractor().extract(xml), NO_CONTENT);
    }

    #[test]
    fn test_entities_and_cdata() {
        let xml = "<Doc><Content>Tom &amp; Jerry</Content><Content><![CDATA[<b>raw</b>]]></Content></Doc>";
        assert_eq!(extractor().extract(xml), "Tom & Jerry\n<b>raw</b>");
    }

    #[test]
    fn test_child_element_text_included() {
        let xml = "<Doc><Content>Hello <b>bold</b> world</Content></Doc>";
        assert_eq!(extractor().extract(xml), "Hello bold world");
    }

    #[test]
    fn test_malformed_falls_back_to_regex() {
        let xml = "<Doc><Content>recovered\ntext</Content><Broken></Doc>";
        assert_eq!(extractor().extract(xml), "recovered\ntext");
    }

    #[test]
    fn test_truncated_document_falls_back() {
        let xml = "<Doc><Content>one</Content><Content>two</Content><Para";
        assert_eq!(extractor().extract(xml), "one\ntwo");
    }

    #[test]
    fn test_unclosed_root_falls_back() {
        let xml = "<Doc><Content>still here</Content>";
        assert_eq!(extractor().extract(xml), "still here");
    }

    #[test]
    fn test_malformed_without_content() {
        assert_eq!(extractor().extract("<Doc><Para>x</Doc>"), NO_CONTENT);
        assert_eq!(extractor().extract("not xml at all <<<"), NO_CONTENT);
    }

    #[test]
    fn test_truncation_after_concatenation() {
        let a = "a".repeat(300);
        let b = "b".repeat(300);
        let xml = format!("<Doc><Content>{a}</Content><Content>{b}</Content></Doc>");

        let text = extractor().extract(&xml);
        assert!(text.ends_with("..."));
        assert_eq!(text.chars().count(), 503);
        assert!(text.starts_with(&a));
        assert_eq!(text.chars().nth(300), Some('\n'));
    }

    #[test]
    fn test_exact_limit_not_truncated() {
        let body = "x".repeat(500);
        let xml = format!("<Content>{body}</Content>");
        assert_eq!(extractor().extract(&xml), body);
    }

    #[test]
    fn test_truncation_counts_characters() {
        let body = "新".repeat(600);
        let xml = format!("<Content>{body}</Content>");
        let text = extractor().extract(&xml);
        assert_eq!(text.chars().count(), 503);
        assert!(text.starts_with(&"新".repeat(500)));
    }

    #[test]
    fn test_custom_tag() {
        let extractor = ContentExtractor::new("Body", 500);
        assert_eq!(extractor.extract("<News><Body>text</Body></News>"), "text");
    }

    #[test]
    fn test_try_extract_separates_placeholder() {
        assert_eq!(extractor().try_extract("<broken"), None);
        assert_eq!(extractor().try_extract(""), None);
        assert_eq!(
            extractor().try_extract("<Content>no content extracted</Content>"),
            Some(NO_CONTENT.to_string())
        );
    }
}
