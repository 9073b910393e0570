use news_search::config::Config;
use news_search::search::{ContentExtractor, Highlighter, Keyword, NO_CONTENT, QueryParser};

#[test]
fn test_fallback_recovers_same_text_as_parser() {
    let extractor = ContentExtractor::from_config(&Config::default());
    let paragraphs = ["Council approves budget", "Vote passed 7 to 2", "Next session in May"];

    let body: String = paragraphs
        .iter()
        .map(|p| format!("<Content>\n  {p}\n</Content>"))
        .collect();
    let well_formed = format!("<?xml version=\"1.0\"?><Article>{body}</Article>");
    let malformed = format!("<Article><Meta>{body}</Article>");

    let expected = paragraphs.join("\n");
    assert_eq!(extractor.extract(&well_formed), expected);
    assert_eq!(extractor.extract(&malformed), expected);
}

#[test]
fn test_sentinel_cases() {
    let extractor = ContentExtractor::default();
    for xml in ["", "   ", "<root/>", "<root><Content>   </Content></root>"] {
        assert_eq!(extractor.extract(xml), NO_CONTENT, "{xml:?}");
    }
}

#[test]
fn test_configured_limit_applies() {
    let config = Config {
        max_content_chars: 10,
        ..Config::default()
    };
    let extractor = ContentExtractor::from_config(&config);
    assert_eq!(
        extractor.extract("<Content>0123456789abc</Content>"),
        "0123456789..."
    );
}

#[test]
fn test_highlight_with_parsed_keywords() {
    let highlighter = Highlighter::default();
    let keywords: Vec<Keyword> = QueryParser::parse("flood OR flooding, river").flatten();

    let marked = highlighter.highlight("Flooding along the River", &keywords);
    assert_eq!(
        marked,
        r#"<span class="highlight">Flooding</span> along the <span class="highlight">River</span>"#
    );
}
