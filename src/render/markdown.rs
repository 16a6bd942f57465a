//! Markdown to HTML for text segments

use pulldown_cmark::{html, Options, Parser};

/// Pure `markdown -> html` conversion
pub trait MarkdownConverter: Send + Sync {
    fn to_html(&self, markdown: &str) -> String;
}

/// CommonMark converter backed by pulldown-cmark
#[derive(Debug, Clone, Copy)]
pub struct CmarkConverter {
    options: Options,
}

impl Default for CmarkConverter {
    fn default() -> Self {
        let mut options = Options::empty();
        options.insert(Options::ENABLE_TABLES);
        options.insert(Options::ENABLE_STRIKETHROUGH);
        options.insert(Options::ENABLE_TASKLISTS);
        Self { options }
    }
}

impl CmarkConverter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_options(options: Options) -> Self {
        Self { options }
    }
}

impl MarkdownConverter for CmarkConverter {
    fn to_html(&self, markdown: &str) -> String {
        let parser = Parser::new_ext(markdown, self.options);
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(&mut out, parser);
        out
    }
}

/// Escapes text into a single paragraph; no markdown semantics
#[derive(Debug, Default, Clone, Copy)]
pub struct PlainTextConverter;

impl MarkdownConverter for PlainTextConverter {
    fn to_html(&self, markdown: &str) -> String {
        if markdown.trim().is_empty() {
            return String::new();
        }
        format!("<p>{}</p>\n", super::node::escape_html(markdown.trim()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmark_paragraph_and_emphasis() {
        let html = CmarkConverter::new().to_html("Hello **world**");
        assert_eq!(html, "<p>Hello <strong>world</strong></p>\n");
    }

    #[test]
    fn test_cmark_tables_enabled() {
        let html = CmarkConverter::new().to_html("| a |\n|---|\n| 1 |");
        assert!(html.contains("<table>"));
    }

    #[test]
    fn test_plain_text_escapes() {
        assert_eq!(PlainTextConverter.to_html(" a<b "), "<p>a&lt;b</p>\n");
        assert_eq!(PlainTextConverter.to_html("\n"), "");
    }
}
