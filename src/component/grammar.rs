//! Component-block grammar
//!
//! Block form:
//!
//! ````text
//! ```livellm:<name>
//! { ...json object... }
//! ```
//! ````
//!
//! Inline form: `` `livellm:<name>{...json object...}` `` as the whole
//! content of a single-backtick code span.
//!
//! `<name>` matches `[A-Za-z0-9_][A-Za-z0-9_-]*`.
//!
//! Code spans and code blocks are located with a CommonMark parse, so a
//! component written inside a literal code block stays literal.

use pulldown_cmark::{Event, Options, Parser, Tag};
use serde_json::Value;
use std::ops::Range;

/// Prefix of every component info string
pub const COMPONENT_PREFIX: &str = "livellm:";

/// Fence marker character
pub const FENCE_CHAR: char = '`';

/// Closing fence
pub const FENCE: &str = "```";

/// Whether `name` is a valid component name
pub fn is_valid_component_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphanumeric() || first == '_' => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        }
        _ => false,
    }
}

/// Component name from a fence info string, if it is a component fence
pub fn parse_info_string(info: &str) -> Option<&str> {
    let name = info.trim().strip_prefix(COMPONENT_PREFIX)?;
    is_valid_component_name(name).then_some(name)
}

/// Split inline code-span content into `(name, json)`
pub fn parse_inline(content: &str) -> Option<(&str, &str)> {
    let rest = content.strip_prefix(COMPONENT_PREFIX)?;
    let brace = rest.find('{')?;
    let (name, json) = rest.split_at(brace);
    if !is_valid_component_name(name) || !json.ends_with('}') {
        return None;
    }
    Some((name, json))
}

/// An inline component span found in text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InlineSpan<'a> {
    /// Byte offset of the opening backtick
    pub start: usize,
    /// Byte offset past the closing backtick
    pub end: usize,
    /// Component name
    pub name: &'a str,
    /// Raw JSON object text
    pub json: &'a str,
}

impl<'a> InlineSpan<'a> {
    /// Source text of the span, backticks included
    pub fn raw(&self, text: &'a str) -> &'a str {
        &text[self.start..self.end]
    }
}

/// All inline component spans in `text`, in order.
///
/// Only real code spans count; text inside fenced or indented code blocks
/// is never matched.
pub fn find_inline_components(text: &str) -> Vec<InlineSpan<'_>> {
    Parser::new_ext(text, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| {
            let Event::Code(_) = event else {
                return None;
            };
            let content = text
                .get(range.clone())?
                .strip_prefix(FENCE_CHAR)?
                .strip_suffix(FENCE_CHAR)?;
            let (name, json) = parse_inline(content)?;
            Some(InlineSpan {
                start: range.start,
                end: range.end,
                name,
                json,
            })
        })
        .collect()
}

/// Byte ranges of every fenced or indented code block in `text`,
/// component blocks included
pub fn find_code_blocks(text: &str) -> Vec<Range<usize>> {
    Parser::new_ext(text, Options::empty())
        .into_offset_iter()
        .filter_map(|(event, range)| match event {
            Event::Start(Tag::CodeBlock(_)) => Some(range),
            _ => None,
        })
        .collect()
}

/// Render props as block-form component text (no trailing newline)
pub fn format_block(name: &str, props: &Value) -> String {
    let body = serde_json::to_string_pretty(props).unwrap_or_else(|_| "{}".to_string());
    format!("{FENCE}{COMPONENT_PREFIX}{name}\n{body}\n{FENCE}")
}
