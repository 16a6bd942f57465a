//! Line splitting with byte offsets
//!
//! All built-in detectors are line-based: a match always covers whole lines,
//! starting at a line start and ending before the last line's newline.

/// A line of the source text
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Line<'a> {
    /// Byte offset of the first char
    pub start: usize,
    /// Byte offset just past the last char, excluding `\r\n` / `\n`
    pub end: usize,
    /// Line content without its terminator
    pub text: &'a str,
}

impl<'a> Line<'a> {
    /// Whether the line holds only whitespace
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Split `text` into lines, keeping byte offsets into the original
pub fn split_lines(text: &str) -> Vec<Line<'_>> {
    let mut lines = Vec::new();
    let mut start = 0;

    for (idx, _) in text.match_indices('\n') {
        lines.push(make_line(text, start, idx));
        start = idx + 1;
    }
    if start < text.len() {
        lines.push(make_line(text, start, text.len()));
    }

    lines
}

fn make_line(text: &str, start: usize, mut end: usize) -> Line<'_> {
    if end > start && text.as_bytes()[end - 1] == b'\r' {
        end -= 1;
    }
    Line {
        start,
        end,
        text: &text[start..end],
    }
}
