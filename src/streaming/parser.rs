//! Component stream automaton
//!
//! Consumes model output one char at a time and splits it into plain text
//! and component blocks. Fence lines are only recognised at the start of a
//! line (up to three leading spaces). A backtick run at line start is held
//! back until it either becomes a fence or proves to be text, so nothing
//! depends on where chunk boundaries fall.
//!
//! A component body closes on a whole line of up to three spaces, at least
//! three backticks and optional trailing whitespace. The close is decided
//! when that line ends, or at end of input.
//!
//! ```text
//! Idle -> Text <-> FenceProbe -> ComponentBody -> Text
//!           \__________\______________\_________-> Done
//! ```

use crate::component::grammar::{parse_info_string, FENCE_CHAR};

/// Leading spaces allowed before a fence
const MAX_FENCE_INDENT: usize = 3;

/// Run length of a component fence
const COMPONENT_FENCE_TICKS: usize = 3;

/// Default bound on a probed fence line, in chars
pub const DEFAULT_MAX_FENCE_PROBE: usize = 128;

/// Automaton state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Nothing pushed yet
    Idle,
    /// Accumulating plain text
    Text,
    /// Reading the info string of a fence line
    FenceProbe,
    /// Buffering a component's JSON body
    ComponentBody,
    /// Ended or aborted; further input is ignored
    Done,
}

/// Output of the automaton, in input order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseEvent {
    /// Plain text, to be appended to the current text segment
    Text(String),
    /// A component fence opened; its body is still arriving
    ComponentStart { name: String },
    /// A component block closed
    ComponentComplete {
        name: String,
        /// JSON body without the fences
        body: String,
        /// The block as it appeared in the input
        raw: String,
    },
    /// The input ended inside a component body
    ComponentIncomplete { name: String, raw: String },
}

#[derive(Debug)]
struct OpenComponent {
    name: String,
    opening: String,
    body: String,
    /// Byte offset in `body` where the current line starts
    line_at: usize,
}

impl OpenComponent {
    fn complete(self) -> ParseEvent {
        let closing = self.body[self.line_at..].trim_end_matches(|c: char| c == '\r' || c == '\n');
        let raw_len = self.line_at + closing.len();
        ParseEvent::ComponentComplete {
            raw: format!("{}{}", self.opening, &self.body[..raw_len]),
            body: self.body[..self.line_at].to_string(),
            name: self.name,
        }
    }

    fn incomplete(self) -> ParseEvent {
        ParseEvent::ComponentIncomplete {
            raw: format!("{}{}", self.opening, self.body),
            name: self.name,
        }
    }
}

/// Whether `line` (without its newline) closes a component body
fn is_closing_fence(line: &str) -> bool {
    let line = line.trim_end();
    let fence = line.trim_start_matches(' ');
    line.len() - fence.len() <= MAX_FENCE_INDENT
        && fence.len() >= COMPONENT_FENCE_TICKS
        && fence.chars().all(|c| c == FENCE_CHAR)
}

/// Per-char component block parser
#[derive(Debug)]
pub struct ComponentStreamParser {
    state: StreamState,
    /// Text not yet handed out
    text: String,
    /// Held line prefix: indent, backticks and (while probing) the info string
    probe: String,
    probe_chars: usize,
    fence_ticks: usize,
    line_start: bool,
    /// Backtick run of an open non-component code block
    literal_fence: Option<usize>,
    component: Option<OpenComponent>,
    max_probe: usize,
}

impl Default for ComponentStreamParser {
    fn default() -> Self {
        Self::new()
    }
}

impl ComponentStreamParser {
    pub fn new() -> Self {
        Self::with_max_probe(DEFAULT_MAX_FENCE_PROBE)
    }

    /// Parser that gives up on a fence line longer than `max_probe` chars
    pub fn with_max_probe(max_probe: usize) -> Self {
        Self {
            state: StreamState::Idle,
            text: String::new(),
            probe: String::new(),
            probe_chars: 0,
            fence_ticks: 0,
            line_start: true,
            literal_fence: None,
            component: None,
            max_probe,
        }
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn is_done(&self) -> bool {
        self.state == StreamState::Done
    }

    /// Name of the component whose body is being buffered
    pub fn open_component(&self) -> Option<&str> {
        self.component.as_ref().map(|c| c.name.as_str())
    }

    /// Feed a chunk. Pending text is handed out at the end of every call;
    /// held fence prefixes are not.
    pub fn push(&mut self, chunk: &str) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        match self.state {
            StreamState::Done => return events,
            StreamState::Idle => self.state = StreamState::Text,
            _ => {}
        }

        for c in chunk.chars() {
            match self.state {
                StreamState::Text => self.step_text(c),
                StreamState::FenceProbe => self.step_probe(c, &mut events),
                StreamState::ComponentBody => self.step_body(c, &mut events),
                StreamState::Idle | StreamState::Done => {}
            }
        }

        self.flush_text(&mut events);
        events
    }

    /// End of input: flush everything that is held.
    pub fn end(&mut self) -> Vec<ParseEvent> {
        let mut events = Vec::new();
        match self.state {
            StreamState::Done => return events,
            StreamState::Idle => {}
            StreamState::Text | StreamState::FenceProbe => self.release_probe(),
            StreamState::ComponentBody => {
                if let Some(open) = self.component.take() {
                    let closed = is_closing_fence(&open.body[open.line_at..]);
                    events.push(if closed { open.complete() } else { open.incomplete() });
                }
            }
        }

        self.flush_text(&mut events);
        self.state = StreamState::Done;
        events
    }

    /// Discard everything without flushing. Idempotent.
    pub fn abort(&mut self) {
        self.text.clear();
        self.probe.clear();
        self.probe_chars = 0;
        self.fence_ticks = 0;
        self.component = None;
        self.literal_fence = None;
        self.state = StreamState::Done;
    }

    fn step_text(&mut self, c: char) {
        if self.line_start {
            if c == FENCE_CHAR {
                self.hold(c);
                self.fence_ticks += 1;
                if self.fence_ticks == COMPONENT_FENCE_TICKS {
                    self.state = StreamState::FenceProbe;
                }
                return;
            }
            if c == ' ' && self.fence_ticks == 0 && self.probe_chars < MAX_FENCE_INDENT {
                self.hold(c);
                return;
            }
            self.release_probe();
            self.line_start = false;
        }

        self.text.push(c);
        if c == '\n' {
            self.line_start = true;
        }
    }

    fn step_probe(&mut self, c: char, events: &mut Vec<ParseEvent>) {
        if c == '\n' {
            self.resolve_fence_line(events);
            return;
        }

        self.hold(c);
        if self.probe_chars > self.max_probe {
            self.release_probe();
            self.line_start = false;
            self.state = StreamState::Text;
        }
    }

    fn step_body(&mut self, c: char, events: &mut Vec<ParseEvent>) {
        let Some(open) = self.component.as_mut() else {
            self.state = StreamState::Text;
            return;
        };

        open.body.push(c);
        if c != '\n' {
            return;
        }
        if !is_closing_fence(&open.body[open.line_at..open.body.len() - 1]) {
            open.line_at = open.body.len();
            return;
        }

        if let Some(open) = self.component.take() {
            events.push(open.complete());
        }
        self.state = StreamState::Text;
        self.line_start = true;
    }

    /// A fence line ended. Decide between component, literal fence and text.
    fn resolve_fence_line(&mut self, events: &mut Vec<ParseEvent>) {
        let line = std::mem::take(&mut self.probe);
        self.probe_chars = 0;
        self.fence_ticks = 0;
        self.state = StreamState::Text;
        self.line_start = true;

        let fence = line.trim_start_matches(' ');
        let ticks = fence.len() - fence.trim_start_matches(FENCE_CHAR).len();
        let info = &fence[ticks..];

        match self.literal_fence {
            Some(open) => {
                if ticks >= open && info.trim().is_empty() {
                    self.literal_fence = None;
                }
            }
            None => {
                let component = (ticks == COMPONENT_FENCE_TICKS)
                    .then(|| parse_info_string(info))
                    .flatten()
                    .map(str::to_string);
                if let Some(name) = component {
                    self.flush_text(events);
                    events.push(ParseEvent::ComponentStart { name: name.clone() });
                    self.component = Some(OpenComponent {
                        name,
                        opening: format!("{line}\n"),
                        body: String::new(),
                        line_at: 0,
                    });
                    self.state = StreamState::ComponentBody;
                    return;
                }
                self.literal_fence = Some(ticks);
            }
        }

        self.text.push_str(&line);
        self.text.push('\n');
    }

    fn hold(&mut self, c: char) {
        self.probe.push(c);
        self.probe_chars += 1;
    }

    /// Move the held prefix into the text as-is
    fn release_probe(&mut self) {
        self.text.push_str(&self.probe);
        self.probe.clear();
        self.probe_chars = 0;
        self.fence_ticks = 0;
    }

    fn flush_text(&mut self, events: &mut Vec<ParseEvent>) {
        if !self.text.is_empty() {
            events.push(ParseEvent::Text(std::mem::take(&mut self.text)));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    /// Run chunks through a fresh parser and merge adjacent text events
    fn parse(chunks: &[&str]) -> Vec<ParseEvent> {
        let mut parser = ComponentStreamParser::new();
        let mut events = Vec::new();
        for chunk in chunks {
            events.extend(parser.push(chunk));
        }
        events.extend(parser.end());
        merge_text(events)
    }

    fn merge_text(events: Vec<ParseEvent>) -> Vec<ParseEvent> {
        let mut merged: Vec<ParseEvent> = Vec::new();
        for event in events {
            if let (Some(ParseEvent::Text(prev)), ParseEvent::Text(next)) =
                (merged.last_mut(), &event)
            {
                prev.push_str(next);
                continue;
            }
            merged.push(event);
        }
        merged
    }

    fn text(s: &str) -> ParseEvent {
        ParseEvent::Text(s.to_string())
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(parse(&["Hello ", "world"]), vec![text("Hello world")]);
    }

    #[test]
    fn test_component_block() {
        let events = parse(&["Intro\n```livellm:alert\n{\"text\":\"hi\"}\n```\nAfter"]);
        assert_eq!(
            events,
            vec![
                text("Intro\n"),
                ParseEvent::ComponentStart {
                    name: "alert".to_string()
                },
                ParseEvent::ComponentComplete {
                    name: "alert".to_string(),
                    body: "{\"text\":\"hi\"}\n".to_string(),
                    raw: "```livellm:alert\n{\"text\":\"hi\"}\n```".to_string(),
                },
                text("After"),
            ]
        );
    }

    #[test]
    fn test_start_fires_before_body_completes() {
        let mut parser = ComponentStreamParser::new();
        let first = parser.push("```livellm:alert\n");
        assert_eq!(
            first,
            vec![ParseEvent::ComponentStart {
                name: "alert".to_string()
            }]
        );
        assert_eq!(parser.state(), StreamState::ComponentBody);
        assert!(parser.push("{\"type\":\"info\"}\n").is_empty());
        // the closing line may still grow into something else
        assert!(parser.push("```").is_empty());
        assert!(matches!(
            parser.end().as_slice(),
            [ParseEvent::ComponentComplete { .. }]
        ));
    }

    #[test]
    fn test_close_decided_at_end_of_line() {
        let mut parser = ComponentStreamParser::new();
        parser.push("```livellm:alert\n{}\n");
        assert!(parser.push("``").is_empty());
        assert!(parser.push("`").is_empty());
        let events = parser.push("\nnext");
        assert_eq!(
            events,
            vec![
                ParseEvent::ComponentComplete {
                    name: "alert".to_string(),
                    body: "{}\n".to_string(),
                    raw: "```livellm:alert\n{}\n```".to_string(),
                },
                text("next"),
            ]
        );
    }

    #[test]
    fn test_indented_block_closes() {
        let input = "   ```livellm:alert\n   {\"text\":\"hi\"}\n   ```\nAfter";
        assert_eq!(
            parse(&[input]),
            vec![
                ParseEvent::ComponentStart {
                    name: "alert".to_string()
                },
                ParseEvent::ComponentComplete {
                    name: "alert".to_string(),
                    body: "   {\"text\":\"hi\"}\n".to_string(),
                    raw: "   ```livellm:alert\n   {\"text\":\"hi\"}\n   ```".to_string(),
                },
                text("After"),
            ]
        );
    }

    #[test]
    fn test_closing_line_rules() {
        let longer = parse(&["```livellm:x\n{}\n````  \nok"]);
        assert_eq!(
            longer[1],
            ParseEvent::ComponentComplete {
                name: "x".to_string(),
                body: "{}\n".to_string(),
                raw: "```livellm:x\n{}\n````  ".to_string(),
            }
        );
        assert_eq!(longer[2], text("ok"));

        // a fence with an info string, or indented four spaces, stays in the body
        let events = parse(&["```livellm:x\n{}\n```json\n    ```\n```\n"]);
        assert_eq!(
            events[1],
            ParseEvent::ComponentComplete {
                name: "x".to_string(),
                body: "{}\n```json\n    ```\n".to_string(),
                raw: "```livellm:x\n{}\n```json\n    ```\n```".to_string(),
            }
        );
        assert_eq!(events.len(), 2);

        let crlf = parse(&["```livellm:x\r\n{}\r\n```\r\nok"]);
        assert!(matches!(&crlf[1], ParseEvent::ComponentComplete { body, .. } if body == "{}\r\n"));
        assert_eq!(crlf[2], text("ok"));
    }

    #[test]
    fn test_trailing_backtick_survives_end() {
        assert_eq!(parse(&["Hello `"]), vec![text("Hello `")]);
        assert_eq!(parse(&["``"]), vec![text("``")]);
        assert_eq!(parse(&["a\n  ``"]), vec![text("a\n  ``")]);
    }

    #[test]
    fn test_held_ticks_released_by_text() {
        assert_eq!(parse(&["`", "code", "` done"]), vec![text("`code` done")]);
    }

    #[test]
    fn test_probe_flushed_on_end() {
        assert_eq!(parse(&["```livellm:al"]), vec![text("```livellm:al")]);
    }

    #[test]
    fn test_incomplete_component() {
        let events = parse(&["```livellm:alert\n{\"type\":\"info\","]);
        assert_eq!(
            events[1],
            ParseEvent::ComponentIncomplete {
                name: "alert".to_string(),
                raw: "```livellm:alert\n{\"type\":\"info\",".to_string(),
            }
        );
    }

    #[test]
    fn test_literal_code_fence_hides_components() {
        let input = "```md\n```livellm:alert\n{}\n```\nafter";
        assert_eq!(parse(&[input]), vec![text(input)]);
    }

    #[test]
    fn test_fence_mid_line_is_text() {
        let input = "say ```livellm:alert\n{}\n```";
        // the trailing ``` is still being probed when the input ends
        assert_eq!(parse(&[input]), vec![text(input)]);
    }

    #[test]
    fn test_overlong_probe_replayed_as_text() {
        let mut parser = ComponentStreamParser::with_max_probe(16);
        let mut events = parser.push("```livellm:a-very-long-component-name\n{}\n");
        events.extend(parser.end());
        assert_eq!(
            merge_text(events),
            vec![text("```livellm:a-very-long-component-name\n{}\n")]
        );
    }

    #[test]
    fn test_indented_fence() {
        let events = parse(&["   ```livellm:steps\n{}\n```"]);
        assert!(matches!(events[0], ParseEvent::ComponentStart { .. }));

        let four = "    ```livellm:steps\n";
        assert_eq!(parse(&[four]), vec![text(four)]);
    }

    #[test]
    fn test_newline_after_closing_fence_swallowed() {
        let events = parse(&["```livellm:x\n{}\n```\n\nnext"]);
        assert_eq!(events.last(), Some(&text("\nnext")));
    }

    #[test]
    fn test_abort_discards_and_stops() {
        let mut parser = ComponentStreamParser::new();
        parser.push("before\n```livellm:alert\n{\"te");
        parser.abort();
        assert!(parser.is_done());
        assert!(parser.push("more").is_empty());
        assert!(parser.end().is_empty());
        parser.abort();
        assert!(parser.is_done());
    }

    #[test]
    fn test_chunk_invariance() {
        let input = "Intro `x`\n```rust\nlet a = 1;\n```\n```livellm:chart\n{\"data\":[]}\n```\nTail ``";
        let whole = parse(&[input]);

        let by_line: Vec<&str> = input.split_inclusive('\n').collect();
        assert_eq!(parse(&by_line), whole);

        let chars: Vec<String> = input.chars().map(String::from).collect();
        let by_char: Vec<&str> = chars.iter().map(String::as_str).collect();
        assert_eq!(parse(&by_char), whole);
    }
}
