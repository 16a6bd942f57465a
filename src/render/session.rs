//! Streaming render session
//!
//! `StreamRenderer` drives the component automaton and mounts its output:
//! text segments are converted to HTML at most once per frame, a component
//! fence mounts a skeleton at once, and a closed (or truncated) block swaps
//! that skeleton for the live component or a fallback.
//!
//! Everything is synchronous. Callers own any async reading and simply call
//! `push` with whatever arrived.

use super::markdown::{CmarkConverter, MarkdownConverter};
use super::node::{inline_placeholder, Node, NodeId};
use super::scheduler::{FrameClock, ManualFrames, RenderScheduler};
use super::sink::MountSink;
use crate::component::{
    find_inline_components, resolve_component, AliasTable, ComponentRegistry, SchemaRegistry,
    Skeleton,
};
use crate::config::EnrichConfig;
use crate::error::{ComponentError, SetupError};
use crate::guard::isolate;
use crate::streaming::{
    ComponentStreamParser, ParseEvent, StreamState, Utf8Buffer, DEFAULT_MAX_FENCE_PROBE,
};
use crate::telemetry::{Event, EventSink, NullSink};
use log::{debug, warn};
use serde_json::{Map, Value};
use std::sync::Arc;

/// Skeleton height for components the registry does not describe
const DEFAULT_SKELETON_HEIGHT: u32 = 48;

/// Collaborators shared by streaming and whole-document rendering
#[derive(Clone)]
pub struct RenderOptions {
    pub registry: Arc<dyn ComponentRegistry>,
    pub aliases: Arc<AliasTable>,
    pub markdown: Arc<dyn MarkdownConverter>,
    pub events: Arc<dyn EventSink>,
    pub max_fence_probe: usize,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            registry: Arc::new(SchemaRegistry::builtin()),
            aliases: Arc::new(AliasTable::builtin()),
            markdown: Arc::new(CmarkConverter::new()),
            events: Arc::new(NullSink),
            max_fence_probe: DEFAULT_MAX_FENCE_PROBE,
        }
    }
}

/// Builder for `StreamRenderer`
pub struct StreamRendererBuilder<S, F> {
    sink: Option<S>,
    frames: Option<F>,
    options: RenderOptions,
    show_cursor: bool,
}

impl<S: MountSink, F: FrameClock> Default for StreamRendererBuilder<S, F> {
    fn default() -> Self {
        Self {
            sink: None,
            frames: None,
            options: RenderOptions::default(),
            show_cursor: false,
        }
    }
}

impl<S: MountSink, F: FrameClock> StreamRendererBuilder<S, F> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Where nodes are mounted. Required.
    pub fn sink(mut self, sink: S) -> Self {
        self.sink = Some(sink);
        self
    }

    /// Frame source for batched text renders. Required.
    pub fn frames(mut self, frames: F) -> Self {
        self.frames = Some(frames);
        self
    }

    pub fn options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn registry(mut self, registry: Arc<dyn ComponentRegistry>) -> Self {
        self.options.registry = registry;
        self
    }

    pub fn aliases(mut self, aliases: AliasTable) -> Self {
        self.options.aliases = Arc::new(aliases);
        self
    }

    pub fn markdown(mut self, markdown: Arc<dyn MarkdownConverter>) -> Self {
        self.options.markdown = markdown;
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSink>) -> Self {
        self.options.events = events;
        self
    }

    pub fn show_cursor(mut self, show: bool) -> Self {
        self.show_cursor = show;
        self
    }

    pub fn max_fence_probe(mut self, chars: usize) -> Self {
        self.options.max_fence_probe = chars;
        self
    }

    /// Take cursor, probe bound and event sink from configuration
    pub fn config(self, config: &EnrichConfig) -> Self {
        self.show_cursor(config.show_cursor)
            .max_fence_probe(config.max_fence_probe)
            .events(config.event_sink())
    }

    pub fn build(self) -> Result<StreamRenderer<S, F>, SetupError> {
        let sink = self.sink.ok_or(SetupError::TargetNotFound)?;
        let frames = self.frames.ok_or(SetupError::MissingFrameClock)?;

        Ok(StreamRenderer::assemble(
            sink,
            frames,
            self.options,
            self.show_cursor,
        ))
    }
}

/// One streaming render session
pub struct StreamRenderer<S: MountSink, F: FrameClock> {
    parser: ComponentStreamParser,
    utf8: Utf8Buffer,
    scheduler: RenderScheduler,
    sink: S,
    frames: F,
    options: RenderOptions,
    show_cursor: bool,
    /// Markdown source of the text segment since the last component
    segment: String,
    segment_node: Option<NodeId>,
    skeleton_node: Option<NodeId>,
    cursor_node: Option<NodeId>,
    full_text: String,
    started: bool,
}

impl<S: MountSink, F: FrameClock> StreamRenderer<S, F> {
    pub fn builder() -> StreamRendererBuilder<S, F> {
        StreamRendererBuilder::new()
    }

    fn assemble(sink: S, frames: F, options: RenderOptions, show_cursor: bool) -> Self {
        Self {
            parser: ComponentStreamParser::with_max_probe(options.max_fence_probe),
            utf8: Utf8Buffer::new(),
            scheduler: RenderScheduler::new(),
            sink,
            frames,
            options,
            show_cursor,
            segment: String::new(),
            segment_node: None,
            skeleton_node: None,
            cursor_node: None,
            full_text: String::new(),
            started: false,
        }
    }

    /// Feed a chunk of model output. No-op once ended or aborted.
    pub fn push(&mut self, chunk: &str) {
        if self.parser.is_done() {
            return;
        }
        self.ensure_started();

        self.full_text.push_str(chunk);
        self.emit(Event::Token {
            text: chunk.to_string(),
        });

        let events = self.parser.push(chunk);
        self.apply(events);
    }

    /// Feed raw bytes; multi-byte chars may be split across calls.
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        if self.parser.is_done() {
            return;
        }
        let text = self.utf8.decode(bytes);
        if !text.is_empty() {
            self.push(&text);
        }
    }

    /// The frame requested from the clock fired
    pub fn on_frame(&mut self) {
        if self.scheduler.frame_fired() {
            self.render_segment();
        }
    }

    /// End of stream: flush everything held, settle any open component.
    /// `start` is emitted here if nothing was pushed.
    pub fn end(&mut self) {
        if self.parser.is_done() {
            return;
        }
        self.ensure_started();

        let tail = self.utf8.finish();
        if !tail.is_empty() {
            self.push(&tail);
        }

        let events = self.parser.end();
        self.apply(events);
        if self.scheduler.flush_now(&mut self.frames) {
            self.render_segment();
        }

        if let Some(id) = self.skeleton_node.take() {
            self.sink.remove(id);
        }
        if let Some(id) = self.cursor_node.take() {
            self.sink.remove(id);
        }

        self.emit(Event::End {
            full_text: self.full_text.clone(),
        });
    }

    /// Stop immediately. Nothing pending is rendered; the open skeleton and
    /// the cursor are removed. Idempotent.
    pub fn abort(&mut self) {
        if self.parser.is_done() {
            return;
        }
        debug!("[stream] aborted in state {:?}", self.parser.state());

        self.parser.abort();
        self.scheduler.cancel(&mut self.frames);
        self.utf8.finish();
        self.segment.clear();

        if let Some(id) = self.skeleton_node.take() {
            self.sink.remove(id);
        }
        if let Some(id) = self.cursor_node.take() {
            self.sink.remove(id);
        }
    }

    pub fn state(&self) -> StreamState {
        self.parser.state()
    }

    /// Everything pushed so far
    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn frames(&self) -> &F {
        &self.frames
    }

    pub fn frames_mut(&mut self) -> &mut F {
        &mut self.frames
    }

    pub fn into_sink(self) -> S {
        self.sink
    }

    fn apply(&mut self, events: Vec<ParseEvent>) {
        for event in events {
            match event {
                ParseEvent::Text(text) => {
                    self.segment.push_str(&text);
                    self.scheduler.mark_dirty(&mut self.frames);
                }
                ParseEvent::ComponentStart { name } => self.start_component(&name),
                ParseEvent::ComponentComplete { name, body, raw } => {
                    let result = resolve_component(
                        self.options.registry.as_ref(),
                        &self.options.aliases,
                        &name,
                        &body,
                    );
                    self.settle_component(&name, &raw, result);
                }
                ParseEvent::ComponentIncomplete { name, raw } => {
                    let result = Err(ComponentError::Incomplete(name.clone()));
                    self.settle_component(&name, &raw, result);
                }
            }
        }
    }

    fn start_component(&mut self, name: &str) {
        if self.scheduler.flush_now(&mut self.frames) {
            self.render_segment();
        }
        self.segment.clear();
        self.segment_node = None;

        debug!("[stream] component '{}' started", name);
        self.emit(Event::ComponentStart {
            component: name.to_string(),
        });

        let registry = &self.options.registry;
        let skeleton = isolate("registry.skeleton", || registry.skeleton(name))
            .flatten()
            .unwrap_or_else(|| Skeleton::sized(name, DEFAULT_SKELETON_HEIGHT));
        let id = self.sink.append(Node::Skeleton {
            component: name.to_string(),
            html: skeleton.html,
            height: skeleton.height,
        });
        self.skeleton_node = Some(id);
        self.place_cursor();
    }

    fn settle_component(
        &mut self,
        name: &str,
        raw: &str,
        result: Result<Map<String, Value>, ComponentError>,
    ) {
        match &result {
            Ok(props) => self.emit(Event::ComponentComplete {
                component: name.to_string(),
                props: Value::Object(props.clone()),
            }),
            Err(err) => {
                warn!("[stream] component '{}' not mounted: {}", name, err);
                self.emit(Event::component_error(err));
            }
        }

        let node = Node::from_resolution(name, raw, result);
        match self.skeleton_node.take() {
            Some(id) => self.sink.replace(id, node),
            None => {
                self.sink.append(node);
            }
        }
        self.place_cursor();
    }

    /// Re-render the current text segment into its node
    fn render_segment(&mut self) {
        if self.segment.is_empty() {
            return;
        }
        let node = render_text(&self.segment, &self.options);
        match self.segment_node {
            Some(id) => self.sink.replace(id, node),
            None => self.segment_node = Some(self.sink.append(node)),
        }
        self.place_cursor();
    }

    /// Move the cursor to the end, if enabled
    fn place_cursor(&mut self) {
        if !self.show_cursor {
            return;
        }
        if let Some(id) = self.cursor_node.take() {
            self.sink.remove(id);
        }
        self.cursor_node = Some(self.sink.append(Node::Cursor));
    }

    fn ensure_started(&mut self) {
        if !self.started {
            self.started = true;
            self.emit(Event::Start);
        }
    }

    fn emit(&self, event: Event) {
        self.options.events.emit(&event);
    }
}

/// Convert a text segment, resolving inline components first
fn render_text(markdown: &str, options: &RenderOptions) -> Node {
    let spans = find_inline_components(markdown);
    if spans.is_empty() {
        return Node::Text {
            html: options.markdown.to_html(markdown),
            inline: Vec::new(),
        };
    }

    let mut source = String::with_capacity(markdown.len());
    let mut inline = Vec::with_capacity(spans.len());
    let mut last = 0;
    for (index, span) in spans.iter().enumerate() {
        source.push_str(&markdown[last..span.start]);
        source.push_str(&inline_placeholder(index));
        last = span.end;

        let result = resolve_component(
            options.registry.as_ref(),
            &options.aliases,
            span.name,
            span.json,
        );
        inline.push(Node::from_resolution(span.name, span.raw(markdown), result));
    }
    source.push_str(&markdown[last..]);

    Node::Text {
        html: options.markdown.to_html(&source),
        inline,
    }
}

/// Render a complete text into `sink` through the streaming path
pub fn render_document<S: MountSink>(text: &str, sink: S, options: &RenderOptions) -> S {
    let mut renderer =
        StreamRenderer::assemble(sink, ManualFrames::new(), options.clone(), false);
    renderer.push(text);
    renderer.end();
    renderer.into_sink()
}
