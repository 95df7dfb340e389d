//! Markdown AST built from `pulldown-cmark` events.
//!
//! The parser yields a flat event stream; [`parse`] folds it into an owned
//! tree so later stages can work on whole blocks. Raw HTML from the source
//! becomes plain [`Node::Text`] and is escaped on output like any other text.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

use crate::error::RenderError;
use crate::util::heading_level_to_num;

/// Markdown AST node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Literal text.
    Text(String),
    /// `*emphasis*`.
    Emphasis(Vec<Node>),
    /// `**strong**`.
    Strong(Vec<Node>),
    /// `~~strikethrough~~`.
    Strikethrough(Vec<Node>),
    /// ATX or setext heading.
    Heading {
        /// Level 1-6.
        level: u8,
        /// Inline content.
        children: Vec<Node>,
    },
    /// Paragraph.
    Paragraph(Vec<Node>),
    /// Ordered (`start` is `Some`) or unordered list of [`Node::ListItem`].
    List {
        /// First number of an ordered list.
        start: Option<u64>,
        /// List items.
        items: Vec<Node>,
    },
    /// List item, optionally a task with its checked state.
    ListItem {
        /// `Some(checked)` for `- [ ]` / `- [x]` items.
        task: Option<bool>,
        /// Item content.
        children: Vec<Node>,
    },
    /// Blockquote.
    Blockquote(Vec<Node>),
    /// Fenced or indented code block.
    CodeBlock {
        /// First word of the fence info string.
        language: Option<String>,
        /// Verbatim content.
        content: String,
    },
    /// Inline code span.
    CodeSpan(String),
    /// Link (inline, reference or autolink).
    Link {
        /// Destination as written.
        href: String,
        /// Optional title (empty when absent).
        title: String,
        /// Link label.
        children: Vec<Node>,
    },
    /// Image.
    Image {
        /// Source as written.
        src: String,
        /// Plain-text alternative.
        alt: String,
        /// Optional title (empty when absent).
        title: String,
    },
    /// GFM table.
    Table {
        /// Header cells.
        head: Vec<Vec<Node>>,
        /// Body rows of cells.
        rows: Vec<Vec<Vec<Node>>>,
    },
    /// `---`.
    ThematicBreak,
    /// Line break inside a paragraph.
    SoftBreak,
    /// Hard line break.
    HardBreak,
}

/// Parser options: GFM tables, strikethrough and task lists.
#[must_use]
pub fn parser_options() -> Options {
    Options::ENABLE_TABLES | Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS
}

/// Parse markdown into AST nodes.
///
/// # Errors
///
/// Returns an error if the event stream is not properly nested.
pub fn parse(markdown: &str) -> Result<Vec<Node>, RenderError> {
    let mut builder = AstBuilder::default();
    for event in Parser::new_ext(markdown, parser_options()) {
        builder.process_event(event)?;
    }
    builder.finish()
}

/// Plain text of inline nodes (used for image alt text).
#[must_use]
pub fn plain_text(nodes: &[Node]) -> String {
    let mut out = String::new();
    for node in nodes {
        match node {
            Node::Text(text) | Node::CodeSpan(text) => out.push_str(text),
            Node::Emphasis(children)
            | Node::Strong(children)
            | Node::Strikethrough(children)
            | Node::Paragraph(children)
            | Node::Blockquote(children)
            | Node::Heading { children, .. }
            | Node::ListItem { children, .. }
            | Node::Link { children, .. } => out.push_str(&plain_text(children)),
            Node::Image { alt, .. } => out.push_str(alt),
            Node::SoftBreak | Node::HardBreak => out.push(' '),
            Node::CodeBlock { content, .. } => out.push_str(content),
            Node::List { .. } | Node::Table { .. } | Node::ThematicBreak => {}
        }
    }
    out
}

/// Open container while folding events.
#[derive(Debug)]
enum FrameKind {
    Paragraph,
    Heading(u8),
    Blockquote,
    CodeBlock(Option<String>),
    List(Option<u64>),
    Item,
    Table,
    TableHead,
    TableRow,
    TableCell,
    Emphasis,
    Strong,
    Strikethrough,
    Link { href: String, title: String },
    Image { src: String, title: String },
    /// Raw HTML block, kept as a paragraph of text.
    HtmlBlock,
    /// Container without a node of its own; children go to the parent.
    Transparent,
}

impl FrameKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Paragraph => "paragraph",
            Self::Heading(_) => "heading",
            Self::Blockquote => "blockquote",
            Self::CodeBlock(_) => "code block",
            Self::List(_) => "list",
            Self::Item => "list item",
            Self::Table => "table",
            Self::TableHead => "table head",
            Self::TableRow => "table row",
            Self::TableCell => "table cell",
            Self::Emphasis => "emphasis",
            Self::Strong => "strong",
            Self::Strikethrough => "strikethrough",
            Self::Link { .. } => "link",
            Self::Image { .. } => "image",
            Self::HtmlBlock => "html block",
            Self::Transparent => "container",
        }
    }
}

fn end_name(tag: &TagEnd) -> &'static str {
    match tag {
        TagEnd::Paragraph => "paragraph",
        TagEnd::Heading(_) => "heading",
        TagEnd::BlockQuote(_) => "blockquote",
        TagEnd::CodeBlock => "code block",
        TagEnd::List(_) => "list",
        TagEnd::Item => "list item",
        TagEnd::Table => "table",
        TagEnd::TableHead => "table head",
        TagEnd::TableRow => "table row",
        TagEnd::TableCell => "table cell",
        TagEnd::Emphasis => "emphasis",
        TagEnd::Strong => "strong",
        TagEnd::Strikethrough => "strikethrough",
        TagEnd::Link => "link",
        TagEnd::Image => "image",
        TagEnd::HtmlBlock => "html block",
        TagEnd::FootnoteDefinition
        | TagEnd::MetadataBlock(_)
        | TagEnd::DefinitionList
        | TagEnd::DefinitionListTitle
        | TagEnd::DefinitionListDefinition
        | TagEnd::Superscript
        | TagEnd::Subscript => "container",
    }
}

#[derive(Debug)]
struct Frame {
    kind: FrameKind,
    children: Vec<Node>,
    /// Task marker seen inside a list item.
    task: Option<bool>,
}

/// Table being assembled; GFM tables never nest.
#[derive(Debug, Default)]
struct TableBuilder {
    head: Vec<Vec<Node>>,
    rows: Vec<Vec<Vec<Node>>>,
    row: Vec<Vec<Node>>,
}

#[derive(Debug, Default)]
struct AstBuilder {
    root: Vec<Node>,
    stack: Vec<Frame>,
    tables: Vec<TableBuilder>,
}

impl AstBuilder {
    fn process_event(&mut self, event: Event<'_>) -> Result<(), RenderError> {
        match event {
            Event::Start(tag) => self.start_tag(tag),
            Event::End(tag) => return self.end_tag(&tag),
            Event::Text(text) => self.push_text(&text),
            Event::Code(code) => self.push(Node::CodeSpan(code.into_string())),
            Event::Html(html) | Event::InlineHtml(html) => self.push_text(&html),
            Event::InlineMath(math) | Event::DisplayMath(math) => self.push_text(&math),
            Event::FootnoteReference(name) => self.push_text(&format!("[^{name}]")),
            Event::SoftBreak => self.push(Node::SoftBreak),
            Event::HardBreak => self.push(Node::HardBreak),
            Event::Rule => self.push(Node::ThematicBreak),
            Event::TaskListMarker(checked) => {
                if let Some(frame) = self
                    .stack
                    .iter_mut()
                    .rev()
                    .find(|f| matches!(f.kind, FrameKind::Item))
                {
                    frame.task = Some(checked);
                }
            }
        }
        Ok(())
    }

    fn start_tag(&mut self, tag: Tag<'_>) {
        let kind = match tag {
            Tag::Paragraph => FrameKind::Paragraph,
            Tag::Heading { level, .. } => FrameKind::Heading(heading_level_to_num(level)),
            Tag::BlockQuote(_) => FrameKind::Blockquote,
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info
                        .split_whitespace()
                        .next()
                        .map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };
                FrameKind::CodeBlock(language)
            }
            Tag::List(start) => FrameKind::List(start),
            Tag::Item => FrameKind::Item,
            Tag::Table(_) => {
                self.tables.push(TableBuilder::default());
                FrameKind::Table
            }
            Tag::TableHead => FrameKind::TableHead,
            Tag::TableRow => FrameKind::TableRow,
            Tag::TableCell => FrameKind::TableCell,
            Tag::Emphasis => FrameKind::Emphasis,
            Tag::Strong => FrameKind::Strong,
            Tag::Strikethrough => FrameKind::Strikethrough,
            Tag::Link {
                dest_url, title, ..
            } => FrameKind::Link {
                href: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::Image {
                dest_url, title, ..
            } => FrameKind::Image {
                src: dest_url.into_string(),
                title: title.into_string(),
            },
            Tag::HtmlBlock => FrameKind::HtmlBlock,
            Tag::FootnoteDefinition(_)
            | Tag::MetadataBlock(_)
            | Tag::DefinitionList
            | Tag::DefinitionListTitle
            | Tag::DefinitionListDefinition
            | Tag::Superscript
            | Tag::Subscript => FrameKind::Transparent,
        };
        self.stack.push(Frame {
            kind,
            children: Vec::new(),
            task: None,
        });
    }

    fn end_tag(&mut self, tag: &TagEnd) -> Result<(), RenderError> {
        let found = end_name(tag);
        let frame = self
            .stack
            .pop()
            .ok_or(RenderError::UnexpectedEnd(found))?;
        let expected = frame.kind.name();
        if expected != found {
            return Err(RenderError::UnbalancedEvents { expected, found });
        }

        let children = frame.children;
        match frame.kind {
            FrameKind::Paragraph => self.push(Node::Paragraph(children)),
            FrameKind::Heading(level) => self.push(Node::Heading { level, children }),
            FrameKind::Blockquote => self.push(Node::Blockquote(children)),
            FrameKind::CodeBlock(language) => {
                let content = plain_text(&children);
                self.push(Node::CodeBlock { language, content });
            }
            FrameKind::List(start) => self.push(Node::List {
                start,
                items: children,
            }),
            FrameKind::Item => self.push(Node::ListItem {
                task: frame.task,
                children,
            }),
            FrameKind::Emphasis => self.push(Node::Emphasis(children)),
            FrameKind::Strong => self.push(Node::Strong(children)),
            FrameKind::Strikethrough => self.push(Node::Strikethrough(children)),
            FrameKind::Link { href, title } => self.push(Node::Link {
                href,
                title,
                children,
            }),
            FrameKind::Image { src, title } => self.push(Node::Image {
                src,
                alt: plain_text(&children),
                title,
            }),
            FrameKind::HtmlBlock => {
                let mut text = plain_text(&children);
                text.truncate(text.trim_end().len());
                if !text.is_empty() {
                    self.push(Node::Paragraph(vec![Node::Text(text)]));
                }
            }
            FrameKind::Transparent => {
                for child in children {
                    self.push(child);
                }
            }
            FrameKind::TableCell => {
                if let Some(table) = self.tables.last_mut() {
                    table.row.push(children);
                }
            }
            FrameKind::TableHead => {
                if let Some(table) = self.tables.last_mut() {
                    table.head = std::mem::take(&mut table.row);
                }
            }
            FrameKind::TableRow => {
                if let Some(table) = self.tables.last_mut() {
                    let row = std::mem::take(&mut table.row);
                    table.rows.push(row);
                }
            }
            FrameKind::Table => {
                let table = self.tables.pop().unwrap_or_default();
                self.push(Node::Table {
                    head: table.head,
                    rows: table.rows,
                });
            }
        }
        Ok(())
    }

    /// Append text, merging with a preceding text node.
    fn push_text(&mut self, text: &str) {
        let siblings = self.current_children();
        if let Some(Node::Text(last)) = siblings.last_mut() {
            last.push_str(text);
        } else {
            siblings.push(Node::Text(text.to_owned()));
        }
    }

    fn push(&mut self, node: Node) {
        if let Node::Text(text) = node {
            self.push_text(&text);
        } else {
            self.current_children().push(node);
        }
    }

    fn current_children(&mut self) -> &mut Vec<Node> {
        match self.stack.last_mut() {
            Some(frame) => &mut frame.children,
            None => &mut self.root,
        }
    }

    fn finish(self) -> Result<Vec<Node>, RenderError> {
        if self.stack.is_empty() {
            Ok(self.root)
        } else {
            Err(RenderError::UnclosedBlocks(self.stack.len()))
        }
    }
}
