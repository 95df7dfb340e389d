//! Extension passes over the lowered HTML tree.
//!
//! Each pass rewrites the tree in place and only introduces tags and
//! attributes that [`SchemaExtension::rendering`](crate::SchemaExtension::rendering)
//! admits, so the tree stays valid for the rendering schema. The class lists
//! and detection helpers here are shared with the fallback pipeline so both
//! pipelines style content the same way.

mod blank;
mod code;
mod link;
mod table;
mod video;

use regex::{Captures, Regex};

use crate::tree::{Element, Node};

pub(crate) use blank::{BLANK_PATTERN, blank_element};
pub(crate) use video::{video_element, video_mime};

/// Classes on `<code>` outside `<pre>`.
pub(crate) const INLINE_CODE_CLASSES: &[&str] =
    &["rounded", "bg-muted", "px-1", "py-0.5", "font-mono", "text-sm"];

/// Classes on `<table>`.
pub(crate) const TABLE_CLASSES: &[&str] = &["w-full", "border-collapse", "text-sm"];

/// Classes on `<th>`.
pub(crate) const TH_CLASSES: &[&str] = &["border", "px-3", "py-2", "text-left", "font-semibold"];

/// Classes on `<td>`.
pub(crate) const TD_CLASSES: &[&str] = &["border", "px-3", "py-2"];

/// Classes on fill-in-the-blank chips. The first class marks a chip.
pub(crate) const BLANK_CLASSES: &[&str] = &[
    "blank-chip",
    "rounded",
    "bg-amber-100",
    "px-1",
    "font-semibold",
    "text-amber-900",
];

/// Classes on embedded `<video>` players.
pub(crate) const VIDEO_CLASSES: &[&str] = &["w-full", "rounded", "my-4"];

/// Class on list items with a checkbox.
pub(crate) const TASK_ITEM_CLASS: &str = "task-list-item";

/// Class on lists that contain task items.
pub(crate) const TASK_LIST_CLASS: &str = "contains-task-list";

/// Tree rewrite run before serialization.
type Pass = fn(&mut Vec<Node>);

/// Passes in execution order.
///
/// Videos run before link hardening so video anchors are replaced rather
/// than hardened. Blanks run last so chips never land inside generated
/// markup.
const PASSES: &[(&str, Pass)] = &[
    ("video", video::rewrite_videos),
    ("link", link::harden_links),
    ("inline-code", code::style_inline_code),
    ("table", table::style_tables),
    ("blank", blank::highlight_blanks),
];

/// Run every extension pass over the tree.
pub(crate) fn run(nodes: &mut Vec<Node>) {
    for (name, pass) in PASSES {
        tracing::trace!(pass = name, "Running extension pass");
        pass(nodes);
    }
}

/// Position of a text node relative to line breaks in its parent.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LineEdges {
    /// Text starts a line (first child or preceded by `<br>`).
    pub(crate) starts_line: bool,
    /// Text ends a line (last child or followed by `<br>`).
    pub(crate) ends_line: bool,
}

/// Replace text nodes with the nodes `rewrite` returns.
///
/// Elements for which `skip` holds are not descended into. Replacement nodes
/// are not revisited.
pub(crate) fn rewrite_text(
    nodes: &mut Vec<Node>,
    skip: &dyn Fn(&Element) -> bool,
    rewrite: &dyn Fn(&str, LineEdges) -> Option<Vec<Node>>,
) {
    let mut i = 0;
    while i < nodes.len() {
        let edges = LineEdges {
            starts_line: i == 0 || is_break(&nodes[i - 1]),
            ends_line: i + 1 == nodes.len() || is_break(&nodes[i + 1]),
        };
        let replacement = match &mut nodes[i] {
            Node::Element(element) => {
                if !skip(element) {
                    rewrite_text(&mut element.children, skip, rewrite);
                }
                None
            }
            Node::Text(text) => rewrite(text, edges),
        };
        match replacement {
            Some(replacement) => {
                let count = replacement.len();
                nodes.splice(i..=i, replacement);
                i += count;
            }
            None => i += 1,
        }
    }
}

fn is_break(node: &Node) -> bool {
    node.as_element("br").is_some()
}

/// Split text around regex matches, turning each accepted match into a node.
///
/// Returns `None` when `make` accepted no match, leaving the text untouched.
pub(crate) fn split_matches(
    text: &str,
    pattern: &Regex,
    make: impl Fn(&Captures<'_>) -> Option<Node>,
) -> Option<Vec<Node>> {
    let mut out = Vec::new();
    let mut last = 0;
    for caps in pattern.captures_iter(text) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let Some(node) = make(&caps) else {
            continue;
        };
        if whole.start() > last {
            out.push(Node::text(&text[last..whole.start()]));
        }
        out.push(node);
        last = whole.end();
    }
    if out.is_empty() {
        return None;
    }
    if last < text.len() {
        out.push(Node::text(&text[last..]));
    }
    Some(out)
}

/// Visit every element depth-first, parents before children.
pub(crate) fn for_each_element(nodes: &mut [Node], f: &mut dyn FnMut(&mut Element, &[String])) {
    let mut ancestors = Vec::new();
    visit(nodes, f, &mut ancestors);
}

fn visit(
    nodes: &mut [Node],
    f: &mut dyn FnMut(&mut Element, &[String]),
    ancestors: &mut Vec<String>,
) {
    for node in nodes {
        if let Node::Element(element) = node {
            f(element, ancestors);
            ancestors.push(element.tag.clone());
            visit(&mut element.children, f, ancestors);
            ancestors.pop();
        }
    }
}
