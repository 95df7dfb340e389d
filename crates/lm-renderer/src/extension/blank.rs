//! Fill-in-the-blank placeholder highlighting.
//!
//! Test prompts mark answer slots as `{{ 問3 }}`. Only that exact shape is a
//! placeholder; other double-brace text stays literal.

use std::sync::LazyLock;

use regex::Regex;

use super::{BLANK_CLASSES, rewrite_text, split_matches};
use crate::tree::{Element, Node};
use crate::util::class_list;

/// `{{ 問N }}` with a positive number and optional whitespace between tokens.
pub(crate) static BLANK_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\{\{\s*問\s*(0*[1-9][0-9]*)\s*\}\}").expect("invalid blank placeholder regex")
});

/// Canonical visible form of a placeholder, e.g. `{{問7}}`.
pub(crate) fn blank_label(number: &str) -> String {
    format!("{{{{問{number}}}}}")
}

/// Highlighted chip for a placeholder number.
pub(crate) fn blank_element(number: &str) -> Element {
    let label = blank_label(number);
    Element::new("span")
        .with_attr("class", class_list(BLANK_CLASSES))
        .with_attr("title", label.clone())
        .with_child(Node::text(label))
}

fn is_chip(element: &Element) -> bool {
    element.tag == "span" && element.has_class(BLANK_CLASSES[0])
}

/// Turn placeholder text outside code into chips.
pub(crate) fn highlight_blanks(nodes: &mut Vec<Node>) {
    rewrite_text(
        nodes,
        &|el: &Element| matches!(el.tag.as_str(), "code" | "pre") || is_chip(el),
        &|text: &str, _| {
            split_matches(text, &BLANK_PATTERN, |caps| {
                caps.get(1).map(|n| blank_element(n.as_str()).into())
            })
        },
    );
}
