//! Lowering of the markdown AST to the HTML tree.
//!
//! One AST node maps to one element (plus the table and task-list scaffolding
//! GFM needs). Links only stay live for `http(s)` targets and images only
//! for usable sources; everything else keeps its text.

use crate::ast;
use crate::extension::{TASK_ITEM_CLASS, TASK_LIST_CLASS};
use crate::tree::{Element, Node};
use crate::url;

/// Lower AST nodes to HTML tree nodes.
#[must_use]
pub fn lower(nodes: &[ast::Node]) -> Vec<Node> {
    let mut out = Vec::with_capacity(nodes.len());
    for node in nodes {
        lower_into(node, &mut out);
    }
    out
}

fn lower_into(node: &ast::Node, out: &mut Vec<Node>) {
    let element = match node {
        ast::Node::Text(text) => return push_text(out, text),
        ast::Node::SoftBreak => return push_text(out, "\n"),
        ast::Node::HardBreak => Element::new("br"),
        ast::Node::ThematicBreak => Element::new("hr"),
        ast::Node::Emphasis(children) => Element::new("em").with_children(lower(children)),
        ast::Node::Strong(children) => Element::new("strong").with_children(lower(children)),
        ast::Node::Strikethrough(children) => Element::new("del").with_children(lower(children)),
        ast::Node::Paragraph(children) => Element::new("p").with_children(lower(children)),
        ast::Node::Blockquote(children) => {
            Element::new("blockquote").with_children(lower(children))
        }
        ast::Node::Heading { level, children } => {
            Element::new(format!("h{level}")).with_children(lower(children))
        }
        ast::Node::CodeSpan(code) => Element::new("code").with_child(Node::text(code)),
        ast::Node::CodeBlock { language, content } => {
            let mut code = Element::new("code");
            if let Some(language) = language {
                code.set_attr("class", format!("language-{language}"));
            }
            Element::new("pre").with_child(code.with_child(Node::text(content)))
        }
        ast::Node::List { start, items } => lower_list(*start, items),
        ast::Node::ListItem { task, children } => lower_item(*task, children),
        ast::Node::Link {
            href,
            title,
            children,
        } => {
            if !url::is_http_url(href) {
                for child in children {
                    lower_into(child, out);
                }
                return;
            }
            let mut a = Element::new("a").with_attr("href", href);
            if !title.is_empty() {
                a.set_attr("title", title);
            }
            a.with_children(lower(children))
        }
        ast::Node::Image { src, alt, title } => {
            if !url::is_media_url(src) {
                return push_text(out, alt);
            }
            let mut img = Element::new("img")
                .with_attr("src", src)
                .with_attr("alt", alt);
            if !title.is_empty() {
                img.set_attr("title", title);
            }
            img
        }
        ast::Node::Table { head, rows } => lower_table(head, rows),
    };
    out.push(element.into());
}

fn lower_list(start: Option<u64>, items: &[ast::Node]) -> Element {
    let mut list = match start {
        Some(start) => {
            let mut ol = Element::new("ol");
            if start != 1 {
                ol.set_attr("start", start.to_string());
            }
            ol
        }
        None => Element::new("ul"),
    };
    let has_tasks = items
        .iter()
        .any(|item| matches!(item, ast::Node::ListItem { task: Some(_), .. }));
    if has_tasks {
        list.set_attr("class", TASK_LIST_CLASS);
    }
    list.with_children(lower(items))
}

fn lower_item(task: Option<bool>, children: &[ast::Node]) -> Element {
    let Some(checked) = task else {
        return Element::new("li").with_children(lower(children));
    };
    let mut checkbox = Element::new("input").with_attr("type", "checkbox");
    if checked {
        checkbox.set_attr("checked", "");
    }
    checkbox.set_attr("disabled", "");

    let mut content = vec![Node::from(checkbox), Node::text(" ")];
    content.extend(lower(children));
    Element::new("li")
        .with_attr("class", TASK_ITEM_CLASS)
        .with_children(content)
}

fn lower_table(head: &[Vec<ast::Node>], rows: &[Vec<Vec<ast::Node>>]) -> Element {
    let row = |cells: &[Vec<ast::Node>], tag: &str| {
        cells.iter().fold(Element::new("tr"), |tr, cell| {
            tr.with_child(Element::new(tag).with_children(lower(cell)))
        })
    };

    let mut table =
        Element::new("table").with_child(Element::new("thead").with_child(row(head, "th")));
    if !rows.is_empty() {
        let body = rows
            .iter()
            .fold(Element::new("tbody"), |tbody, cells| {
                tbody.with_child(row(cells, "td"))
            });
        table = table.with_child(body);
    }
    table
}

/// Append text, merging with a preceding text node.
fn push_text(out: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(last)) = out.last_mut() {
        last.push_str(text);
    } else {
        out.push(Node::text(text));
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::serializer::serialize;

    fn lowered(markdown: &str) -> String {
        serialize(&lower(&ast::parse(markdown).unwrap()))
    }

    #[test]
    fn test_inline_formatting() {
        assert_eq!(
            lowered("*a* **b** ~~c~~ `d`"),
            "<p><em>a</em> <strong>b</strong> <del>c</del> <code>d</code></p>"
        );
    }

    #[test]
    fn test_soft_break_merges_into_text() {
        let nodes = lower(&ast::parse("one\ntwo").unwrap());
        assert_eq!(
            nodes,
            vec![Node::from(Element::new("p").with_child(Node::text("one\ntwo")))]
        );
    }

    #[test]
    fn test_hard_break() {
        assert_eq!(lowered("one  \ntwo"), "<p>one<br>two</p>");
    }

    #[test]
    fn test_heading_and_rule() {
        assert_eq!(lowered("## Title\n\n---"), "<h2>Title</h2><hr>");
    }

    #[test]
    fn test_code_block() {
        assert_eq!(
            lowered("```rust\nfn main() {}\n```"),
            "<pre><code class=\"language-rust\">fn main() {}\n</code></pre>"
        );
        assert_eq!(lowered("```\nx\n```"), "<pre><code>x\n</code></pre>");
    }

    #[test]
    fn test_ordered_list_start() {
        assert_eq!(lowered("1. a\n2. b"), "<ol><li>a</li><li>b</li></ol>");
        assert_eq!(lowered("3. c"), "<ol start=\"3\"><li>c</li></ol>");
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            lowered("- [x] done\n- [ ] todo"),
            concat!(
                r#"<ul class="contains-task-list">"#,
                r#"<li class="task-list-item"><input type="checkbox" checked="" disabled=""> done</li>"#,
                r#"<li class="task-list-item"><input type="checkbox" disabled=""> todo</li>"#,
                "</ul>"
            )
        );
    }

    #[test]
    fn test_link_and_image() {
        assert_eq!(
            lowered(r#"[x](https://a.com "T") ![cat](/uploads/cat.png)"#),
            r#"<p><a href="https://a.com" title="T">x</a> <img src="/uploads/cat.png" alt="cat"></p>"#
        );
    }

    #[test]
    fn test_image_with_unusable_source_keeps_alt() {
        assert_eq!(
            lowered("![cat](javascript:alert(1))"),
            "<p>cat</p>"
        );
    }

    #[test]
    fn test_link_without_http_target_keeps_label() {
        assert_eq!(
            lowered("a [*x*](javascript:alert(1)) [y](/relative) b"),
            "<p>a <em>x</em> y b</p>"
        );
    }

    #[test]
    fn test_table() {
        assert_eq!(
            lowered("| A | B |\n|---|---|\n| 1 | <b> |"),
            concat!(
                "<table><thead><tr><th>A</th><th>B</th></tr></thead>",
                "<tbody><tr><td>1</td><td>&lt;b&gt;</td></tr></tbody></table>"
            )
        );
    }

    #[test]
    fn test_table_without_rows() {
        assert_eq!(
            lowered("| A |\n|---|"),
            "<table><thead><tr><th>A</th></tr></thead></table>"
        );
    }

    #[test]
    fn test_raw_html_is_text() {
        assert_eq!(
            lowered("<img src=x onerror=alert(1)>"),
            "<p>&lt;img src=x onerror=alert(1)&gt;</p>"
        );
    }
}
