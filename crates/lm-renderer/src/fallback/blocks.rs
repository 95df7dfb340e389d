//! Line-oriented block rules and paragraph wrapping.
//!
//! Every rule emits each block on a single line starting with its tag, which
//! is what [`wrap_paragraphs`] relies on to leave blocks unwrapped. Lists and
//! quotes group contiguous lines only; a blank line ends a group.

use std::fmt::Write as _;
use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::tokens::TokenTable;
use crate::extension::{TABLE_CLASSES, TASK_ITEM_CLASS, TASK_LIST_CLASS, TD_CLASSES, TH_CLASSES};
use crate::util::class_list;

static HEADING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^(#{1,6})[ \t]+(.+?)(?:[ \t]+#+)?[ \t]*$").expect("invalid heading regex")
});

static THEMATIC_BREAK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(?:(?:-[ \t]*){3,}|(?:\*[ \t]*){3,})$")
        .expect("invalid thematic break regex")
});

/// Delimiter row cells such as `---`, `:--` or `:-:`; must also contain `|`.
static TABLE_DELIMITER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*\|?[ \t]*:?-+:?[ \t]*(?:\|[ \t]*:?-+:?[ \t]*)*\|?[ \t]*$")
        .expect("invalid table delimiter regex")
});

static BLOCKQUOTE_LINE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*&gt;[ \t]?(.*)$").expect("invalid blockquote regex"));

static UNORDERED_ITEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[ \t]*[-*][ \t]+(.*)$").expect("invalid list item regex"));

static ORDERED_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[ \t]*([0-9]{1,9})[.)][ \t]+(.*)$").expect("invalid list item regex")
});

static TASK_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[([ xX])\][ \t]+").expect("invalid task marker regex"));

static PARAGRAPH_BREAK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\n[ \t]*\n").expect("invalid paragraph break regex"));

static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:<(?:h[1-6]|hr|ul|ol|blockquote|pre|table)[\s>]|\x00@@CODE_BLOCK_[0-9]+@@\x00)")
        .expect("invalid block start regex")
});

/// `# Title` through `###### Title`, with an optional closing sequence.
pub(super) fn headings(text: &str, _tokens: &mut TokenTable) -> String {
    HEADING
        .replace_all(text, |caps: &Captures<'_>| {
            let level = caps[1].len();
            format!("<h{level}>{}</h{level}>", &caps[2])
        })
        .into_owned()
}

/// Three or more `-` or `*` alone on a line. Runs before lists, which would
/// otherwise read `- - -` as an item.
pub(super) fn thematic_breaks(text: &str, _tokens: &mut TokenTable) -> String {
    THEMATIC_BREAK.replace_all(text, "<hr>").into_owned()
}

fn is_table_row(line: &str) -> bool {
    let trimmed = line.trim();
    !trimmed.is_empty() && trimmed.contains('|')
}

fn split_cells(line: &str) -> Vec<&str> {
    let trimmed = line.trim();
    let trimmed = trimmed.strip_prefix('|').unwrap_or(trimmed);
    let trimmed = trimmed.strip_suffix('|').unwrap_or(trimmed);
    trimmed.split('|').map(str::trim).collect()
}

fn render_table(head: &[&str], rows: &[Vec<&str>]) -> String {
    let th = class_list(TH_CLASSES);
    let td = class_list(TD_CLASSES);
    let mut html = format!(
        "<table class=\"{}\"><thead><tr>",
        class_list(TABLE_CLASSES)
    );
    for cell in head {
        write!(html, "<th class=\"{th}\">{cell}</th>").unwrap();
    }
    html.push_str("</tr></thead>");
    if !rows.is_empty() {
        html.push_str("<tbody>");
        for row in rows {
            html.push_str("<tr>");
            // Rows are padded to the header width.
            for index in 0..head.len() {
                let cell = row.get(index).copied().unwrap_or_default();
                write!(html, "<td class=\"{td}\">{cell}</td>").unwrap();
            }
            html.push_str("</tr>");
        }
        html.push_str("</tbody>");
    }
    html.push_str("</table>");
    html
}

/// GFM pipe tables: header row, delimiter row, then body rows containing `|`.
///
/// Cells past the header width are dropped along with any tokens they hold.
pub(super) fn tables(text: &str, tokens: &mut TokenTable) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = Vec::with_capacity(lines.len());
    let mut i = 0;
    while i < lines.len() {
        let is_table = i + 1 < lines.len()
            && is_table_row(lines[i])
            && lines[i + 1].contains('|')
            && TABLE_DELIMITER.is_match(lines[i + 1])
            && split_cells(lines[i]).len() == split_cells(lines[i + 1]).len();
        if !is_table {
            out.push(lines[i].to_owned());
            i += 1;
            continue;
        }
        let head = split_cells(lines[i]);
        let mut end = i + 2;
        while end < lines.len() && is_table_row(lines[end]) {
            end += 1;
        }
        let mut rows = Vec::with_capacity(end - i - 2);
        for line in &lines[i + 2..end] {
            let mut cells = split_cells(line);
            if cells.len() > head.len() {
                for cell in cells.drain(head.len()..) {
                    tokens.discard(cell);
                }
            }
            rows.push(cells);
        }
        out.push(render_table(&head, &rows));
        i = end;
    }
    out.join("\n")
}

/// Rewrite each run of contiguous lines matching `pattern` with `render`.
fn rewrite_line_groups<'t>(
    text: &'t str,
    pattern: &Regex,
    render: impl Fn(&[Captures<'t>]) -> String,
) -> String {
    let mut out = Vec::new();
    let mut group = Vec::new();
    for line in text.split('\n') {
        if let Some(caps) = pattern.captures(line) {
            group.push(caps);
            continue;
        }
        if !group.is_empty() {
            out.push(render(&group));
            group.clear();
        }
        out.push(line.to_owned());
    }
    if !group.is_empty() {
        out.push(render(&group));
    }
    out.join("\n")
}

/// Contiguous `>` lines (escaped as `&gt;`) become one blockquote.
pub(super) fn blockquotes(text: &str, _tokens: &mut TokenTable) -> String {
    rewrite_line_groups(text, &BLOCKQUOTE_LINE, |lines| {
        let body: Vec<&str> = lines
            .iter()
            .filter_map(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end())
            .collect();
        format!("<blockquote>{}</blockquote>", body.join("<br>"))
    })
}

fn render_item(content: &str) -> (String, bool) {
    let Some(caps) = TASK_MARKER.captures(content) else {
        return (format!("<li>{content}</li>"), false);
    };
    let checked = if &caps[1] == " " { "" } else { " checked=\"\"" };
    let rest = &content[caps[0].len()..];
    (
        format!(
            "<li class=\"{TASK_ITEM_CLASS}\"><input type=\"checkbox\"{checked} disabled=\"\"> {rest}</li>"
        ),
        true,
    )
}

fn render_list(open: &str, close: &str, items: impl Iterator<Item = String>) -> String {
    let mut has_tasks = false;
    let body: String = items
        .map(|item| {
            let (html, task) = render_item(&item);
            has_tasks |= task;
            html
        })
        .collect();
    let class = if has_tasks {
        format!(" class=\"{TASK_LIST_CLASS}\"")
    } else {
        String::new()
    };
    format!("<{open}{class}>{body}</{close}>")
}

/// Contiguous `-`/`*` item lines become one `<ul>`; `[ ]`/`[x]` make tasks.
pub(super) fn unordered_lists(text: &str, _tokens: &mut TokenTable) -> String {
    rewrite_line_groups(text, &UNORDERED_ITEM, |lines| {
        render_list("ul", "ul", lines.iter().map(|caps| caps[1].trim_end().to_owned()))
    })
}

/// Contiguous `N.`/`N)` item lines become one `<ol>`, numbered from the
/// first item.
pub(super) fn ordered_lists(text: &str, _tokens: &mut TokenTable) -> String {
    rewrite_line_groups(text, &ORDERED_ITEM, |lines| {
        let start = lines
            .first()
            .and_then(|caps| caps[1].parse::<u32>().ok())
            .unwrap_or(1);
        let open = if start == 1 {
            "ol".to_owned()
        } else {
            format!("ol start=\"{start}\"")
        };
        render_list(&open, "ol", lines.iter().map(|caps| caps[2].trim_end().to_owned()))
    })
}

/// Wrap blank-line separated segments in `<p>`, joining lines with `<br>`.
///
/// Segments starting with a block tag or a code block token are emitted
/// unchanged, including any text lines that follow the block.
pub(super) fn wrap_paragraphs(text: &str, _tokens: &mut TokenTable) -> String {
    PARAGRAPH_BREAK
        .split(text)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| {
            if BLOCK_START.is_match(segment) {
                segment.to_owned()
            } else {
                let lines: Vec<&str> = segment.lines().map(str::trim).collect();
                format!("<p>{}</p>", lines.join("<br>"))
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::fallback::tokens::TokenKind;

    fn run(rule: fn(&str, &mut TokenTable) -> String, text: &str) -> String {
        rule(text, &mut TokenTable::default())
    }

    #[test]
    fn test_headings() {
        assert_eq!(run(headings, "# One"), "<h1>One</h1>");
        assert_eq!(run(headings, "### Three ###"), "<h3>Three</h3>");
        assert_eq!(run(headings, "## C#"), "<h2>C#</h2>");
        assert_eq!(run(headings, "####### seven"), "####### seven");
        assert_eq!(run(headings, "#nospace"), "#nospace");
    }

    #[test]
    fn test_thematic_breaks() {
        assert_eq!(run(thematic_breaks, "a\n---\n* * *\nb"), "a\n<hr>\n<hr>\nb");
        assert_eq!(run(thematic_breaks, "--"), "--");
    }

    #[test]
    fn test_table() {
        assert_eq!(
            run(tables, "| A | B |\n|---|:--:|\n| 1 | &lt;b&gt; |\n| 3 |\n\nafter"),
            concat!(
                r#"<table class="w-full border-collapse text-sm"><thead><tr>"#,
                r#"<th class="border px-3 py-2 text-left font-semibold">A</th>"#,
                r#"<th class="border px-3 py-2 text-left font-semibold">B</th>"#,
                "</tr></thead><tbody>",
                r#"<tr><td class="border px-3 py-2">1</td><td class="border px-3 py-2">&lt;b&gt;</td></tr>"#,
                r#"<tr><td class="border px-3 py-2">3</td><td class="border px-3 py-2"></td></tr>"#,
                "</tbody></table>\n\nafter"
            )
        );
    }

    #[test]
    fn test_table_needs_matching_delimiter() {
        let text = "| A | B |\n|---|";
        assert_eq!(run(tables, text), text);
        assert_eq!(run(tables, "a | b\nplain"), "a | b\nplain");
    }

    #[test]
    fn test_table_drops_extra_cells_and_their_tokens() {
        let mut tokens = TokenTable::default();
        let code = tokens.insert(TokenKind::CodeSpan, "y");
        let html = tables(&format!("| A |\n|---|\n| x | {code} |"), &mut tokens);
        assert_eq!(
            html,
            concat!(
                r#"<table class="w-full border-collapse text-sm"><thead><tr>"#,
                r#"<th class="border px-3 py-2 text-left font-semibold">A</th>"#,
                r#"</tr></thead><tbody><tr><td class="border px-3 py-2">x</td></tr></tbody></table>"#
            )
        );
        assert_eq!(tokens.finish(&html), html);
    }

    #[test]
    fn test_blockquotes() {
        assert_eq!(
            run(blockquotes, "&gt; one\n&gt;two\ntext"),
            "<blockquote>one<br>two</blockquote>\ntext"
        );
    }

    #[test]
    fn test_unordered_list() {
        assert_eq!(
            run(unordered_lists, "- a\n* b\n\n- c"),
            "<ul><li>a</li><li>b</li></ul>\n\n<ul><li>c</li></ul>"
        );
    }

    #[test]
    fn test_task_list() {
        assert_eq!(
            run(unordered_lists, "- [x] done\n- [ ] todo"),
            concat!(
                r#"<ul class="contains-task-list">"#,
                r#"<li class="task-list-item"><input type="checkbox" checked="" disabled=""> done</li>"#,
                r#"<li class="task-list-item"><input type="checkbox" disabled=""> todo</li>"#,
                "</ul>"
            )
        );
    }

    #[test]
    fn test_ordered_list() {
        assert_eq!(
            run(ordered_lists, "1. a\n2) b"),
            "<ol><li>a</li><li>b</li></ol>"
        );
        assert_eq!(run(ordered_lists, "3. c"), "<ol start=\"3\"><li>c</li></ol>");
    }

    #[test]
    fn test_wrap_paragraphs() {
        assert_eq!(
            run(wrap_paragraphs, "\n\none\ntwo\n  \n<h1>T</h1>\n\n\0@@CODE_BLOCK_0@@\0\n\n"),
            "<p>one<br>two</p>\n<h1>T</h1>\n\0@@CODE_BLOCK_0@@\0"
        );
    }

    #[test]
    fn test_wrap_keeps_inline_tags_in_paragraph() {
        assert_eq!(
            run(wrap_paragraphs, "<strong>a</strong> b"),
            "<p><strong>a</strong> b</p>"
        );
    }
}
