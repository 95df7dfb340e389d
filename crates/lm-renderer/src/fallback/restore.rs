//! Restore pass and final backtick sweep.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::tokens::{TokenKind, TokenTable};
use crate::escape::escape_html;
use crate::extension::{INLINE_CODE_CLASSES, blank_element};
use crate::serializer::serialize;
use crate::tree::Node;
use crate::util::class_list;

/// Any tag in the rendered output. Text never holds a raw `<` and attribute
/// values never hold a raw `>`, so this finds exactly the generated tags.
static TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<[^>]*>").expect("invalid tag regex"));

static CODE_OPEN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^<(?:code|pre)[\s>]").expect("invalid code tag regex"));

static CODE_CLOSE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^</(?:code|pre)>").expect("invalid code tag regex"));

/// Double-backtick span (may hold single backticks) or single-backtick span.
/// Alternation is leftmost-first, so a double span wins at the same offset.
static BACKTICK_SPAN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"``((?:[^`]|`[^`])+?)``|`([^`]+)`").expect("invalid backtick regex")
});

fn inline_code(escaped: &str) -> String {
    format!(
        "<code class=\"{}\">{escaped}</code>",
        class_list(INLINE_CODE_CLASSES)
    )
}

/// Swap every token for its final markup: frozen tags, code blocks, code
/// spans (escaped here), then blank chips.
///
/// Post: no token remains in the text.
pub(super) fn restore(text: &str, tokens: &mut TokenTable) -> String {
    let text = tokens.restore(text, TokenKind::Markup, str::to_owned);
    let text = tokens.restore(&text, TokenKind::CodeBlock, str::to_owned);
    let text = tokens.restore(&text, TokenKind::CodeSpan, |raw| {
        inline_code(&escape_html(raw))
    });
    let text = tokens.restore(&text, TokenKind::Blank, |number| {
        serialize(&[Node::from(blank_element(number))])
    });
    tokens.finish(&text)
}

/// Turn backtick pairs that survived into inline code, double before single.
///
/// Only text outside `<code>` and `<pre>` is touched. The text is already
/// escaped, so the span content is used as is.
pub(super) fn sweep_backticks(text: &str, _tokens: &mut TokenTable) -> String {
    if !text.contains('`') {
        return text.to_owned();
    }
    let mut out = String::with_capacity(text.len());
    let mut code_depth = 0usize;
    let mut last = 0;
    for tag in TAG.find_iter(text) {
        sweep_segment(&text[last..tag.start()], code_depth, &mut out);
        if CODE_OPEN.is_match(tag.as_str()) {
            code_depth += 1;
        } else if CODE_CLOSE.is_match(tag.as_str()) {
            code_depth = code_depth.saturating_sub(1);
        }
        out.push_str(tag.as_str());
        last = tag.end();
    }
    sweep_segment(&text[last..], code_depth, &mut out);
    out
}

fn sweep_segment(segment: &str, code_depth: usize, out: &mut String) {
    if code_depth > 0 || !segment.contains('`') {
        out.push_str(segment);
        return;
    }
    let segment = BACKTICK_SPAN.replace_all(segment, |caps: &Captures<'_>| {
        caps.get(1)
            .or_else(|| caps.get(2))
            .map_or_else(String::new, |inner| inline_code(inner.as_str()))
    });
    out.push_str(&segment);
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const CODE: &str = r#"<code class="rounded bg-muted px-1 py-0.5 font-mono text-sm">"#;

    #[test]
    fn test_restore_order() {
        let mut tokens = TokenTable::default();
        let block = tokens.insert(TokenKind::CodeBlock, "<pre><code>x</code></pre>");
        let span = tokens.insert(TokenKind::CodeSpan, "a<b");
        let blank = tokens.insert(TokenKind::Blank, "3");
        let open = tokens.insert(TokenKind::Markup, "<a href=\"https://a.com\">");
        let text = format!("{block}\n<p>{span} {blank} {open}x</a></p>");
        assert_eq!(
            restore(&text, &mut tokens),
            format!(
                concat!(
                    "<pre><code>x</code></pre>\n<p>{code}a&lt;b</code> ",
                    r#"<span class="blank-chip rounded bg-amber-100 px-1 font-semibold text-amber-900" title="{{{{問3}}}}">{{{{問3}}}}</span> "#,
                    r#"<a href="https://a.com">x</a></p>"#
                ),
                code = CODE
            )
        );
    }

    #[test]
    fn test_sweep_converts_surviving_backticks() {
        let mut tokens = TokenTable::default();
        assert_eq!(
            sweep_backticks("<p>`a` and ``b`c``</p>", &mut tokens),
            format!("<p>{CODE}a</code> and {CODE}b`c</code></p>")
        );
    }

    #[test]
    fn test_sweep_skips_code() {
        let mut tokens = TokenTable::default();
        let html = "<pre><code>`a`</code></pre><p>`b`</p>";
        assert_eq!(
            sweep_backticks(html, &mut tokens),
            format!("<pre><code>`a`</code></pre><p>{CODE}b</code></p>")
        );
    }

    #[test]
    fn test_sweep_never_spans_tags() {
        let mut tokens = TokenTable::default();
        assert_eq!(
            sweep_backticks("<p>`a<br>b`</p>", &mut tokens),
            "<p>`a<br>b`</p>"
        );
    }
}
