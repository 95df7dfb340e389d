//! Protect passes: move code and placeholders out of reach of text rules.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::tokens::{TokenKind, TokenTable};
use crate::escape::escape_html;
use crate::extension::BLANK_PATTERN;

/// Double-backtick code span, single line.
static DOUBLE_BACKTICK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"``([^\n]+?)``").expect("invalid code span regex"));

/// Single-backtick code span, single line.
static SINGLE_BACKTICK_SPAN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"`([^`\n]+)`").expect("invalid code span regex"));

/// Opening code fence: three or more backticks and an optional info string.
#[derive(Debug)]
struct Fence<'a> {
    len: usize,
    language: Option<&'a str>,
}

impl<'a> Fence<'a> {
    fn open(line: &'a str) -> Option<Self> {
        let trimmed = line.trim_start();
        let len = trimmed.chars().take_while(|&c| c == '`').count();
        if len < 3 {
            return None;
        }
        let info = trimmed[len..].trim();
        if info.contains('`') {
            return None;
        }
        Some(Self {
            len,
            language: info.split_whitespace().next(),
        })
    }

    /// A closing fence uses at least as many backticks and nothing else.
    fn closes(&self, line: &str) -> bool {
        let trimmed = line.trim();
        let count = trimmed.chars().take_while(|&c| c == '`').count();
        count >= self.len && count == trimmed.len()
    }
}

fn render_code_block(language: Option<&str>, content: &str) -> String {
    match language {
        Some(language) => format!(
            "<pre><code class=\"language-{}\">{}</code></pre>",
            escape_html(language),
            escape_html(content)
        ),
        None => format!("<pre><code>{}</code></pre>", escape_html(content)),
    }
}

/// Replace fenced code blocks with pre-rendered code block tokens.
///
/// Pre: normalized text. Post: no terminated fence remains; each token sits
/// alone between blank lines. Unterminated fences stay as text.
pub(super) fn protect_fences(text: &str, tokens: &mut TokenTable) -> String {
    let lines: Vec<&str> = text.split('\n').collect();
    let mut out = String::with_capacity(text.len());
    // Shortest fence already known to have no closing line after it; any later
    // fence at least this long cannot be closed either.
    let mut unclosed_len = usize::MAX;
    let mut i = 0;
    while i < lines.len() {
        let closing = Fence::open(lines[i])
            .filter(|fence| fence.len < unclosed_len)
            .and_then(|fence| {
                let close = (i + 1..lines.len()).find(|&j| fence.closes(lines[j]));
                if close.is_none() {
                    unclosed_len = fence.len;
                }
                close.map(|close| (fence, close))
            });
        if let Some((fence, close)) = closing {
            let content = lines[i + 1..close].join("\n");
            let token = tokens.insert(
                TokenKind::CodeBlock,
                render_code_block(fence.language, &content),
            );
            out.push_str("\n\n");
            out.push_str(&token);
            out.push_str("\n\n");
            i = close + 1;
        } else {
            out.push_str(lines[i]);
            out.push('\n');
            i += 1;
        }
    }
    out
}

/// Replace inline code spans with code span tokens holding the raw code.
///
/// Double-backtick spans go first so they may contain single backticks.
/// Post: no complete single-line code span remains.
pub(super) fn protect_code_spans(text: &str, tokens: &mut TokenTable) -> String {
    let text = DOUBLE_BACKTICK_SPAN.replace_all(text, |caps: &Captures<'_>| {
        let inner = &caps[1];
        let inner = inner
            .strip_prefix(' ')
            .and_then(|s| s.strip_suffix(' '))
            .unwrap_or(inner);
        tokens.insert(TokenKind::CodeSpan, inner)
    });
    SINGLE_BACKTICK_SPAN
        .replace_all(&text, |caps: &Captures<'_>| {
            tokens.insert(TokenKind::CodeSpan, &caps[1])
        })
        .into_owned()
}

/// Replace `{{ 問N }}` placeholders with blank tokens holding `N`.
///
/// Pre: code is already protected, so placeholders inside code stay literal.
pub(super) fn protect_blanks(text: &str, tokens: &mut TokenTable) -> String {
    BLANK_PATTERN
        .replace_all(text, |caps: &Captures<'_>| {
            tokens.insert(TokenKind::Blank, &caps[1])
        })
        .into_owned()
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn restore_all(text: &str, tokens: &mut TokenTable) -> String {
        let text = tokens.restore(text, TokenKind::CodeBlock, |v| format!("[block {v}]"));
        let text = tokens.restore(&text, TokenKind::CodeSpan, |v| format!("[span {v}]"));
        tokens.restore(&text, TokenKind::Blank, |v| format!("[blank {v}]"))
    }

    #[test]
    fn test_fence_with_language() {
        let mut tokens = TokenTable::default();
        let text = protect_fences("before\n```js\nlet a = \"<b>\";\n```\nafter", &mut tokens);
        assert_eq!(
            restore_all(&text, &mut tokens),
            "before\n\n\n[block <pre><code class=\"language-js\">let a = &quot;&lt;b&gt;&quot;;</code></pre>]\n\nafter\n"
        );
    }

    #[test]
    fn test_fence_without_language_and_longer_close() {
        let mut tokens = TokenTable::default();
        let text = protect_fences("````\na\n\nb\n`````", &mut tokens);
        assert_eq!(
            restore_all(&text, &mut tokens),
            "\n\n[block <pre><code>a\n\nb</code></pre>]\n\n"
        );
    }

    #[test]
    fn test_unterminated_fence_is_text() {
        let mut tokens = TokenTable::default();
        let text = protect_fences("```js\ncode", &mut tokens);
        assert_eq!(text, "```js\ncode\n");
    }

    #[test]
    fn test_shorter_fence_does_not_close() {
        let mut tokens = TokenTable::default();
        let text = protect_fences("````\n```\nstill code\n````", &mut tokens);
        assert_eq!(
            restore_all(&text, &mut tokens),
            "\n\n[block <pre><code>```\nstill code</code></pre>]\n\n"
        );
    }

    #[test]
    fn test_code_spans() {
        let mut tokens = TokenTable::default();
        let text = protect_code_spans("a `x` b `` y`z `` c", &mut tokens);
        assert_eq!(restore_all(&text, &mut tokens), "a [span x] b [span y`z] c");
    }

    #[test]
    fn test_blank_inside_code_span_stays_literal() {
        let mut tokens = TokenTable::default();
        let text = protect_code_spans("`{{ 問1 }}` {{ 問2 }}", &mut tokens);
        let text = protect_blanks(&text, &mut tokens);
        assert_eq!(restore_all(&text, &mut tokens), "[span {{ 問1 }}] [blank 2]");
    }

    #[test]
    fn test_mustache_is_not_a_blank() {
        let mut tokens = TokenTable::default();
        assert_eq!(
            protect_blanks("{{ notAPlaceholder }}", &mut tokens),
            "{{ notAPlaceholder }}"
        );
    }
}
