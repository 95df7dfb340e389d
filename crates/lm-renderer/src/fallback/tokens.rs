//! Extraction tokens for protect-then-restore.
//!
//! A token stands in for content that later text rules must not touch. It is
//! wrapped in NUL sentinels; input NULs are replaced during normalization, so
//! markdown can never spell a token.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x00@@(CODE_BLOCK|CODE_SPAN|BLANK|MARKUP)_([0-9]+)@@\x00")
        .expect("invalid extraction token regex")
});

/// What a token protects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TokenKind {
    /// Pre-rendered, escaped `<pre><code>` fragment.
    CodeBlock,
    /// Raw inline code, escaped on restore.
    CodeSpan,
    /// Blank placeholder number.
    Blank,
    /// Generated tag carrying user data in attributes.
    Markup,
}

impl TokenKind {
    fn label(self) -> &'static str {
        match self {
            Self::CodeBlock => "CODE_BLOCK",
            Self::CodeSpan => "CODE_SPAN",
            Self::Blank => "BLANK",
            Self::Markup => "MARKUP",
        }
    }

    fn from_label(label: &str) -> Option<Self> {
        match label {
            "CODE_BLOCK" => Some(Self::CodeBlock),
            "CODE_SPAN" => Some(Self::CodeSpan),
            "BLANK" => Some(Self::Blank),
            "MARKUP" => Some(Self::Markup),
            _ => None,
        }
    }
}

#[derive(Debug)]
struct Entry {
    kind: TokenKind,
    value: String,
    consumed: bool,
}

/// Side table mapping token index to protected content.
///
/// Every token is consumed exactly once, by [`TokenTable::restore`] or
/// [`TokenTable::discard`].
#[derive(Debug, Default)]
pub(super) struct TokenTable {
    entries: Vec<Entry>,
}

impl TokenTable {
    /// Store protected content and return its token.
    pub(super) fn insert(&mut self, kind: TokenKind, value: impl Into<String>) -> String {
        let index = self.entries.len();
        self.entries.push(Entry {
            kind,
            value: value.into(),
            consumed: false,
        });
        format!("\0@@{}_{index}@@\0", kind.label())
    }

    /// Replace every token of `kind` with `render(value)`.
    ///
    /// Tokens of other kinds are left in place.
    pub(super) fn restore(
        &mut self,
        text: &str,
        kind: TokenKind,
        render: impl Fn(&str) -> String,
    ) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                if TokenKind::from_label(&caps[1]) != Some(kind) {
                    return caps[0].to_owned();
                }
                let Some(entry) = self.entry_mut(caps) else {
                    tracing::error!(token = %caps[0].escape_debug(), "Unknown extraction token");
                    return String::new();
                };
                if entry.consumed {
                    tracing::error!(token = %caps[0].escape_debug(), "Extraction token restored twice");
                }
                debug_assert!(!entry.consumed, "extraction token restored twice");
                entry.consumed = true;
                render(&entry.value)
            })
            .into_owned()
    }

    /// Mark every token in `text` as consumed without restoring it.
    ///
    /// Used when a rule drops text that may hold tokens.
    pub(super) fn discard(&mut self, text: &str) {
        for caps in TOKEN.captures_iter(text) {
            if let Some(entry) = self.entry_mut(&caps) {
                entry.consumed = true;
            }
        }
    }

    /// Expand tokens of `kind` in `text` without consuming them.
    pub(super) fn peek(&self, text: &str, kind: TokenKind) -> String {
        TOKEN
            .replace_all(text, |caps: &Captures<'_>| {
                locate(caps)
                    .filter(|&(found, _)| found == kind)
                    .and_then(|(_, index)| self.entries.get(index))
                    .filter(|entry| entry.kind == kind)
                    .map_or_else(|| caps[0].to_owned(), |entry| entry.value.clone())
            })
            .into_owned()
    }

    fn entry_mut(&mut self, caps: &Captures<'_>) -> Option<&mut Entry> {
        let (kind, index) = locate(caps)?;
        self.entries.get_mut(index).filter(|entry| entry.kind == kind)
    }

    /// Report tokens that were never restored and strip any left in `text`.
    pub(super) fn finish(&self, text: &str) -> String {
        for (index, entry) in self.entries.iter().enumerate() {
            if !entry.consumed {
                tracing::error!(kind = entry.kind.label(), index, "Extraction token never restored");
            }
        }
        debug_assert!(
            self.entries.iter().all(|entry| entry.consumed),
            "extraction tokens left unrestored"
        );
        TOKEN.replace_all(text, "").into_owned()
    }
}

/// Kind and index named by a matched token.
fn locate(caps: &Captures<'_>) -> Option<(TokenKind, usize)> {
    let kind = TokenKind::from_label(&caps[1])?;
    let index = caps[2].parse().ok()?;
    Some((kind, index))
}
