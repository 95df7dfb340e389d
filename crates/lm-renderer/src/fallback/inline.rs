//! Inline substitution rules: videos, images, links and emphasis.
//!
//! All rules run on escaped text. URLs are decoded before policy checks so
//! the check sees what a browser would. Generated tags that carry user data
//! in attributes are frozen as markup tokens so later rules cannot rewrite
//! inside them.

use std::sync::LazyLock;

use regex::{Captures, Regex};

use super::tokens::{TokenKind, TokenTable};
use crate::escape::unescape_html;
use crate::extension::{video_element, video_mime};
use crate::serializer::{VOID_ELEMENTS, serialize};
use crate::tree::{Element, Node};
use crate::url;

/// Link destination: no whitespace, one level of balanced parentheses.
const DESTINATION: &str = r"((?:[^\s()\x00]|\([^\s()\x00]*\))+)";

/// Optional `"title"` after a destination (quotes already escaped).
const TITLE: &str = r#"(?:[ \t]+&quot;([^\n\x00]*?)&quot;)?"#;

static LINK_WITH_BANG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"(!?)\[([^\]\n]*)\]\({DESTINATION}{TITLE}\)"))
        .expect("invalid video link regex")
});

static IMAGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"!\[([^\]\n\x00]*)\]\({DESTINATION}{TITLE}\)"))
        .expect("invalid image regex")
});

/// Link label may hold tokens (code spans, blanks, frozen images).
static LINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"\[([^\]\n]*)\]\({DESTINATION}{TITLE}\)")).expect("invalid link regex")
});

static AUTOLINK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"&lt;(https?://[^\s\x00]+?)&gt;").expect("invalid autolink regex")
});

static BARE_URL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(https?://[^\s\x00]+)[ \t]*$").expect("invalid bare URL regex")
});

static STRONG: LazyLock<Regex> =
    LazyLock::new(|| delimited(r"\*\*", '*').expect("invalid strong regex"));

static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| delimited(r"\*", '*').expect("invalid emphasis regex"));

static STRIKETHROUGH: LazyLock<Regex> =
    LazyLock::new(|| delimited("~~", '~').expect("invalid strikethrough regex"));

/// Delimiter-wrapped span whose content hugs the delimiters.
///
/// Content may hold escaped text, tokens, `<br>` and the inline tags that
/// links and emphasis leave behind. Any other generated tag ends the span,
/// so emphasis never reaches across table cells or block elements.
fn delimited(delimiter: &str, marker: char) -> Result<Regex, regex::Error> {
    let tags = "</?(?:strong|em|del)>|</a>";
    let edge = format!(r"(?:[^{marker}\s<>]|{tags})");
    let inner = format!(r"(?:[^{marker}\n<>]|{tags}|<br>)");
    Regex::new(&format!(r"{delimiter}({edge}(?:{inner}*{edge})?){delimiter}"))
}

/// Video player markup for an escaped URL, if it is an `http(s)` video.
fn video_markup(escaped_url: &str, tokens: &mut TokenTable) -> Option<String> {
    let href = unescape_html(escaped_url);
    let mime = video_mime(&href)?;
    if !url::is_http_url(&href) {
        return None;
    }
    let html = serialize(&[Node::from(video_element(&href, mime))]);
    Some(tokens.insert(TokenKind::Markup, html))
}

/// Replace video links, autolinks and bare URL lines with players.
///
/// Image syntax (`![..](..)`) is left for [`images`].
pub(super) fn videos(text: &str, tokens: &mut TokenTable) -> String {
    let text = LINK_WITH_BANG.replace_all(text, |caps: &Captures<'_>| {
        if caps[1].is_empty()
            && let Some(markup) = video_markup(&caps[3], tokens)
        {
            tokens.discard(&caps[2]);
            return markup;
        }
        caps[0].to_owned()
    });
    let text = AUTOLINK.replace_all(&text, |caps: &Captures<'_>| {
        video_markup(&caps[1], tokens).unwrap_or_else(|| caps[0].to_owned())
    });
    BARE_URL_LINE
        .replace_all(&text, |caps: &Captures<'_>| {
            video_markup(&caps[1], tokens).unwrap_or_else(|| caps[0].to_owned())
        })
        .into_owned()
}

/// Replace `![alt](src "title")` with `<img>`; unusable sources keep the alt
/// text.
pub(super) fn images(text: &str, tokens: &mut TokenTable) -> String {
    IMAGE
        .replace_all(text, |caps: &Captures<'_>| {
            let alt = &caps[1];
            let src = unescape_html(&caps[2]);
            if !url::is_media_url(&src) {
                return alt.to_owned();
            }
            let mut img = Element::new("img")
                .with_attr("src", src)
                .with_attr("alt", unescape_html(alt));
            if let Some(title) = caps.get(3) {
                img.set_attr("title", unescape_html(title.as_str()));
            }
            tokens.insert(TokenKind::Markup, serialize(&[Node::from(img)]))
        })
        .into_owned()
}

/// Replace `[label](href "title")` and `<href>` with hardened anchors.
///
/// Targets other than `http(s)` render the label only.
pub(super) fn links(text: &str, tokens: &mut TokenTable) -> String {
    let text = LINK.replace_all(text, |caps: &Captures<'_>| {
        let label = &caps[1];
        let href = unescape_html(&caps[2]);
        if !url::is_http_url(&href) {
            return label.to_owned();
        }
        let mut open = Element::new("a").with_attr("href", href);
        if let Some(title) = caps.get(3) {
            open.set_attr("title", unescape_html(title.as_str()));
        }
        let open = harden(open);
        format!("{}{label}</a>", tokens.insert(TokenKind::Markup, opening_tag(&open)))
    });
    AUTOLINK
        .replace_all(&text, |caps: &Captures<'_>| {
            let href = unescape_html(&caps[1]);
            let anchor = harden(Element::new("a").with_attr("href", href.clone()))
                .with_child(Node::text(href));
            tokens.insert(TokenKind::Markup, serialize(&[Node::from(anchor)]))
        })
        .into_owned()
}

fn harden(anchor: Element) -> Element {
    anchor
        .with_attr("target", "_blank")
        .with_attr("rel", "noopener noreferrer")
}

/// Opening tag of an element, serialized without its closing tag.
fn opening_tag(element: &Element) -> String {
    let html = serialize(&[Node::from(Element {
        children: Vec::new(),
        ..element.clone()
    })]);
    let closing = format!("</{}>", element.tag);
    html.strip_suffix(&closing).unwrap_or(&html).to_owned()
}

/// Replace `**strong**`, `*emphasis*` and `~~strikethrough~~`, one level
/// deep. Delimiters must hug their content, and the content must keep the
/// links it contains whole.
pub(super) fn emphasis(text: &str, tokens: &mut TokenTable) -> String {
    let tokens = &*tokens;
    let text = wrap_delimited(&STRONG, text, "strong", tokens);
    let text = wrap_delimited(&EMPHASIS, &text, "em", tokens);
    wrap_delimited(&STRIKETHROUGH, &text, "del", tokens)
}

fn wrap_delimited(pattern: &Regex, text: &str, tag: &str, tokens: &TokenTable) -> String {
    pattern
        .replace_all(text, |caps: &Captures<'_>| {
            let content = &caps[1];
            if tags_balanced(&tokens.peek(content, TokenKind::Markup)) {
                format!("<{tag}>{content}</{tag}>")
            } else {
                caps[0].to_owned()
            }
        })
        .into_owned()
}

/// Check that every tag opened in `html` is closed inside it, in order.
fn tags_balanced(html: &str) -> bool {
    let mut open = Vec::new();
    for (index, _) in html.match_indices('<') {
        let tag = &html[index + 1..];
        let end = tag
            .find(|c: char| c == '>' || c.is_ascii_whitespace())
            .unwrap_or(tag.len());
        let name = &tag[..end];
        if let Some(name) = name.strip_prefix('/') {
            if open.pop() != Some(name) {
                return false;
            }
        } else if !VOID_ELEMENTS.contains(&name) {
            open.push(name);
        }
    }
    open.is_empty()
}
