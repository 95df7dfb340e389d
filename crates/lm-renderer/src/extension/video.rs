//! Video link rewriting.
//!
//! Anchors and bare URLs on a line of their own whose path ends in `.mp4` or
//! `.webm` become inline players.

use std::sync::LazyLock;

use regex::Regex;

use super::{LineEdges, VIDEO_CLASSES, rewrite_text, split_matches};
use crate::tree::{Element, Node};
use crate::url;
use crate::util::class_list;

/// Bare `http(s)` URL filling a whole line.
static BARE_URL_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?m)^[ \t]*(https?://[^\s<>]+?)[ \t]*$").expect("invalid bare URL regex")
});

/// MIME type for a video URL, judged by its path suffix.
///
/// Query string and fragment are ignored; the match is case-insensitive.
pub(crate) fn video_mime(href: &str) -> Option<&'static str> {
    let path = url::path_of(href).to_ascii_lowercase();
    if path.ends_with(".mp4") {
        Some("video/mp4")
    } else if path.ends_with(".webm") {
        Some("video/webm")
    } else {
        None
    }
}

/// Inline player for a video URL.
pub(crate) fn video_element(src: &str, mime: &str) -> Element {
    Element::new("video")
        .with_attr("controls", "")
        .with_attr("playsinline", "")
        .with_attr("preload", "metadata")
        .with_attr("class", class_list(VIDEO_CLASSES))
        .with_child(
            Element::new("source")
                .with_attr("src", src)
                .with_attr("type", mime),
        )
}

/// Replace video anchors and bare video URL lines with `<video>` players.
pub(crate) fn rewrite_videos(nodes: &mut Vec<Node>) {
    replace_video_anchors(nodes);
    rewrite_text(
        nodes,
        &|el: &Element| matches!(el.tag.as_str(), "a" | "code" | "pre" | "video"),
        &rewrite_bare_urls,
    );
}

fn replace_video_anchors(nodes: &mut [Node]) {
    for node in nodes {
        let Node::Element(element) = node else {
            continue;
        };
        let video = (element.tag == "a")
            .then(|| element.attr("href"))
            .flatten()
            .and_then(|href| video_mime(href).map(|mime| video_element(href, mime)));
        match video {
            Some(video) => *element = video,
            None => replace_video_anchors(&mut element.children),
        }
    }
}

fn rewrite_bare_urls(text: &str, edges: LineEdges) -> Option<Vec<Node>> {
    split_matches(text, &BARE_URL_LINE, |caps| {
        let whole = caps.get(0)?;
        if whole.start() == 0 && !edges.starts_line {
            return None;
        }
        if whole.end() == text.len() && !edges.ends_line {
            return None;
        }
        let href = caps.get(1)?.as_str();
        let mime = video_mime(href)?;
        url::is_http_url(href).then(|| video_element(href, mime).into())
    })
}
