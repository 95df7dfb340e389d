//! URL classification helpers shared by both pipelines.

/// Extract the lowercased scheme of a URL, or `None` for a relative reference.
///
/// Mirrors how browsers read `href`/`src`: ASCII whitespace and control
/// characters are ignored, so `java\tscript:` is still `javascript`. Anything
/// before the first `:` counts as a scheme when no `/`, `?` or `#` precedes it,
/// even when it is not a well-formed scheme name.
pub(crate) fn scheme(url: &str) -> Option<String> {
    let cleaned: String = url
        .chars()
        .filter(|c| !c.is_ascii_whitespace() && !c.is_ascii_control())
        .collect();
    let end = cleaned.find([':', '/', '?', '#'])?;
    if cleaned[end..].starts_with(':') && end > 0 {
        Some(cleaned[..end].to_ascii_lowercase())
    } else {
        None
    }
}

/// Check whether a URL is an absolute `http://` or `https://` URL.
pub(crate) fn is_http_url(url: &str) -> bool {
    matches!(scheme(url).as_deref(), Some("http" | "https")) && {
        let lower = url.trim_start().to_ascii_lowercase();
        lower.starts_with("http://") || lower.starts_with("https://")
    }
}

/// Check whether a URL may be used as a media source (`img`, `video`).
///
/// Accepts `http(s)` URLs and scheme-less references such as upload paths.
pub(crate) fn is_media_url(url: &str) -> bool {
    match scheme(url).as_deref() {
        Some("http" | "https") | None => !url.trim().is_empty(),
        Some(_) => false,
    }
}

/// Path part of a URL, without query string or fragment.
pub(crate) fn path_of(url: &str) -> &str {
    url.split(['?', '#']).next().unwrap_or(url)
}
