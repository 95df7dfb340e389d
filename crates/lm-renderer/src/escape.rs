//! HTML escaping shared by both pipelines.

/// Escape HTML special characters (`& < > " '`).
///
/// Output is safe in element content and in double-quoted attribute values.
///
/// # Examples
///
/// ```
/// use lm_renderer::escape_html;
///
/// assert_eq!(escape_html("Hello & <world>"), "Hello &amp; &lt;world&gt;");
/// ```
#[must_use]
pub fn escape_html(s: &str) -> String {
    let mut result = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => result.push_str("&amp;"),
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&#x27;"),
            _ => result.push(c),
        }
    }
    result
}

/// Reverse [`escape_html`].
///
/// Only the five entities `escape_html` produces are decoded; any other
/// `&` sequence is left alone.
pub(crate) fn unescape_html(s: &str) -> String {
    if !s.contains('&') {
        return s.to_owned();
    }
    let mut result = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(pos) = rest.find('&') {
        result.push_str(&rest[..pos]);
        rest = &rest[pos..];
        let decoded = [
            ("&amp;", '&'),
            ("&lt;", '<'),
            ("&gt;", '>'),
            ("&quot;", '"'),
            ("&#x27;", '\''),
        ]
        .into_iter()
        .find(|(entity, _)| rest.starts_with(entity));
        match decoded {
            Some((entity, c)) => {
                result.push(c);
                rest = &rest[entity.len()..];
            }
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }
    result.push_str(rest);
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<script>"), "&lt;script&gt;");
        assert_eq!(escape_html("a & b"), "a &amp; b");
        assert_eq!(escape_html(r#""quoted""#), "&quot;quoted&quot;");
        assert_eq!(escape_html("it's"), "it&#x27;s");
    }

    #[test]
    fn test_unescape_html() {
        assert_eq!(unescape_html("&lt;a href=&quot;x&quot;&gt;"), r#"<a href="x">"#);
        assert_eq!(unescape_html("it&#x27;s &amp;amp;"), "it's &amp;");
        assert_eq!(unescape_html("&copy; & plain"), "&copy; & plain");
    }

    #[test]
    fn test_unescape_reverses_escape() {
        let raw = r#"<img src="x" onerror='y'> & more"#;
        assert_eq!(unescape_html(&escape_html(raw)), raw);
    }

    #[test]
    fn test_escape_html_leaves_unicode() {
        assert_eq!(escape_html("{{ 問1 }}"), "{{ 問1 }}");
    }
}
