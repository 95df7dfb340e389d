//! HTML sanitizer driven by a [`Schema`].
//!
//! The schema is translated into an [`ammonia::Builder`] allow-list; the
//! serialized output of the structured pipeline is cleaned with it.

use std::collections::{HashMap, HashSet};

use ammonia::{Builder, UrlRelative};

use crate::schema::{FORBIDDEN_TAGS, Schema};

/// Clean an HTML fragment, keeping only what `schema` allows.
///
/// Disallowed elements are unwrapped, except script-capable ones such as
/// `script` and `iframe`, which are removed with their content. Attributes
/// outside the allow-list and URL values failing the schema's policy for
/// their attribute are removed.
///
/// # Example
///
/// ```
/// use lm_renderer::{Schema, sanitize};
///
/// let html = sanitize(r#"<p onclick="x">a<script>b</script></p>"#, &Schema::base());
/// assert_eq!(html, "<p>a</p>");
/// ```
#[must_use]
pub fn sanitize(html: &str, schema: &Schema) -> String {
    let tag_attributes: HashMap<&str, HashSet<&str>> = schema
        .tags()
        .map(|(tag, attrs)| (tag, attrs.iter().map(String::as_str).collect()))
        .collect();
    let tags: HashSet<&str> = tag_attributes.keys().copied().collect();
    let schemes: HashSet<&str> = schema
        .url_policies()
        .values()
        .flat_map(|policy| policy.schemes())
        .collect();
    let policies = schema.url_policies().clone();

    Builder::new()
        .tags(tags)
        .generic_attributes(HashSet::<&str>::new())
        .tag_attributes(tag_attributes)
        .url_schemes(schemes)
        .url_relative(UrlRelative::PassThrough)
        .link_rel(None)
        .clean_content_tags(FORBIDDEN_TAGS.iter().copied().collect::<HashSet<_>>())
        .attribute_filter(move |_, attribute, value| {
            policies
                .get(attribute)
                .is_none_or(|policy| policy.permits(value))
                .then_some(value.into())
        })
        .clean(html)
        .to_string()
}
