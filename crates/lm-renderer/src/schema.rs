//! Allow-list sanitization schema.
//!
//! A [`Schema`] maps each allowed tag to its allowed attribute names and
//! carries a URL policy for URL-valued attributes. Everything not listed is
//! denied. Schemas are immutable: [`Schema::extend`] returns a new schema and
//! only ever adds entries, and it refuses entries that would admit script
//! execution no matter who asks.
//!
//! # Example
//!
//! ```
//! use lm_renderer::{Schema, SchemaExtension};
//!
//! let base = Schema::base();
//! let extended = base
//!     .extend(&SchemaExtension::new().tag("video", &["controls", "src"]))
//!     .unwrap();
//! assert!(extended.allows_attribute("video", "controls"));
//! assert!(!base.allows_tag("video"));
//!
//! let rejected = base.extend(&SchemaExtension::new().tag("img", &["onerror"]));
//! assert!(rejected.is_err());
//! ```

use std::collections::{BTreeMap, BTreeSet};

use crate::error::SchemaError;
use crate::tree::{Element, Node};
use crate::url;

/// Tags no extension may add.
pub(crate) const FORBIDDEN_TAGS: &[&str] = &["script", "style", "iframe", "object", "embed"];

/// Attributes no extension may add (besides every `on*` handler).
const FORBIDDEN_ATTRIBUTES: &[&str] = &["style"];

/// Base allow-list for reading content.
const BASE_TAGS: &[(&str, &[&str])] = &[
    ("p", &[]),
    ("br", &[]),
    ("hr", &[]),
    ("h1", &[]),
    ("h2", &[]),
    ("h3", &[]),
    ("h4", &[]),
    ("h5", &[]),
    ("h6", &[]),
    ("em", &[]),
    ("strong", &[]),
    ("del", &[]),
    ("blockquote", &[]),
    ("ul", &[]),
    ("ol", &["start"]),
    ("li", &[]),
    ("pre", &["class"]),
    ("code", &["class"]),
    ("a", &["href", "title", "rel"]),
    ("img", &["src", "alt", "title"]),
];

/// Tags and attributes the extension passes and GFM lowering introduce.
const RENDERING_TAGS: &[(&str, &[&str])] = &[
    ("video", &["controls", "playsinline", "preload", "src", "class"]),
    ("source", &["src", "type"]),
    ("table", &["class"]),
    ("thead", &[]),
    ("tbody", &[]),
    ("tr", &[]),
    ("th", &["class"]),
    ("td", &["class"]),
    ("del", &[]),
    ("input", &["type", "disabled", "checked"]),
    ("ul", &["class"]),
    ("ol", &["class"]),
    ("li", &["class"]),
    ("span", &["class", "title"]),
    ("a", &["target", "rel"]),
];

/// Policy for a URL-valued attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct UrlPolicy {
    /// Allowed schemes (lowercase).
    schemes: BTreeSet<String>,
    /// Whether scheme-less (relative) references are allowed.
    allow_relative: bool,
}

impl UrlPolicy {
    /// Create a policy from allowed schemes.
    #[must_use]
    pub fn new(schemes: &[&str], allow_relative: bool) -> Self {
        Self {
            schemes: schemes.iter().map(|s| s.to_ascii_lowercase()).collect(),
            allow_relative,
        }
    }

    /// Allowed schemes.
    pub(crate) fn schemes(&self) -> impl Iterator<Item = &str> {
        self.schemes.iter().map(String::as_str)
    }

    /// Check whether a URL satisfies the policy.
    #[must_use]
    pub fn permits(&self, value: &str) -> bool {
        match url::scheme(value) {
            Some(scheme) => self.schemes.contains(&scheme),
            None => self.allow_relative,
        }
    }
}

/// Additive set of tag/attribute permissions to merge into a [`Schema`].
#[derive(Debug, Clone, Default)]
pub struct SchemaExtension {
    tags: Vec<(String, Vec<String>)>,
}

impl SchemaExtension {
    /// Create an empty extension.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder: allow a tag with the given attributes.
    #[must_use]
    pub fn tag(mut self, tag: &str, attributes: &[&str]) -> Self {
        self.tags.push((
            tag.to_owned(),
            attributes.iter().map(|&a| a.to_owned()).collect(),
        ));
        self
    }

    /// Extension admitting everything the rendering passes produce.
    #[must_use]
    pub fn rendering() -> Self {
        RENDERING_TAGS
            .iter()
            .fold(Self::new(), |ext, (tag, attrs)| ext.tag(tag, attrs))
    }
}

/// Immutable tag/attribute allow-list.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Schema {
    /// Allowed tags and their allowed attributes.
    tags: BTreeMap<String, BTreeSet<String>>,
    /// URL policies keyed by attribute name.
    protocols: BTreeMap<String, UrlPolicy>,
}

impl Schema {
    /// Base allow-list: paragraphs, headings, emphasis, lists, blockquotes,
    /// links, images and code.
    ///
    /// Links accept only `http`/`https` targets. Media sources additionally
    /// accept relative references.
    #[must_use]
    pub fn base() -> Self {
        let tags = BASE_TAGS
            .iter()
            .map(|(tag, attrs)| {
                (
                    (*tag).to_owned(),
                    attrs.iter().map(|&a| a.to_owned()).collect(),
                )
            })
            .collect();
        let protocols = BTreeMap::from([
            ("href".to_owned(), UrlPolicy::new(&["http", "https"], false)),
            ("src".to_owned(), UrlPolicy::new(&["http", "https"], true)),
        ]);
        Self { tags, protocols }
    }

    /// Base schema merged with [`SchemaExtension::rendering`].
    ///
    /// # Errors
    ///
    /// Returns an error if the rendering extension names a forbidden entry.
    pub fn for_rendering() -> Result<Self, SchemaError> {
        Self::base().extend(&SchemaExtension::rendering())
    }

    /// Merge an extension, returning a new schema.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError::ForbiddenTag`] for `script`, `style`, `iframe`,
    /// `object` and `embed`, [`SchemaError::ForbiddenAttribute`] for `style`
    /// and any `on*` event handler, and [`SchemaError::InvalidName`] for
    /// names that are not lowercase ASCII identifiers.
    pub fn extend(&self, extension: &SchemaExtension) -> Result<Self, SchemaError> {
        let mut merged = self.clone();
        for (tag, attributes) in &extension.tags {
            validate_name(tag)?;
            if FORBIDDEN_TAGS.contains(&tag.as_str()) {
                return Err(SchemaError::ForbiddenTag(tag.clone()));
            }
            for attribute in attributes {
                validate_name(attribute)?;
                if attribute.starts_with("on") || FORBIDDEN_ATTRIBUTES.contains(&attribute.as_str())
                {
                    return Err(SchemaError::ForbiddenAttribute {
                        tag: tag.clone(),
                        attribute: attribute.clone(),
                    });
                }
            }
            merged
                .tags
                .entry(tag.clone())
                .or_default()
                .extend(attributes.iter().cloned());
        }
        Ok(merged)
    }

    /// Check whether a tag is allowed.
    #[must_use]
    pub fn allows_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// Check whether an attribute is allowed on a tag.
    #[must_use]
    pub fn allows_attribute(&self, tag: &str, attribute: &str) -> bool {
        self.tags
            .get(tag)
            .is_some_and(|attrs| attrs.contains(attribute))
    }

    /// Check whether an attribute value passes the URL policy for its name.
    ///
    /// Attributes without a policy always pass.
    #[must_use]
    pub fn allows_value(&self, attribute: &str, value: &str) -> bool {
        self.protocols
            .get(attribute)
            .is_none_or(|policy| policy.permits(value))
    }

    /// Allowed tags with their allowed attributes.
    pub(crate) fn tags(&self) -> impl Iterator<Item = (&str, &BTreeSet<String>)> {
        self.tags.iter().map(|(tag, attrs)| (tag.as_str(), attrs))
    }

    /// URL policies keyed by attribute name.
    pub(crate) fn url_policies(&self) -> &BTreeMap<String, UrlPolicy> {
        &self.protocols
    }

    /// Verify that every element and attribute in a tree is allowed.
    ///
    /// # Errors
    ///
    /// Returns the first [`SchemaError::DisallowedTag`] or
    /// [`SchemaError::DisallowedAttribute`] found.
    pub fn check(&self, nodes: &[Node]) -> Result<(), SchemaError> {
        nodes.iter().try_for_each(|node| match node {
            Node::Text(_) => Ok(()),
            Node::Element(element) => self.check_element(element),
        })
    }

    fn check_element(&self, element: &Element) -> Result<(), SchemaError> {
        if !self.allows_tag(&element.tag) {
            return Err(SchemaError::DisallowedTag(element.tag.clone()));
        }
        for (name, value) in &element.attrs {
            if !self.allows_attribute(&element.tag, name) || !self.allows_value(name, value) {
                return Err(SchemaError::DisallowedAttribute {
                    tag: element.tag.clone(),
                    attribute: name.clone(),
                });
            }
        }
        self.check(&element.children)
    }
}

/// Require a lowercase ASCII identifier (`[a-z][a-z0-9-]*`).
fn validate_name(name: &str) -> Result<(), SchemaError> {
    let mut chars = name.chars();
    let valid = chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-');
    if valid {
        Ok(())
    } else {
        Err(SchemaError::InvalidName(name.to_owned()))
    }
}
