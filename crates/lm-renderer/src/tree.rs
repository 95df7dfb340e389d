//! HTML tree produced by the structured pipeline.
//!
//! Lowered from the markdown AST, rewritten in place by the extension passes
//! and finally turned into a string by the serializer.

/// HTML tree node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    /// Element with tag name, attributes and children.
    Element(Element),
    /// Text content (unescaped).
    Text(String),
}

impl Node {
    /// Create a text node.
    #[must_use]
    pub fn text(value: impl Into<String>) -> Self {
        Self::Text(value.into())
    }

    /// Return the element if this node is one with the given tag.
    #[must_use]
    pub fn as_element(&self, tag: &str) -> Option<&Element> {
        match self {
            Self::Element(element) if element.tag == tag => Some(element),
            _ => None,
        }
    }
}

impl From<Element> for Node {
    fn from(element: Element) -> Self {
        Self::Element(element)
    }
}

/// HTML element.
///
/// Attributes keep insertion order so serialized output is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    /// Lowercase tag name.
    pub tag: String,
    /// Attributes as `(name, value)` pairs. Boolean attributes carry an
    /// empty value.
    pub attrs: Vec<(String, String)>,
    /// Child nodes.
    pub children: Vec<Node>,
}

impl Element {
    /// Create an element with no attributes or children.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            ..Default::default()
        }
    }

    /// Builder: set an attribute.
    #[must_use]
    pub fn with_attr(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attr(name, value);
        self
    }

    /// Builder: append a child.
    #[must_use]
    pub fn with_child(mut self, child: impl Into<Node>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Builder: replace children.
    #[must_use]
    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    /// Value of an attribute.
    #[must_use]
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    /// Set an attribute, replacing an existing value in place.
    pub fn set_attr(&mut self, name: impl Into<String>, value: impl Into<String>) {
        let name = name.into();
        let value = value.into();
        if let Some(slot) = self.attrs.iter_mut().find(|(key, _)| *key == name) {
            slot.1 = value;
        } else {
            self.attrs.push((name, value));
        }
    }

    /// Check whether the `class` attribute contains a class.
    #[must_use]
    pub fn has_class(&self, class: &str) -> bool {
        self.attr("class")
            .is_some_and(|classes| classes.split_whitespace().any(|c| c == class))
    }

    /// Append classes that are not already present.
    pub fn add_classes(&mut self, classes: &[&str]) {
        let mut current = self.attr("class").unwrap_or_default().to_owned();
        for class in classes {
            if current.split_whitespace().any(|c| c == *class) {
                continue;
            }
            if !current.is_empty() {
                current.push(' ');
            }
            current.push_str(class);
        }
        if !current.is_empty() {
            self.set_attr("class", current);
        }
    }
}
