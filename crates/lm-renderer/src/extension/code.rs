//! Inline code styling.

use super::{INLINE_CODE_CLASSES, for_each_element};
use crate::tree::Node;

/// Add the inline-code classes to every `<code>` outside `<pre>`.
pub(crate) fn style_inline_code(nodes: &mut Vec<Node>) {
    for_each_element(nodes, &mut |element, ancestors| {
        if element.tag == "code" && !ancestors.iter().any(|tag| tag == "pre") {
            element.add_classes(INLINE_CODE_CLASSES);
        }
    });
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::serializer::serialize;
    use crate::tree::Element;

    #[test]
    fn test_inline_code_styled_once() {
        let mut nodes = vec![Node::from(
            Element::new("p").with_child(Element::new("code").with_child(Node::text("x"))),
        )];
        style_inline_code(&mut nodes);
        style_inline_code(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<p><code class="rounded bg-muted px-1 py-0.5 font-mono text-sm">x</code></p>"#
        );
    }

    #[test]
    fn test_code_block_untouched() {
        let mut nodes = vec![Node::from(
            Element::new("pre").with_child(
                Element::new("code")
                    .with_attr("class", "language-rust")
                    .with_child(Node::text("x")),
            ),
        )];
        style_inline_code(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<pre><code class="language-rust">x</code></pre>"#
        );
    }
}
