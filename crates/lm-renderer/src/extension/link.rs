//! Link hardening.

use super::for_each_element;
use crate::tree::Node;

/// Open every link in a new tab without an opener.
pub(crate) fn harden_links(nodes: &mut Vec<Node>) {
    for_each_element(nodes, &mut |element, _| {
        if element.tag == "a" {
            element.set_attr("target", "_blank");
            element.set_attr("rel", "noopener noreferrer");
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
    fn test_link_gets_target_and_rel() {
        let mut nodes = vec![Node::from(
            Element::new("a")
                .with_attr("href", "https://a.com")
                .with_child(Node::text("x")),
        )];
        harden_links(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<a href="https://a.com" target="_blank" rel="noopener noreferrer">x</a>"#
        );
    }

    #[test]
    fn test_existing_rel_is_replaced() {
        let mut nodes = vec![Node::from(
            Element::new("a")
                .with_attr("href", "https://a.com")
                .with_attr("rel", "opener"),
        )];
        harden_links(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<a href="https://a.com" rel="noopener noreferrer" target="_blank"></a>"#
        );
    }

    #[test]
    fn test_nested_link_in_list() {
        let mut nodes = vec![Node::from(
            Element::new("ul").with_child(
                Element::new("li").with_child(
                    Element::new("a")
                        .with_attr("href", "https://a.com")
                        .with_child(Node::text("x")),
                ),
            ),
        )];
        harden_links(&mut nodes);
        assert_eq!(
            serialize(&nodes),
            r#"<ul><li><a href="https://a.com" target="_blank" rel="noopener noreferrer">x</a></li></ul>"#
        );
    }
}
