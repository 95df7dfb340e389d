//! Table styling.

use super::{TABLE_CLASSES, TD_CLASSES, TH_CLASSES, for_each_element};
use crate::tree::Node;

pub(crate) fn style_tables(nodes: &mut Vec<Node>) {
    for_each_element(nodes, &mut |element, _| {
        let classes = match element.tag.as_str() {
            "table" => TABLE_CLASSES,
            "th" => TH_CLASSES,
            "td" => TD_CLASSES,
            _ => return,
        };
        element.add_classes(classes);
    });
}
