//! Shared helpers for markdown rendering.

use pulldown_cmark::HeadingLevel;

/// Convert heading level enum to number (1-6).
#[must_use]
pub(crate) fn heading_level_to_num(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

/// Join presentational classes into a `class` attribute value.
#[must_use]
pub(crate) fn class_list(classes: &[&str]) -> String {
    classes.join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_to_num() {
        assert_eq!(heading_level_to_num(HeadingLevel::H1), 1);
        assert_eq!(heading_level_to_num(HeadingLevel::H6), 6);
    }

    #[test]
    fn test_class_list() {
        assert_eq!(class_list(&["a", "b"]), "a b");
        assert_eq!(class_list(&[]), "");
    }
}
