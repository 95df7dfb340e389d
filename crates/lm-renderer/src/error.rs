//! Error types for markdown rendering.

/// Error raised by the sanitization schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[non_exhaustive]
pub enum SchemaError {
    /// Tag that no schema extension may ever admit.
    #[error("tag `{0}` can never be allowed")]
    ForbiddenTag(String),

    /// Attribute that no schema extension may ever admit.
    #[error("attribute `{attribute}` on `{tag}` can never be allowed")]
    ForbiddenAttribute {
        /// Tag the attribute was requested for.
        tag: String,
        /// Rejected attribute name.
        attribute: String,
    },

    /// Tag or attribute name that is not a plain lowercase identifier.
    #[error("invalid name `{0}`")]
    InvalidName(String),

    /// Tree contains a tag missing from the schema.
    #[error("tag `{0}` is not allowed by the schema")]
    DisallowedTag(String),

    /// Tree contains an attribute missing from the schema.
    #[error("attribute `{attribute}` is not allowed on `{tag}`")]
    DisallowedAttribute {
        /// Tag carrying the attribute.
        tag: String,
        /// Offending attribute name.
        attribute: String,
    },
}

/// Error from the structured rendering pipeline.
///
/// Never surfaces to callers of [`crate::render`]; the selector answers it
/// by switching to the fallback pipeline.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum RenderError {
    /// Schema could not be built or the rendered tree violates it.
    #[error("schema error: {0}")]
    Schema(#[from] SchemaError),

    /// Parser closed a block that does not match the innermost open one.
    #[error("unbalanced markdown events: expected end of {expected}, found end of {found}")]
    UnbalancedEvents {
        /// Innermost open block.
        expected: &'static str,
        /// Block the parser closed.
        found: &'static str,
    },

    /// Parser closed a block while none was open.
    #[error("unexpected end of {0} with no open block")]
    UnexpectedEnd(&'static str),

    /// Parser finished with blocks still open.
    #[error("document ended with {0} unclosed block(s)")]
    UnclosedBlocks(usize),

    /// Parser or a pass panicked; carries the panic message.
    #[error("structured pipeline panicked: {0}")]
    Panicked(String),
}
