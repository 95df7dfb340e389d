//! CLI command implementations.

pub(crate) mod render;
pub(crate) mod schema;

pub(crate) use render::RenderArgs;
pub(crate) use schema::SchemaArgs;
