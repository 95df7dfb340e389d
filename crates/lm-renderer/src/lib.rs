//! Markdown to sanitized HTML rendering for course content.
//!
//! This crate turns author markdown (lesson bodies, quiz prompts, feedback)
//! into HTML that is safe to inject into a page.
//!
//! # Architecture
//!
//! Two pipelines implement the same contract:
//! - [`StructuredPipeline`]: `pulldown-cmark` events → AST → HTML tree →
//!   extension passes → serializer → `ammonia` cleaner built from a [`Schema`]
//! - [`FallbackPipeline`]: a self-contained protect → escape → substitute →
//!   restore text converter
//!
//! [`Renderer`] prefers the structured pipeline and switches to the fallback
//! when it cannot be built or fails on an input. [`render`] uses a shared
//! default renderer.
//!
//! Both pipelines add the same course-specific markup: styled inline code and
//! tables, highlighted `{{ 問N }}` blank placeholders, embedded players for
//! `.mp4`/`.webm` links, and hardened external links.
//!
//! # Example
//!
//! ```
//! let html = lm_renderer::render("Fill in {{ 問1 }} and see [docs](https://a.com).");
//! assert!(html.contains(r#"title="{{問1}}""#));
//! assert!(html.contains(r#"rel="noopener noreferrer""#));
//! ```

mod ast;
mod error;
mod escape;
mod extension;
mod fallback;
mod lower;
mod sanitize;
mod schema;
mod selector;
mod serializer;
mod structured;
mod tree;
mod url;
mod util;

pub use error::{RenderError, SchemaError};
pub use escape::escape_html;
pub use fallback::FallbackPipeline;
pub use sanitize::sanitize;
pub use schema::{Schema, SchemaExtension, UrlPolicy};
pub use selector::{PipelineMode, Renderer, render};
pub use serializer::serialize;
pub use structured::StructuredPipeline;
pub use tree::{Element, Node};
