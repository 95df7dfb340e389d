//! Structured rendering pipeline.
//!
//! parse → lower → extension passes → schema check → serialize → sanitize.

use crate::ast;
use crate::error::RenderError;
use crate::extension;
use crate::lower::lower;
use crate::sanitize::sanitize;
use crate::schema::Schema;
use crate::serializer::serialize;

/// Markdown renderer backed by `pulldown-cmark` and the HTML tree.
///
/// # Example
///
/// ```
/// use lm_renderer::StructuredPipeline;
///
/// let pipeline = StructuredPipeline::new().unwrap();
/// let html = pipeline.render("**Hi** <script>").unwrap();
/// assert_eq!(html, "<p><strong>Hi</strong> &lt;script&gt;</p>");
/// ```
#[derive(Debug, Clone)]
pub struct StructuredPipeline {
    schema: Schema,
}

impl StructuredPipeline {
    /// Build the pipeline and its rendering schema.
    ///
    /// # Errors
    ///
    /// Returns an error if the rendering schema cannot be built.
    pub fn new() -> Result<Self, RenderError> {
        Ok(Self {
            schema: Schema::for_rendering()?,
        })
    }

    /// Render markdown to sanitized HTML.
    ///
    /// # Errors
    ///
    /// Returns an error if the parser produces unbalanced events or the
    /// final tree violates the schema.
    pub fn render(&self, markdown: &str) -> Result<String, RenderError> {
        let ast = ast::parse(markdown)?;
        let mut tree = lower(&ast);
        extension::run(&mut tree);
        self.schema.check(&tree)?;
        Ok(sanitize(&serialize(&tree), &self.schema))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn render(markdown: &str) -> String {
        StructuredPipeline::new().unwrap().render(markdown).unwrap()
    }

    #[test]
    fn test_plain_text() {
        assert_eq!(render("Hello & <world>"), "<p>Hello &amp; &lt;world&gt;</p>");
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(render(""), "");
    }

    #[test]
    fn test_link_hardening() {
        assert_eq!(
            render("[x](https://a.com)"),
            r#"<p><a href="https://a.com" target="_blank" rel="noopener noreferrer">x</a></p>"#
        );
    }

    #[test]
    fn test_unsafe_link_is_plain_label() {
        assert_eq!(render("[x](javascript:alert(1))"), "<p>x</p>");
        assert_eq!(render("[x](/relative)"), "<p>x</p>");
    }

    #[test]
    fn test_inline_code_and_code_block() {
        assert_eq!(
            render("`a<b`\n\n```js\nlet x;\n```"),
            concat!(
                r#"<p><code class="rounded bg-muted px-1 py-0.5 font-mono text-sm">a&lt;b</code></p>"#,
                r#"<pre><code class="language-js">let x;"#,
                "\n</code></pre>"
            )
        );
    }

    #[test]
    fn test_blank_in_list_item() {
        let html = render("- Fill {{ 問2 }}");
        assert!(html.contains(r#"title="{{問2}}">{{問2}}</span>"#), "{html}");
    }

    #[test]
    fn test_video_autolink() {
        let html = render("<https://cdn.example.com/clip.mp4>");
        assert!(
            html.contains(r#"<source src="https://cdn.example.com/clip.mp4" type="video/mp4">"#),
            "{html}"
        );
        assert!(!html.contains("<a "), "{html}");
    }

    #[test]
    fn test_task_list_and_quotes() {
        assert_eq!(
            render("- [x] say \"hi\""),
            concat!(
                r#"<ul class="contains-task-list"><li class="task-list-item">"#,
                r#"<input type="checkbox" checked="" disabled=""> say "hi"</li></ul>"#
            )
        );
    }

    #[test]
    fn test_output_passes_schema() {
        let pipeline = StructuredPipeline::new().unwrap();
        let html = pipeline
            .render("| a |\n|---|\n| `b` |\n\n- [x] c\n\n![d](e.png)")
            .unwrap();
        assert!(html.contains("<table"));
        assert!(html.contains("<input"));
        assert!(html.contains("<img"));
    }
}
