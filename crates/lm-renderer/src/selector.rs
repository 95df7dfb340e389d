//! Pipeline selection with transparent fallback.

use std::panic::{self, AssertUnwindSafe};
use std::sync::LazyLock;

use crate::error::RenderError;
use crate::fallback::FallbackPipeline;
use crate::structured::StructuredPipeline;

/// Which pipeline a [`Renderer`] should try first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum PipelineMode {
    /// Structured pipeline, falling back on failure.
    #[default]
    Auto,
    /// Fallback pipeline only.
    Fallback,
}

/// Markdown renderer that never fails.
///
/// In [`PipelineMode::Auto`] the structured pipeline renders the input. If it
/// could not be built, returns an error or panics, the same input goes
/// through the [`FallbackPipeline`] and a warning is logged.
///
/// # Example
///
/// ```
/// use lm_renderer::{PipelineMode, Renderer};
///
/// let renderer = Renderer::new(PipelineMode::Fallback);
/// assert_eq!(renderer.render("*hi*"), "<p><em>hi</em></p>");
/// ```
#[derive(Debug, Clone)]
pub struct Renderer {
    structured: Option<StructuredPipeline>,
    fallback: FallbackPipeline,
}

impl Renderer {
    /// Create a renderer for the given mode.
    #[must_use]
    pub fn new(mode: PipelineMode) -> Self {
        let structured = match mode {
            PipelineMode::Auto => match StructuredPipeline::new() {
                Ok(pipeline) => Some(pipeline),
                Err(e) => {
                    tracing::warn!(error = %e, "Structured pipeline unavailable, using fallback");
                    None
                }
            },
            PipelineMode::Fallback => None,
        };
        Self {
            structured,
            fallback: FallbackPipeline,
        }
    }

    /// Pipeline mode this renderer ended up with.
    #[must_use]
    pub fn mode(&self) -> PipelineMode {
        if self.structured.is_some() {
            PipelineMode::Auto
        } else {
            PipelineMode::Fallback
        }
    }

    /// Render markdown to sanitized HTML.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        let Some(structured) = &self.structured else {
            return self.fallback.render(markdown);
        };
        match try_structured(structured, markdown) {
            Ok(html) => html,
            Err(e) => {
                tracing::warn!(error = %e, "Structured rendering failed, using fallback");
                self.fallback.render(markdown)
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new(PipelineMode::Auto)
    }
}

/// Run the structured pipeline, turning a panic into an error.
fn try_structured(pipeline: &StructuredPipeline, markdown: &str) -> Result<String, RenderError> {
    panic::catch_unwind(AssertUnwindSafe(|| pipeline.render(markdown)))
        .unwrap_or_else(|payload| Err(RenderError::Panicked(panic_message(payload.as_ref()))))
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_owned())
}

static DEFAULT_RENDERER: LazyLock<Renderer> = LazyLock::new(Renderer::default);

/// Render markdown to sanitized HTML with the shared default renderer.
///
/// Never fails: errors degrade to the fallback pipeline.
///
/// # Example
///
/// ```
/// let html = lm_renderer::render("Hello & <world>");
/// assert_eq!(html, "<p>Hello &amp; &lt;world&gt;</p>");
/// ```
#[must_use]
pub fn render(markdown: &str) -> String {
    DEFAULT_RENDERER.render(markdown)
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    fn renderers() -> [Renderer; 2] {
        [
            Renderer::new(PipelineMode::Auto),
            Renderer::new(PipelineMode::Fallback),
        ]
    }

    const CODE: &str = r#"<code class="rounded bg-muted px-1 py-0.5 font-mono text-sm">"#;
    const CHIP: &str = r#"<span class="blank-chip rounded bg-amber-100 px-1 font-semibold text-amber-900" title="{{問3}}">{{問3}}</span>"#;
    const PLAYER: &str = r#"<video controls="" playsinline="" preload="metadata" class="w-full rounded my-4">"#;

    #[test]
    fn test_modes() {
        assert_eq!(Renderer::new(PipelineMode::Auto).mode(), PipelineMode::Auto);
        assert_eq!(Renderer::new(PipelineMode::Fallback).mode(), PipelineMode::Fallback);
        assert_eq!(PipelineMode::default(), PipelineMode::Auto);
    }

    #[test]
    fn test_default_render() {
        assert_eq!(render("**Hi**"), "<p><strong>Hi</strong></p>");
    }

    #[test]
    fn test_panic_message() {
        let payload: Box<dyn std::any::Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn std::any::Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn std::any::Any + Send> = Box::new(3_u8);
        assert_eq!(panic_message(payload.as_ref()), "unknown panic");
    }

    #[test]
    fn test_no_injection() {
        let inputs = [
            "<script>alert(1)</script>",
            "<img src=x onerror=alert(1)>",
            "[x](javascript:alert(1))",
            "[x](JaVaScRiPt:alert(1))",
            "![x](javascript:alert(1))",
            "<a href=\"javascript:alert(1)\">x</a>",
            "[x](https://a.com/\"onmouseover=\"alert(1))",
            "<javascript:alert(1)>",
        ];
        for renderer in renderers() {
            for input in inputs {
                let html = renderer.render(input);
                assert!(!html.contains("<script"), "{input:?} -> {html}");
                assert!(!html.contains("<img src=x"), "{input:?} -> {html}");
                assert!(!html.contains("href=\"javascript"), "{input:?} -> {html}");
                assert!(!html.contains("src=\"javascript"), "{input:?} -> {html}");
            }
        }
    }

    #[test]
    fn test_plain_text() {
        for renderer in renderers() {
            assert_eq!(
                renderer.render("Hello & <world>"),
                "<p>Hello &amp; &lt;world&gt;</p>"
            );
        }
    }

    #[test]
    fn test_code_fence_round_trip() {
        for renderer in renderers() {
            let html = renderer.render("```js\nif (a < b && c) { x = [*y*](z); }\n```");
            assert!(
                html.starts_with(
                    "<pre><code class=\"language-js\">if (a &lt; b &amp;&amp; c) { x = [*y*](z); }"
                ),
                "{html}"
            );
            assert!(html.ends_with("</code></pre>"), "{html}");
        }
    }

    #[test]
    fn test_blank_and_mustache() {
        for renderer in renderers() {
            assert_eq!(
                renderer.render("Fill {{ 問3 }} not {{ name }}"),
                format!("<p>Fill {CHIP} not {{{{ name }}}}</p>")
            );
        }
    }

    #[test]
    fn test_blank_inside_code_stays_literal() {
        for renderer in renderers() {
            assert_eq!(
                renderer.render("`{{ 問3 }}`"),
                format!("<p>{CODE}{{{{ 問3 }}}}</code></p>")
            );
        }
    }

    #[test]
    fn test_video_link() {
        for renderer in renderers() {
            assert_eq!(
                renderer.render("[clip](https://cdn.example.com/a/clip.MP4?t=3)"),
                format!(
                    r#"<p>{PLAYER}<source src="https://cdn.example.com/a/clip.MP4?t=3" type="video/mp4"></video></p>"#
                )
            );
        }
    }

    #[test]
    fn test_video_link_with_formatted_label() {
        let expected = format!(
            r#"<p>{PLAYER}<source src="https://cdn.example.com/a.mp4" type="video/mp4"></video></p>"#
        );
        for renderer in renderers() {
            for input in [
                "[`intro`](https://cdn.example.com/a.mp4)",
                "[{{ 問1 }}](https://cdn.example.com/a.mp4)",
            ] {
                assert_eq!(renderer.render(input), expected, "{input:?}");
            }
        }
    }

    #[test]
    fn test_bare_video_line() {
        for renderer in renderers() {
            let html = renderer.render("Watch:\nhttps://cdn.example.com/b.webm\n\nDone");
            assert!(
                html.contains(
                    r#"<source src="https://cdn.example.com/b.webm" type="video/webm"></video>"#
                ),
                "{html}"
            );
            assert!(!html.contains("<a "), "{html}");
        }
    }

    #[test]
    fn test_link_hardening() {
        for renderer in renderers() {
            assert_eq!(
                renderer.render("[x](https://a.com)"),
                r#"<p><a href="https://a.com" target="_blank" rel="noopener noreferrer">x</a></p>"#
            );
            assert_eq!(renderer.render("[x](javascript:alert(1))"), "<p>x</p>");
        }
    }

    #[test]
    fn test_table() {
        let expected = concat!(
            r#"<table class="w-full border-collapse text-sm"><thead><tr>"#,
            r#"<th class="border px-3 py-2 text-left font-semibold">A</th>"#,
            r#"<th class="border px-3 py-2 text-left font-semibold">B</th>"#,
            "</tr></thead><tbody><tr>",
            r#"<td class="border px-3 py-2">1</td>"#,
            r#"<td class="border px-3 py-2">&lt;b&gt;</td>"#,
            "</tr></tbody></table>"
        );
        for renderer in renderers() {
            assert_eq!(renderer.render("| A | B |\n|---|---|\n| 1 | <b> |"), expected);
        }
    }

    #[test]
    fn test_table_row_wider_than_header() {
        let expected = concat!(
            r#"<table class="w-full border-collapse text-sm"><thead><tr>"#,
            r#"<th class="border px-3 py-2 text-left font-semibold">A</th>"#,
            "</tr></thead><tbody><tr>",
            r#"<td class="border px-3 py-2">x</td>"#,
            "</tr></tbody></table>"
        );
        for renderer in renderers() {
            assert_eq!(renderer.render("| A |\n|---|\n| x | `y` {{ 問1 }} |"), expected);
        }
    }

    #[test]
    fn test_emphasis_does_not_span_cells() {
        for renderer in renderers() {
            let html = renderer.render("| *a | b* |\n|---|---|\n| 1 | 2 |");
            assert!(html.contains(">*a</th>"), "{html}");
            assert!(html.contains(">b*</th>"), "{html}");
            assert!(!html.contains("<em>"), "{html}");
        }
    }
}
