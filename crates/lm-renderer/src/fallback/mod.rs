//! Fallback rendering pipeline.
//!
//! A self-contained text converter used when the structured pipeline is
//! unavailable or fails. It works on a single string buffer through an
//! ordered list of named passes:
//!
//! 1. normalize line endings
//! 2. protect fenced code blocks
//! 3. protect inline code spans
//! 4. protect blank placeholders
//! 5. escape (the only escaping step for author text)
//! 6. substitute block and inline constructs
//! 7. wrap paragraphs
//! 8. restore protected content
//! 9. sweep surviving backtick pairs into inline code
//!
//! Every substitution runs on escaped text, so no rule can emit an
//! unescaped author character. Protected content travels as extraction
//! tokens (see `tokens`) and is restored exactly once.

mod blocks;
mod inline;
mod protect;
mod restore;
mod tokens;

use crate::escape::escape_html;
use tokens::TokenTable;

/// Text pass: takes the buffer and the token table, returns the new buffer.
type Pass = fn(&str, &mut TokenTable) -> String;

/// Pipeline passes in execution order.
const PASSES: &[(&str, Pass)] = &[
    ("normalize", normalize),
    ("protect-fences", protect::protect_fences),
    ("protect-code-spans", protect::protect_code_spans),
    ("protect-blanks", protect::protect_blanks),
    ("escape", escape),
    ("substitute", substitute),
    ("wrap-paragraphs", blocks::wrap_paragraphs),
    ("restore", restore::restore),
    ("sweep-backticks", restore::sweep_backticks),
];

/// Substitution rules in execution order, all on escaped text.
///
/// Videos run before links so video links never become anchors; images run
/// before links so `![..](..)` is not read as a link; thematic breaks run
/// before lists; emphasis runs before lists so `* item` markers survive.
const SUBSTITUTIONS: &[(&str, Pass)] = &[
    ("videos", inline::videos),
    ("images", inline::images),
    ("links", inline::links),
    ("headings", blocks::headings),
    ("thematic-breaks", blocks::thematic_breaks),
    ("tables", blocks::tables),
    ("blockquotes", blocks::blockquotes),
    ("emphasis", inline::emphasis),
    ("unordered-lists", blocks::unordered_lists),
    ("ordered-lists", blocks::ordered_lists),
];

/// Hand-rolled markdown renderer with no parser dependency.
///
/// # Example
///
/// ```
/// use lm_renderer::FallbackPipeline;
///
/// let html = FallbackPipeline.render("# Title\n\nHello & <world>");
/// assert_eq!(html, "<h1>Title</h1>\n<p>Hello &amp; &lt;world&gt;</p>");
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackPipeline;

impl FallbackPipeline {
    /// Render markdown to sanitized HTML. Never fails.
    #[must_use]
    pub fn render(&self, markdown: &str) -> String {
        run_passes(PASSES, markdown, &mut TokenTable::default())
    }
}

fn run_passes(passes: &[(&str, Pass)], text: &str, tokens: &mut TokenTable) -> String {
    let mut text = text.to_owned();
    for (name, pass) in passes {
        tracing::trace!(pass = name, "Running fallback pass");
        text = pass(&text, tokens);
    }
    text
}

/// Unify line endings to `\n` and replace NUL, which delimits tokens.
fn normalize(text: &str, _tokens: &mut TokenTable) -> String {
    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\0', "\u{FFFD}")
}

fn escape(text: &str, _tokens: &mut TokenTable) -> String {
    escape_html(text)
}

fn substitute(text: &str, tokens: &mut TokenTable) -> String {
    run_passes(SUBSTITUTIONS, text, tokens)
}
