//! Markup rendering.
//!
//! Turns a document body into HTML plus the structural data templates can
//! use (table of contents, code languages).
//!
//! ```text
//! body ──► check_fences ──► pulldown-cmark events ──► rewrite ──► HTML
//!              │                                        │
//!              └─ RenderError                           ├─ code blocks: verbatim + language tag
//!                                                       └─ headings: anchor ids + toc
//! ```
//!
//! Inline HTML is passed through untouched: content is written by the site
//! author at build time, not submitted by users.

mod fence;
mod markdown;

use pulldown_cmark::Options;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("unterminated code fence opened at line {line}")]
    UnterminatedFence { line: usize },
}

/// One heading in document order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TocEntry {
    pub level: u8,
    pub id: String,
    pub text: String,
}

/// Structural output of rendering one body.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedBody {
    pub html: String,
    pub toc: Vec<TocEntry>,
    /// Distinct code block language hints, in order of first use.
    pub languages: Vec<String>,
}

impl RenderedBody {
    /// Table of contents as nested `<ul>` lists following heading levels.
    ///
    /// Empty when the body has no headings.
    pub fn toc_html(&self) -> String {
        let Some(base) = self.toc.iter().map(|e| e.level).min() else {
            return String::new();
        };

        let mut out = String::new();
        let mut depth = 0usize;
        for entry in &self.toc {
            let target = usize::from(entry.level - base) + 1;
            if depth >= target {
                out.push_str("</li>");
                while depth > target {
                    out.push_str("</ul></li>");
                    depth -= 1;
                }
            }
            while depth < target {
                out.push_str(if depth == 0 { "<ul class=\"toc\">" } else { "<ul>" });
                depth += 1;
            }
            out.push_str(&format!(
                "<li><a href=\"#{}\">{}</a>",
                escape_html(&entry.id),
                escape_html(&entry.text)
            ));
        }

        out.push_str("</li>");
        while depth > 0 {
            out.push_str("</ul>");
            depth -= 1;
            if depth > 0 {
                out.push_str("</li>");
            }
        }
        out
    }
}

/// Markdown to HTML renderer. Stateless and cheap to copy across workers.
#[derive(Debug, Clone, Copy)]
pub struct Renderer {
    options: Options,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            options: Options::ENABLE_TABLES
                | Options::ENABLE_FOOTNOTES
                | Options::ENABLE_STRIKETHROUGH
                | Options::ENABLE_TASKLISTS
                | Options::ENABLE_HEADING_ATTRIBUTES,
        }
    }

    /// Render `body`. Identical input always yields identical output.
    pub fn render(&self, body: &str) -> Result<RenderedBody, RenderError> {
        fence::check_fences(body, self.options)?;
        Ok(markdown::to_html(body, self.options))
    }
}

/// Escape the HTML-significant characters `&`, `<`, `>` and `"`.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}
