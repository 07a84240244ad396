//! Fenced code block checks.
//!
//! The markdown parser closes an unterminated fence silently at the end of
//! its container, swallowing everything after it into a code block. This
//! pass runs first and rejects such bodies instead.

use super::RenderError;
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};

/// A fenced block as seen by the parser, in byte offsets into the body.
#[derive(Debug, Clone, Copy)]
struct Fence {
    marker: char,
    start: usize,
    end: usize,
    /// End of the last code line, or of the opening line when empty.
    content_end: usize,
}

impl Fence {
    /// A closing fence is whatever the block spans past its code.
    fn is_closed(&self, body: &str) -> bool {
        body.get(self.content_end..self.end)
            .is_some_and(|rest| rest.contains(self.marker))
    }
}

/// Verify every fenced code block in `body` is closed.
///
/// Uses the same parser and `options` as rendering, so fence markers inside
/// HTML blocks, indented code or other fences are never mistaken for
/// openers.
pub fn check_fences(body: &str, options: Options) -> Result<(), RenderError> {
    let mut open: Option<Fence> = None;

    for (event, range) in Parser::new_ext(body, options).into_offset_iter() {
        match event {
            Event::Start(Tag::CodeBlock(CodeBlockKind::Fenced(_))) => {
                let block = &body[range.clone()];
                let marker = block
                    .trim_start_matches([' ', '\t', '>'])
                    .chars()
                    .next()
                    .unwrap_or('`');
                let content_end = block.find('\n').map_or(range.end, |i| range.start + i + 1);
                open = Some(Fence {
                    marker,
                    start: range.start,
                    end: range.end,
                    content_end,
                });
            }
            Event::Text(_) => {
                if let Some(fence) = open.as_mut() {
                    fence.content_end = fence.content_end.max(range.end);
                }
            }
            Event::End(TagEnd::CodeBlock) => {
                if let Some(fence) = open.take()
                    && !fence.is_closed(body)
                {
                    let line = body[..fence.start].matches('\n').count() + 1;
                    return Err(RenderError::UnterminatedFence { line });
                }
            }
            _ => {}
        }
    }

    Ok(())
}

/// Language hint from a fence info string: the first word, cut at a comma
/// or attribute brace (`rust,ignore` gives `rust`).
pub fn language_hint(info: &str) -> Option<&str> {
    info.split(|c: char| c.is_whitespace() || c == ',' || c == '{')
        .next()
        .filter(|lang| !lang.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn check(body: &str) -> Result<(), RenderError> {
        check_fences(body, Options::empty())
    }

    #[test]
    fn test_closed_fences() {
        assert!(check("```rust\nfn main() {}\n```\n").is_ok());
        assert!(check("~~~\ncode\n~~~\n").is_ok());
        assert!(check("no code at all").is_ok());
    }

    #[test]
    fn test_unterminated_fence_reports_line() {
        let err = check("# Title\n\n```rust\nfn main() {}\n").unwrap_err();
        assert_eq!(err, RenderError::UnterminatedFence { line: 3 });
    }

    #[test]
    fn test_shorter_closing_run_does_not_close() {
        assert!(check("````\n```\n").is_err());
        assert!(check("````\n```\n`````\n").is_ok());
    }

    #[test]
    fn test_mismatched_marker_does_not_close() {
        assert!(check("```\n~~~\n").is_err());
    }

    #[test]
    fn test_closing_fence_with_text_does_not_close() {
        assert!(check("```\n``` not a close\n").is_err());
    }

    #[test]
    fn test_inline_triple_backticks_are_not_fences() {
        assert!(check("use ```code``` inline\n").is_ok());
        assert!(check("``` has `backtick` info\n").is_ok());
    }

    #[test]
    fn test_deeply_indented_is_not_fence() {
        assert!(check("    ```\n    code\n").is_ok());
    }

    #[test]
    fn test_fence_markers_inside_code_are_literal() {
        assert!(check("~~~\n```\n~~~\n").is_ok());
    }

    #[test]
    fn test_fence_markers_inside_html_blocks_are_literal() {
        assert!(check("<!--\n```\n-->\n\ntext\n").is_ok());
        assert!(check("<pre>\n```\n</pre>\n").is_ok());
    }

    #[test]
    fn test_fences_in_block_quotes() {
        assert!(check("> ```\n> code\n> ```\n").is_ok());
        let err = check("intro\n\n> ```\n> code\n\nafter\n").unwrap_err();
        assert_eq!(err, RenderError::UnterminatedFence { line: 3 });
    }

    #[test]
    fn test_lone_opener_at_end_of_input() {
        assert_eq!(check("```").unwrap_err(), RenderError::UnterminatedFence { line: 1 });
    }

    #[test]
    fn test_language_hint() {
        assert_eq!(language_hint("rust"), Some("rust"));
        assert_eq!(language_hint("rust,ignore"), Some("rust"));
        assert_eq!(language_hint("py title=\"x\""), Some("py"));
        assert_eq!(language_hint(""), None);
    }
}
