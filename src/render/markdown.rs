//! pulldown-cmark event rewriting.
//!
//! Code blocks and headings are intercepted before the stock HTML writer:
//! code blocks become pre-rendered HTML so their text is never interpreted,
//! and headings gain anchor ids collected into the table of contents.

use super::{RenderedBody, TocEntry, escape_html, fence::language_hint};
use crate::utils::slug::SlugSet;
use pulldown_cmark::{CodeBlockKind, CowStr, Event, Options, Parser, Tag, TagEnd, html};

pub fn to_html(body: &str, options: Options) -> RenderedBody {
    let mut parser = Parser::new_ext(body, options);
    let mut events: Vec<Event<'_>> = Vec::new();
    let mut slugs = SlugSet::default();
    for event in Parser::new_ext(body, options) {
        if let Event::Start(Tag::Heading { id: Some(id), .. }) = event {
            slugs.reserve(&id);
        }
    }
    let mut toc = Vec::new();
    let mut languages: Vec<String> = Vec::new();

    while let Some(event) = parser.next() {
        match event {
            Event::Start(Tag::CodeBlock(kind)) => {
                let lang = match &kind {
                    CodeBlockKind::Fenced(info) => language_hint(info).map(str::to_owned),
                    CodeBlockKind::Indented => None,
                };

                let mut code = String::new();
                for inner in parser.by_ref() {
                    match inner {
                        Event::End(TagEnd::CodeBlock) => break,
                        Event::Text(text) => code.push_str(&text),
                        _ => {}
                    }
                }

                if let Some(lang) = &lang
                    && !languages.contains(lang)
                {
                    languages.push(lang.clone());
                }
                events.push(Event::Html(CowStr::from(code_block(lang.as_deref(), &code))));
            }
            Event::Start(Tag::Heading {
                level,
                id,
                classes,
                attrs,
            }) => {
                let mut inner = Vec::new();
                let mut text = String::new();
                for ev in parser.by_ref() {
                    match &ev {
                        Event::End(TagEnd::Heading(_)) => break,
                        Event::Text(t) | Event::Code(t) => text.push_str(t),
                        _ => {}
                    }
                    inner.push(ev);
                }

                let anchor = match id {
                    Some(explicit) => explicit.to_string(),
                    None => slugs.unique(&text),
                };
                toc.push(TocEntry {
                    level: level as u8,
                    id: anchor.clone(),
                    text: text.trim().to_owned(),
                });

                events.push(Event::Start(Tag::Heading {
                    level,
                    id: Some(CowStr::from(anchor)),
                    classes,
                    attrs,
                }));
                events.extend(inner);
                events.push(Event::End(TagEnd::Heading(level)));
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(body.len() + body.len() / 2);
    html::push_html(&mut out, events.into_iter());

    RenderedBody {
        html: out,
        toc,
        languages,
    }
}

/// `<pre><code>` with the text escaped but otherwise untouched.
fn code_block(lang: Option<&str>, code: &str) -> String {
    match lang {
        Some(lang) => {
            let lang = escape_html(lang);
            format!(
                "<pre><code class=\"language-{lang}\" data-lang=\"{lang}\">{}</code></pre>\n",
                escape_html(code)
            )
        }
        None => format!("<pre><code>{}</code></pre>\n", escape_html(code)),
    }
}
