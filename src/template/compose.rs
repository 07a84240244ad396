//! Page composition: a rendered document merged into its template.
//!
//! # Slots
//!
//! | Slot                        | Value                                        |
//! |-----------------------------|----------------------------------------------|
//! | `content`                   | rendered body (HTML)                         |
//! | `title`, `author`, `date`   | front matter, author falls back to `[site]`  |
//! | `images` / `image`          | `<img>` elements (HTML) / first image path   |
//! | `tags`                      | comma-separated tags                         |
//! | `toc`                       | nested heading list (HTML)                   |
//! | `stylesheet`                | URL of the externally built stylesheet       |
//! | `site.title` `site.url` `site.language` | `[site]` values                  |
//! | `path`                      | page URL                                     |
//! | `meta.<key>`                | any front matter value                       |
//! | `<partial>`                 | `partials/<partial>.html` (HTML)             |
//!
//! Text values are HTML-escaped. Unknown slots render empty.

use super::{Template, TemplateRegistry};
use crate::{
    config::SiteConfig,
    content::Document,
    error::DocumentError,
    render::{RenderedBody, escape_html},
    utils::{hash::Fingerprinter, minify::minify_html},
};
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

/// Fingerprint domain tag; bump to invalidate every manifest entry.
const ENGINE_VERSION: &str = concat!("inkpress/", env!("CARGO_PKG_VERSION"));

/// Site-level values injected into every page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SiteContext {
    pub title: String,
    pub url: String,
    pub language: String,
    pub author: String,
    pub stylesheet: String,
}

impl SiteContext {
    pub fn from_config(config: &SiteConfig) -> Self {
        Self {
            title: config.site.title.clone(),
            url: config.site.url.clone().unwrap_or_default(),
            language: config.site.language.clone(),
            author: config.site.author.clone(),
            stylesheet: config.build.stylesheet_url().unwrap_or_default(),
        }
    }

    fn hash_into(&self, fp: &mut Fingerprinter) {
        fp.str_field(&self.title)
            .str_field(&self.url)
            .str_field(&self.language)
            .str_field(&self.author)
            .str_field(&self.stylesheet);
    }
}

/// Final output of one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    /// Path relative to the output root, e.g. `posts/hello.html`.
    pub relative: PathBuf,
    /// Absolute output path.
    pub output: PathBuf,
    pub bytes: Vec<u8>,
}

/// Output path of a document relative to the output root.
pub fn output_relative(id: &str) -> PathBuf {
    Path::new(id).with_extension("html")
}

/// Root-relative URL of a document's page.
pub fn page_url(id: &str) -> String {
    let rel = output_relative(id);
    let parts: Vec<_> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect();
    format!("/{}", parts.join("/"))
}

/// Shared by all workers; holds nothing mutable.
#[derive(Debug, Clone)]
pub struct Composer {
    registry: Arc<TemplateRegistry>,
    site: SiteContext,
    output_root: PathBuf,
    minify: bool,
}

impl Composer {
    pub fn new(
        registry: Arc<TemplateRegistry>,
        site: SiteContext,
        output_root: impl Into<PathBuf>,
        minify: bool,
    ) -> Self {
        Self {
            registry,
            site,
            output_root: output_root.into(),
            minify,
        }
    }

    pub fn select(&self, doc: &Document) -> Result<&Template, DocumentError> {
        self.registry.select(doc)
    }

    /// Everything the composed page depends on, hashed.
    ///
    /// Covers the engine version, source bytes, the selected template, all
    /// partials, site values and the minify flag.
    pub fn fingerprint(&self, doc: &Document, template: &Template) -> String {
        let mut fp = Fingerprinter::new();
        fp.str_field(ENGINE_VERSION)
            .field(&doc.raw)
            .str_field(template.name())
            .str_field(template.digest())
            .str_field(self.registry.partials_digest());
        self.site.hash_into(&mut fp);
        fp.field(&[u8::from(self.minify)]);
        fp.finish()
    }

    pub fn compose(&self, doc: &Document, rendered: &RenderedBody, template: &Template) -> Page {
        let slots = Slots {
            doc,
            rendered,
            site: &self.site,
        };

        let html = template.render(|name| {
            slots.value(name).or_else(|| {
                self.registry
                    .partial(name)
                    .map(|partial| partial.render(|inner| slots.value(inner)))
            })
        });

        let relative = output_relative(&doc.id);
        Page {
            output: self.output_root.join(&relative),
            relative,
            bytes: minify_html(html.as_bytes(), self.minify).into_owned(),
        }
    }
}

/// Slot values of one document. Partials are resolved by the caller so
/// that they cannot nest.
struct Slots<'a> {
    doc: &'a Document,
    rendered: &'a RenderedBody,
    site: &'a SiteContext,
}

impl Slots<'_> {
    fn value(&self, name: &str) -> Option<String> {
        let meta = &self.doc.metadata;
        Some(match name {
            "content" => self.rendered.html.clone(),
            "toc" => self.rendered.toc_html(),
            "images" => self.images_html(),
            "title" => escape_html(meta.title()),
            "date" => meta
                .date()
                .map(|d| d.format("%Y-%m-%d").to_string())
                .unwrap_or_default(),
            "author" => escape_html(meta.author().unwrap_or(&self.site.author)),
            "image" => escape_html(meta.images().first().map_or("", String::as_str)),
            "tags" => escape_html(&meta.tags().join(", ")),
            "stylesheet" => escape_html(&self.site.stylesheet),
            "path" => escape_html(&page_url(&self.doc.id)),
            "site.title" => escape_html(&self.site.title),
            "site.url" => escape_html(&self.site.url),
            "site.language" => escape_html(&self.site.language),
            _ => {
                let key = name.strip_prefix("meta.")?;
                escape_html(&meta.get(key)?.to_string())
            }
        })
    }

    fn images_html(&self) -> String {
        let alt = escape_html(self.doc.metadata.title());
        self.doc
            .metadata
            .images()
            .iter()
            .map(|src| format!("<img src=\"{}\" alt=\"{alt}\">", escape_html(src)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}
