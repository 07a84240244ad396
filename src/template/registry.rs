//! Template loading and layout selection.
//!
//! ```text
//! templates/
//! ├── default.html        → "default"
//! ├── posts.html          → "posts"       (convention for content/posts/**)
//! ├── docs/guide.html     → "docs/guide"  (convention for content/docs/guide/**)
//! └── partials/
//!     └── nav.html        → partial "nav" (fills {{ nav }})
//! ```
//!
//! The registry is built once before any document is dispatched and is
//! read-only afterwards.

use super::{CONTENT_SLOT, Template};
use crate::{content::Document, error::DocumentError, log, utils::hash::Fingerprinter};
use std::{
    collections::BTreeMap,
    io,
    path::{Path, PathBuf},
};
use thiserror::Error;
use walkdir::WalkDir;

/// Fallback used when the site ships no `default.html`.
const EMBEDDED_DEFAULT: &str = include_str!("../embed/default.html");
const EMBEDDED_DEFAULT_NAME: &str = "default";

const PARTIALS_DIR: &str = "partials";
const TEMPLATE_EXTENSION: &str = "html";

/// Build-scoped template failures. Any of these aborts the build.
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("failed to read templates in `{}`", .0.display())]
    Io(PathBuf, #[source] io::Error),

    #[error("template `{0}` has no {{{{ content }}}} slot")]
    MissingContentSlot(String),

    #[error("partial `{0}` must not contain {{{{ content }}}}")]
    ContentInPartial(String),
}

#[derive(Debug, Clone)]
pub struct TemplateRegistry {
    templates: BTreeMap<String, Template>,
    partials: BTreeMap<String, Template>,
    default_layout: String,
    partials_digest: String,
}

impl TemplateRegistry {
    /// Load every template below `dir`.
    ///
    /// A missing directory is not an error: only the embedded default
    /// template is available then.
    pub fn load(dir: &Path, default_layout: &str) -> Result<Self, TemplateError> {
        let mut templates = Vec::new();
        let mut partials = Vec::new();

        if dir.is_dir() {
            for entry in WalkDir::new(dir).sort_by_file_name() {
                let entry = entry.map_err(|err| TemplateError::Io(dir.to_path_buf(), err.into()))?;
                let path = entry.path();
                if !entry.file_type().is_file()
                    || path.extension().and_then(|e| e.to_str()) != Some(TEMPLATE_EXTENSION)
                {
                    continue;
                }

                let source = std::fs::read_to_string(path)
                    .map_err(|err| TemplateError::Io(path.to_path_buf(), err))?;
                let name = template_name(dir, path);
                match name.strip_prefix(PARTIALS_DIR).and_then(|n| n.strip_prefix('/')) {
                    Some(partial) => partials.push((partial.to_owned(), source)),
                    None => templates.push((name, source)),
                }
            }
        } else {
            log!("template"; "no template directory at {}, using built-in default", dir.display());
        }

        Self::from_sources(templates, partials, default_layout)
    }

    /// Build a registry from in-memory `(name, source)` pairs.
    pub fn from_sources(
        templates: impl IntoIterator<Item = (String, String)>,
        partials: impl IntoIterator<Item = (String, String)>,
        default_layout: &str,
    ) -> Result<Self, TemplateError> {
        let mut parsed = BTreeMap::new();
        for (name, source) in templates {
            let template = Template::parse(name.clone(), &source);
            if !template.has_slot(CONTENT_SLOT) {
                return Err(TemplateError::MissingContentSlot(name));
            }
            parsed.insert(name, template);
        }
        parsed
            .entry(EMBEDDED_DEFAULT_NAME.to_owned())
            .or_insert_with(|| Template::parse(EMBEDDED_DEFAULT_NAME, EMBEDDED_DEFAULT));

        let mut parsed_partials = BTreeMap::new();
        for (name, source) in partials {
            let partial = Template::parse(name.clone(), &source);
            if partial.has_slot(CONTENT_SLOT) {
                return Err(TemplateError::ContentInPartial(name));
            }
            parsed_partials.insert(name, partial);
        }

        let mut fp = Fingerprinter::new();
        for (name, partial) in &parsed_partials {
            fp.str_field(name).str_field(partial.digest());
        }

        Ok(Self {
            templates: parsed,
            partials: parsed_partials,
            default_layout: default_layout.to_owned(),
            partials_digest: fp.finish(),
        })
    }

    pub fn get(&self, name: &str) -> Option<&Template> {
        self.templates.get(name)
    }

    pub fn partial(&self, name: &str) -> Option<&Template> {
        self.partials.get(name)
    }

    pub fn layout_count(&self) -> usize {
        self.templates.len()
    }

    /// Combined digest of every partial, for page fingerprints.
    pub fn partials_digest(&self) -> &str {
        &self.partials_digest
    }

    /// Choose the template for `doc`:
    ///
    /// 1. explicit `layout` metadata, which must exist
    /// 2. the nearest ancestor directory with a same-named template
    /// 3. the configured default layout
    pub fn select(&self, doc: &Document) -> Result<&Template, DocumentError> {
        if let Some(layout) = doc.metadata.layout() {
            return self
                .get(layout)
                .ok_or_else(|| DocumentError::TemplateNotFound(layout.to_owned()));
        }

        let mut current = doc.id.as_str();
        while let Some((parent, _)) = current.rsplit_once('/') {
            if let Some(template) = self.get(parent) {
                return Ok(template);
            }
            current = parent;
        }

        self.get(&self.default_layout)
            .ok_or_else(|| DocumentError::TemplateNotFound(self.default_layout.clone()))
    }
}

/// Template name: path under the template root without extension.
fn template_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path).with_extension("");
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
