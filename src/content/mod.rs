//! Content loading.
//!
//! Discovers documents under the content root and splits each one into
//! validated front matter and a markup body.
//!
//! ```text
//! content/
//! ├── index.md          → Document "index.md"
//! ├── posts/
//! │   ├── hello.md      → Document "posts/hello.md"
//! │   └── _draft.md     → non-output (leading underscore)
//! └── posts/cover.png   → not a document, skipped
//! ```

pub mod frontmatter;
pub mod metadata;

pub use metadata::{MetaValue, Metadata};

use crate::error::DocumentError;
use std::{
    fs,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Extensions recognized as content documents.
pub const CONTENT_EXTENSIONS: &[&str] = &["md", "markdown"];

/// One parsed content document.
#[derive(Debug, Clone)]
pub struct Document {
    /// Path relative to the content root, `/`-separated. The identity.
    pub id: String,
    /// Absolute source path.
    pub source: PathBuf,
    pub metadata: Metadata,
    pub body: String,
    /// Raw source bytes, kept for fingerprinting.
    pub raw: Vec<u8>,
}

impl Document {
    /// Parse a document from its source text without touching the disk.
    pub fn parse(id: impl Into<String>, source: PathBuf, raw: Vec<u8>) -> Result<Self, DocumentError> {
        let text = std::str::from_utf8(&raw).map_err(|err| {
            DocumentError::Read(std::io::Error::new(std::io::ErrorKind::InvalidData, err))
        })?;

        let split = frontmatter::split(text)?;
        let metadata = match split.front {
            Some((format, block)) => frontmatter::parse(format, block)?,
            None => Metadata::default(),
        };
        let metadata = metadata.validate()?;
        let body = split.body.to_owned();

        Ok(Self {
            id: id.into(),
            source,
            metadata,
            body,
            raw,
        })
    }

}

/// Whether a content path is a partial/include (never produces a page).
pub fn is_partial(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.starts_with('_'))
}

/// Discovers and loads documents below one content root.
#[derive(Debug, Clone)]
pub struct ContentLoader {
    root: PathBuf,
}

impl ContentLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Lazily walk the content root, yielding document source paths in a
    /// stable (file name sorted) order.
    ///
    /// Hidden entries, editor temp files and files without a content
    /// extension are skipped.
    pub fn discover(&self) -> impl Iterator<Item = PathBuf> {
        WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !is_hidden(e.file_name()))
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .map(walkdir::DirEntry::into_path)
            .filter(|p| is_content_file(p))
    }

    /// Document id for a source path under this root.
    pub fn id_of(&self, path: &Path) -> String {
        let rel = path.strip_prefix(&self.root).unwrap_or(path);
        rel.components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/")
    }

    /// Read and parse one document.
    pub fn load(&self, path: &Path) -> Result<Document, DocumentError> {
        let raw = fs::read(path).map_err(DocumentError::Read)?;
        Document::parse(self.id_of(path), path.to_path_buf(), raw)
    }
}

fn is_hidden(name: &std::ffi::OsStr) -> bool {
    name.to_str().is_some_and(|n| n.starts_with('.'))
}

/// Recognized content extension and not an editor artifact.
pub fn is_content_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    !name.starts_with('.')
        && !name.ends_with('~')
        && CONTENT_EXTENSIONS.iter().any(|known| ext.eq_ignore_ascii_case(known))
}
