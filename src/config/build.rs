//! `[build]` section configuration.
//!
//! Paths of the content, template, asset and output trees plus the knobs
//! of the build pipeline itself.

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// `[build]` section in site.toml - build pipeline configuration.
///
/// # Example
/// ```toml
/// [build]
/// content = "content"            # Markdown documents
/// output = "public"              # Generated pages
/// templates = "templates"        # Layouts and partials
/// stylesheet = "assets/site.css" # Produced by the external CSS tool
/// minify = false
/// jobs = 4
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    /// Project root directory (usually set via CLI `--root`).
    #[serde(default = "defaults::build::root")]
    #[educe(Default = defaults::build::root())]
    pub root: Option<PathBuf>,

    /// Content source directory (markdown documents).
    #[serde(default = "defaults::build::content")]
    #[educe(Default = defaults::build::content())]
    pub content: PathBuf,

    /// Build output directory.
    #[serde(default = "defaults::build::output")]
    #[educe(Default = defaults::build::output())]
    pub output: PathBuf,

    /// Template directory (`<name>.html` layouts, `partials/<name>.html`).
    #[serde(default = "defaults::build::templates")]
    #[educe(Default = defaults::build::templates())]
    pub templates: PathBuf,

    /// Static assets directory, mirrored into the output root.
    #[serde(default = "defaults::build::assets")]
    #[educe(Default = defaults::build::assets())]
    pub assets: PathBuf,

    /// Build manifest location used by incremental builds.
    #[serde(default = "defaults::build::manifest")]
    #[educe(Default = defaults::build::manifest())]
    pub manifest: PathBuf,

    /// Output-relative path of the stylesheet produced by the external
    /// CSS tool. Linked into pages through `{{ stylesheet }}`.
    #[serde(default = "defaults::build::stylesheet")]
    #[educe(Default = defaults::build::stylesheet())]
    pub stylesheet: Option<PathBuf>,

    /// Template used when neither `layout` nor a directory convention applies.
    #[serde(default = "defaults::build::default_layout")]
    #[educe(Default = defaults::build::default_layout())]
    pub default_layout: String,

    /// Minify HTML output.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub minify: bool,

    /// Remove the output directory before building.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub clean: bool,

    /// Reuse pages whose fingerprint matches the manifest.
    #[serde(default = "defaults::r#false")]
    #[educe(Default = false)]
    pub incremental: bool,

    /// Worker threads for document processing (0 = available parallelism).
    #[serde(default = "defaults::build::jobs")]
    #[educe(Default = defaults::build::jobs())]
    pub jobs: usize,
}

impl BuildConfig {
    /// Stylesheet URL as linked from pages (`/assets/site.css`).
    pub fn stylesheet_url(&self) -> Option<String> {
        self.stylesheet.as_ref().map(|path| {
            let rel: Vec<_> = path
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            format!("/{}", rel.join("/"))
        })
    }
}
