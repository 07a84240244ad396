//! File category classification for watch mode.
//!
//! Decides how a changed path feeds back into the build.
//!
//! | Category   | Rebuild Strategy                   | Example Files            |
//! |------------|------------------------------------|--------------------------|
//! | Content    | Only the changed document          | `content/**/*.md`        |
//! | Template   | Incremental pass over all docs     | `templates/**/*.html`    |
//! | Asset      | Copy the changed file              | `assets/**`              |
//! | Config     | Reload config, incremental pass    | `site.toml`              |
//! | Unknown    | Ignored                            | Files outside watch dirs |

use crate::config::SiteConfig;
use std::{
    env,
    path::{Path, PathBuf},
};

/// Category of a changed file, used to determine rebuild strategy in watch mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileCategory {
    Content,
    Template,
    Asset,
    Config,
    Unknown,
}

impl FileCategory {
    /// Short name used in logs
    pub const fn name(self) -> &'static str {
        match self {
            Self::Content => "content",
            Self::Template => "templates",
            Self::Asset => "assets",
            Self::Config => "config",
            Self::Unknown => "unknown",
        }
    }

    /// Watched location for this category.
    pub fn path(self, config: &SiteConfig) -> Option<PathBuf> {
        match self {
            Self::Content => Some(config.build.content.clone()),
            Self::Template => Some(config.build.templates.clone()),
            Self::Asset => Some(config.build.assets.clone()),
            Self::Config => Some(config.config_path.clone()),
            Self::Unknown => None,
        }
    }

    /// Returns true if this category represents a directory (vs a single file)
    pub const fn is_directory(self) -> bool {
        matches!(self, Self::Content | Self::Template | Self::Asset)
    }
}

/// Categorize a file path to determine how changes should be handled.
pub fn categorize_path(path: &Path, config: &SiteConfig) -> FileCategory {
    let path = normalize_path(path);

    if path == config.config_path {
        FileCategory::Config
    } else if path.starts_with(&config.build.templates) {
        FileCategory::Template
    } else if path.starts_with(&config.build.content) {
        FileCategory::Content
    } else if path.starts_with(&config.build.assets) {
        FileCategory::Asset
    } else {
        FileCategory::Unknown
    }
}

/// Normalize a path to absolute form for reliable comparison.
///
/// Config paths are already canonicalized, so incoming watcher paths are
/// canonicalized too. Deleted files cannot be canonicalized; their parent
/// directory is, when it still exists.
pub fn normalize_path(path: &Path) -> PathBuf {
    if let Ok(path) = path.canonicalize() {
        return path;
    }
    if let (Some(parent), Some(name)) = (path.parent(), path.file_name())
        && let Ok(parent) = parent.canonicalize()
    {
        return parent.join(name);
    }
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_at(root: &Path) -> SiteConfig {
        let mut config = SiteConfig::default();
        config.resolve_paths(root);
        config.config_path = root.join("site.toml");
        config
    }

    #[test]
    fn test_category_name() {
        assert_eq!(FileCategory::Content.name(), "content");
        assert_eq!(FileCategory::Template.name(), "templates");
        assert_eq!(FileCategory::Asset.name(), "assets");
        assert_eq!(FileCategory::Config.name(), "config");
        assert_eq!(FileCategory::Unknown.name(), "unknown");
    }

    #[test]
    fn test_is_directory() {
        assert!(FileCategory::Content.is_directory());
        assert!(FileCategory::Template.is_directory());
        assert!(FileCategory::Asset.is_directory());
        assert!(!FileCategory::Config.is_directory());
        assert!(!FileCategory::Unknown.is_directory());
    }

    #[test]
    fn test_categorize_path() {
        let root = Path::new("/srv/blog-that-does-not-exist");
        let config = config_at(root);

        assert_eq!(categorize_path(&root.join("content/posts/a.md"), &config), FileCategory::Content);
        assert_eq!(categorize_path(&root.join("templates/default.html"), &config), FileCategory::Template);
        assert_eq!(categorize_path(&root.join("assets/site.css"), &config), FileCategory::Asset);
        assert_eq!(categorize_path(&root.join("site.toml"), &config), FileCategory::Config);
        assert_eq!(categorize_path(&root.join("README.md"), &config), FileCategory::Unknown);
    }

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }
}
