//! `[site]` section configuration.
//!
//! Values here are injected into every page through template slots
//! (`{{ site.title }}`, `{{ site.url }}`, ...).

use super::defaults;
use educe::Educe;
use serde::{Deserialize, Serialize};

/// `[site]` section in site.toml - site-wide metadata.
///
/// # Example
/// ```toml
/// [site]
/// title = "My Blog"
/// author = "Alice"
/// url = "https://myblog.com"
/// ```
#[derive(Debug, Clone, Educe, Serialize, Deserialize)]
#[educe(Default)]
#[serde(deny_unknown_fields)]
pub struct SiteSection {
    /// Site title, available as `{{ site.title }}`.
    #[serde(default)]
    pub title: String,

    /// Fallback author for documents without an `author` field.
    #[serde(default = "defaults::site::author")]
    #[educe(Default = defaults::site::author())]
    pub author: String,

    /// Base URL for absolute links.
    #[serde(default = "defaults::site::url")]
    #[educe(Default = defaults::site::url())]
    pub url: Option<String>,

    /// BCP 47 language code (e.g., "en", "zh-Hans").
    #[serde(default = "defaults::site::language")]
    #[educe(Default = defaults::site::language())]
    pub language: String,
}

#[cfg(test)]
mod tests {
    use super::super::SiteConfig;

    #[test]
    fn test_site_section_full() {
        let config = r#"
            [site]
            title = "Field Notes"
            author = "Alice"
            url = "https://notes.example.com"
            language = "en-GB"
        "#;
        let config: SiteConfig = toml::from_str(config).unwrap();

        assert_eq!(config.site.title, "Field Notes");
        assert_eq!(config.site.author, "Alice");
        assert_eq!(config.site.url.as_deref(), Some("https://notes.example.com"));
        assert_eq!(config.site.language, "en-GB");
    }

    #[test]
    fn test_site_section_defaults() {
        let config: SiteConfig = toml::from_str("[site]\ntitle = \"T\"").unwrap();

        assert_eq!(config.site.author, "");
        assert_eq!(config.site.language, "en");
        assert_eq!(config.site.url, None);
    }

    #[test]
    fn test_unknown_field_rejection() {
        let result: Result<SiteConfig, _> = toml::from_str("[site]\ncolour = \"red\"");
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn test_site_section_unicode() {
        let config: SiteConfig = toml::from_str("[site]\ntitle = \"博客 🚀\"\nauthor = \"René\"").unwrap();

        assert_eq!(config.site.title, "博客 🚀");
        assert_eq!(config.site.author, "René");
    }
}
