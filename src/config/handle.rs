//! Global config with atomic reload support.
//!
//! Uses `arc-swap` for lock-free reads and atomic config replacement,
//! so `site.toml` can be reloaded while `serve` is watching.
//!
//! ```text
//!   rayon workers ──► cfg() (lock-free load)
//!   watch thread  ──► reload_config() (atomic replace)
//! ```
//!
//! Readers holding an older `Arc` keep a consistent snapshot for the rest
//! of their build.

use super::SiteConfig;
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use std::{
    fs,
    sync::{
        Arc, LazyLock,
        atomic::{AtomicU64, Ordering},
    },
};

/// Global config storage, replaced with the loaded config in `main`.
pub static CONFIG: LazyLock<ArcSwap<SiteConfig>> =
    LazyLock::new(|| ArcSwap::from_pointee(SiteConfig::default()));

/// Hash of the config file content last loaded.
static CONFIG_HASH: AtomicU64 = AtomicU64::new(0);

/// Get current config as `Arc<SiteConfig>`.
#[inline]
pub fn cfg() -> Arc<SiteConfig> {
    CONFIG.load_full()
}

/// Initialize global config (called once at startup).
pub fn init_config(config: SiteConfig) {
    if let Ok(content) = fs::read(&config.config_path) {
        CONFIG_HASH.store(crate::utils::hash::compute(&content), Ordering::Relaxed);
    }
    CONFIG.store(Arc::new(config));
}

/// Replace config atomically (called when site.toml changes).
///
/// Returns `true` if config was actually updated, `false` if the file
/// content matches the last load.
pub fn reload_config() -> Result<bool> {
    let current = cfg();
    let cli = current
        .cli
        .context("config was initialized without CLI arguments")?;

    // Removed config file means defaults, same as at startup.
    let content = fs::read(&current.config_path).unwrap_or_default();
    let new_hash = crate::utils::hash::compute(&content);
    if new_hash == CONFIG_HASH.load(Ordering::Relaxed) {
        return Ok(false);
    }

    let new_config = SiteConfig::load(cli)?;
    CONFIG.store(Arc::new(new_config));
    CONFIG_HASH.store(new_hash, Ordering::Relaxed);

    Ok(true)
}
