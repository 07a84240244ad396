//! File system watcher for live rebuilds.
//!
//! Monitors content, template and asset directories plus the config file,
//! and feeds debounced batches of changed paths back into the build.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌───────────┐    ┌──────────────────────────────┐
//! │ notify   │───▶│ Debouncer │───▶│ plan_changes() → rebuild()   │
//! │ events   │    │ (300ms)   │    │                              │
//! └──────────┘    └───────────┘    │  config    → reload + site   │
//!                                  │  templates → site            │
//!                                  │  content   → changed docs    │
//!                                  │  assets    → copy files      │
//!                                  └──────────────────────────────┘
//! ```
//!
//! Batches run synchronously on the watcher thread, so builds never
//! overlap. Site builds here are always incremental.

use crate::{
    build::{build_asset, build_documents, build_site},
    config::{SiteConfig, cfg, reload_config},
    content::is_content_file,
    log,
    utils::{
        category::{FileCategory, categorize_path},
        signal,
    },
};
use anyhow::{Context, Result};
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const REBUILD_COOLDOWN_MS: u64 = 800;

const WATCH_CATEGORIES: &[FileCategory] = &[
    FileCategory::Content,
    FileCategory::Template,
    FileCategory::Asset,
    FileCategory::Config,
];

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

/// `/site/content/posts/a.md` → `content/posts/a.md`
fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and rebuild cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_rebuild
            .is_some_and(|t| t.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        for path in event.paths {
            if !is_temp_file(&path) {
                self.pending.insert(path);
            }
        }
        self.last_event = Some(Instant::now());
    }

    /// Pending paths have settled and the last rebuild's cooldown is over.
    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && !self.in_cooldown()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    /// Drain pending paths, sorted for a stable rebuild order.
    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        let mut paths: Vec<_> = self.pending.drain().collect();
        paths.sort();
        paths
    }

    fn mark_rebuild(&mut self) {
        self.last_rebuild = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Rebuild Planning
// =============================================================================

/// What one batch of changes requires.
#[derive(Debug, Default, PartialEq, Eq)]
struct Plan {
    config: bool,
    /// Rebuild every document (templates changed, or content structure did).
    site: bool,
    content: Vec<PathBuf>,
    assets: Vec<PathBuf>,
}

impl Plan {
    fn is_empty(&self) -> bool {
        !self.config && !self.site && self.content.is_empty() && self.assets.is_empty()
    }
}

fn plan_changes(paths: &[PathBuf], config: &SiteConfig) -> Plan {
    let mut plan = Plan::default();

    for path in paths {
        match categorize_path(path, config) {
            FileCategory::Config => plan.config = true,
            FileCategory::Template => plan.site = true,
            FileCategory::Content if is_content_file(path) => plan.content.push(path.clone()),
            // A directory appeared or vanished: rescan everything.
            FileCategory::Content if path.is_dir() || path.extension().is_none() => plan.site = true,
            FileCategory::Asset => plan.assets.push(path.clone()),
            FileCategory::Content | FileCategory::Unknown => {}
        }
    }
    plan
}

/// Run one batch. Returns true when a build ran (for cooldown).
fn handle_changes(paths: &[PathBuf]) -> bool {
    let config = cfg();
    let plan = plan_changes(paths, &config);
    if plan.is_empty() {
        return false;
    }

    let root = config.get_root();
    let names: Vec<_> = paths.iter().map(|p| rel_path(p, root)).collect();
    log!("watch"; "{} changed", names.join(", "));

    if plan.config {
        match reload_config() {
            Ok(true) => log!("watch"; "config reloaded"),
            Ok(false) => {}
            Err(err) => {
                log!("error"; "config reload failed: {err:#}");
                return false;
            }
        }
    }
    let config = cfg();

    for asset in &plan.assets {
        if let Err(err) = build_asset(&config, asset) {
            log!("error"; "{err:#}");
        }
    }

    let result = if plan.config || plan.site {
        build_site(&config, signal::interrupted()).map(|_| ())
    } else if !plan.content.is_empty() {
        build_documents(&config, &plan.content, signal::interrupted()).map(|_| ())
    } else {
        Ok(())
    };

    if let Err(err) = result {
        log!("error"; "build failed: {err:#}");
    }
    true
}

// =============================================================================
// Watcher Setup
// =============================================================================

fn setup_watchers(watcher: &mut impl Watcher, config: &SiteConfig) -> Result<()> {
    let root = config.get_root();
    let mut watched = Vec::new();

    for &cat in WATCH_CATEGORIES {
        if let Some(path) = cat.path(config)
            && path.exists()
        {
            let mode = if cat.is_directory() {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };

            watcher
                .watch(&path, mode)
                .with_context(|| format!("Failed to watch {}: {}", cat.name(), path.display()))?;
            watched.push(rel_path(&path, root));
        }
    }

    log!("watch"; "watching {}", watched.join(", "));
    Ok(())
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Start blocking file watcher with debouncing and live rebuild.
///
/// Returns when the event channel closes or Ctrl+C is pressed.
pub fn watch_for_changes_blocking() -> Result<()> {
    let config = cfg();
    if !config.serve.watch {
        return Ok(());
    }

    let (tx, rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    setup_watchers(&mut watcher, &config)?;

    let mut debouncer = Debouncer::new();

    while !signal::interrupted().load(std::sync::atomic::Ordering::Relaxed) {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take()) {
                    debouncer.mark_rebuild();
                }
            }
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}
