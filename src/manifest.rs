//! Build manifest for incremental rebuilds.
//!
//! Maps each document id to the fingerprint it was last built with and the
//! page that build produced:
//!
//! ```json
//! {
//!   "version": 1,
//!   "entries": {
//!     "posts/hello.md": {
//!       "fingerprint": "9f2c…",
//!       "output": "posts/hello.html",
//!       "output_hash": "41ab…",
//!       "written_at": "2024-01-05T10:00:00Z"
//!     }
//!   }
//! }
//! ```
//!
//! Entries are kept in a `BTreeMap` so the serialized file only changes when
//! an entry does. The file is disposable: any problem reading it degrades
//! to an empty manifest and a full rebuild.

use crate::{
    log,
    template::Page,
    utils::{fs::write_atomic, hash::hex_digest},
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

/// On-disk format version. Older or newer files are discarded.
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManifestEntry {
    pub fingerprint: String,
    /// Page path relative to the output root, `/`-separated.
    pub output: String,
    /// BLAKE3 digest of the page bytes as written.
    pub output_hash: String,
    /// RFC 3339 timestamp of the write.
    pub written_at: String,
}

impl ManifestEntry {
    pub fn new(fingerprint: String, page: &Page) -> Self {
        let output = page
            .relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        Self {
            fingerprint,
            output,
            output_hash: hex_digest(&page.bytes),
            written_at: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn output_path(&self, output_root: &Path) -> PathBuf {
        output_root.join(&self.output)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BuildManifest {
    pub version: u32,
    pub entries: BTreeMap<String, ManifestEntry>,
}

impl Default for BuildManifest {
    fn default() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }
}

impl BuildManifest {
    /// Load the manifest at `path`.
    ///
    /// Never fails: a missing file is silently empty, an unreadable or
    /// corrupt one is logged and treated as empty.
    pub fn load(path: &Path) -> Self {
        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                log!("warn"; "cannot read manifest {}: {err}, rebuilding everything", path.display());
                return Self::default();
            }
        };

        match serde_json::from_slice::<Self>(&bytes) {
            Ok(manifest) if manifest.version == MANIFEST_VERSION => manifest,
            Ok(manifest) => {
                log!("warn"; "manifest version {} is not {MANIFEST_VERSION}, rebuilding everything", manifest.version);
                Self::default()
            }
            Err(err) => {
                log!("warn"; "corrupt manifest {}: {err}, rebuilding everything", path.display());
                Self::default()
            }
        }
    }

    /// Persist atomically as pretty JSON.
    pub fn save(&self, path: &Path) -> io::Result<()> {
        let mut bytes = serde_json::to_vec_pretty(self)?;
        bytes.push(b'\n');
        write_atomic(path, &bytes)
    }

    pub fn get(&self, id: &str) -> Option<&ManifestEntry> {
        self.entries.get(id)
    }

    pub fn insert(&mut self, id: impl Into<String>, entry: ManifestEntry) {
        self.entries.insert(id.into(), entry);
    }

    pub fn remove(&mut self, id: &str) -> Option<ManifestEntry> {
        self.entries.remove(id)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Whether `id` can be reused: same fingerprint, and the recorded page
    /// is still on disk with the recorded hash.
    pub fn is_fresh(&self, id: &str, fingerprint: &str, output_root: &Path) -> bool {
        let Some(entry) = self.get(id) else {
            return false;
        };
        entry.fingerprint == fingerprint
            && fs::read(entry.output_path(output_root))
                .is_ok_and(|bytes| hex_digest(&bytes) == entry.output_hash)
    }
}
