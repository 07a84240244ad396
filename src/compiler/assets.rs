//! Static asset mirroring.
//!
//! `assets/<rel>` is copied to `<output>/<rel>`. Files whose destination is
//! at least as new as the source are left alone unless `force` is set.

use crate::{error::DocumentError, log, utils::fs::is_up_to_date};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use walkdir::WalkDir;

/// Files never copied.
const IGNORED_FILES: &[&str] = &[".DS_Store"];

#[derive(Debug, Default)]
pub struct AssetSummary {
    pub copied: usize,
    pub failures: Vec<(PathBuf, DocumentError)>,
}

/// All files below `dir`, sorted. Empty if `dir` does not exist.
pub fn collect_assets(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(|e| e.file_type().is_file())
        .filter(|e| {
            let name = e.file_name().to_str().unwrap_or_default();
            !IGNORED_FILES.contains(&name)
        })
        .map(walkdir::DirEntry::into_path)
        .collect()
}

/// Mirror every asset under `assets` into `output`.
pub fn mirror_assets(assets: &Path, output: &Path, force: bool) -> AssetSummary {
    let mut summary = AssetSummary::default();
    for path in collect_assets(assets) {
        match copy_asset(&path, assets, output, force) {
            Ok(true) => summary.copied += 1,
            Ok(false) => {}
            Err(err) => {
                let dest = destination(&path, assets, output);
                summary.failures.push((path, DocumentError::write(dest, err)));
            }
        }
    }
    summary
}

/// Copy one asset. Returns `false` when the destination was already current.
pub fn copy_asset(path: &Path, assets: &Path, output: &Path, force: bool) -> io::Result<bool> {
    let dest = destination(path, assets, output);
    if !force && is_up_to_date(path, &dest) {
        return Ok(false);
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(path, &dest)?;
    log!("assets"; "{}", path.strip_prefix(assets).unwrap_or(path).display());
    Ok(true)
}

fn destination(path: &Path, assets: &Path, output: &Path) -> PathBuf {
    output.join(path.strip_prefix(assets).unwrap_or(path))
}
