//! Site building orchestration.
//!
//! # Architecture
//!
//! ```text
//! build_site()
//!     │
//!     ├── clean / check output is writable (fatal on failure)
//!     ├── TemplateRegistry::load()         (fatal on failure)
//!     ├── BuildManifest::load()            (never fatal)
//!     │
//!     ├── rayon pool: Pipeline::process()  one Outcome per document
//!     │
//!     ├── apply outcomes → next manifest   (this thread only)
//!     ├── remove stale pages
//!     ├── mirror assets
//!     └── save manifest
//! ```
//!
//! Workers never touch the manifest. Cancelling stops dispatch; documents
//! already running finish, the rest are reported as cancelled and keep
//! their previous manifest entries.
//!
//! Two sources mapping to the same page (`a.md` and `a.markdown`) collide:
//! the first in discovery order owns the page, the others fail with a
//! `WriteError` and never enter the manifest.

use crate::{
    compiler::{
        BuildReport, DocState, Outcome, Pipeline, Step,
        assets::{copy_asset, mirror_assets},
    },
    config::SiteConfig,
    content::{ContentLoader, is_content_file, is_partial},
    error::DocumentError,
    log,
    logger::Progress,
    manifest::BuildManifest,
    render::Renderer,
    template::{Composer, SiteContext, TemplateRegistry, output_relative},
    utils::fs::remove_if_exists,
};
use anyhow::{Context, Result};
use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use std::{
    fs, io,
    path::{Path, PathBuf},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
};

const WRITE_CHECK_FILE: &str = ".inkpress-write-check";

/// Whether unchanged documents may be reused from the manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BuildMode {
    Full,
    Incremental,
}

impl BuildMode {
    pub fn from_config(config: &SiteConfig) -> Self {
        if config.build.incremental && !config.build.clean {
            Self::Incremental
        } else {
            Self::Full
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Incremental => "incremental",
        }
    }
}

/// Build the whole site.
///
/// Returns `Err` only for build-scoped failures: an unusable output root,
/// unreadable templates, or a worker pool that cannot start. Document
/// failures are collected in the report.
pub fn build_site(config: &SiteConfig, cancel: &AtomicBool) -> Result<BuildReport> {
    build_site_observed(config, cancel, |_| {})
}

/// [`build_site`], calling `observe` on a worker after each processed document.
fn build_site_observed(
    config: &SiteConfig,
    cancel: &AtomicBool,
    observe: impl Fn(&Outcome) + Sync,
) -> Result<BuildReport> {
    let loader = ContentLoader::new(&config.build.content);
    if !loader.root().is_dir() {
        log!("warn"; "content directory {} does not exist", loader.root().display());
    }
    let paths: Vec<PathBuf> = loader.discover().collect();

    if cancel.load(Ordering::Relaxed) {
        return Ok(cancelled_report(&loader, &paths));
    }

    let output = &config.build.output;
    if config.build.clean && output.exists() {
        fs::remove_dir_all(output)
            .with_context(|| format!("failed to clear output directory {}", output.display()))?;
    }

    let mode = BuildMode::from_config(config);
    let session = Session::open(config, loader, &paths)?;
    log!("build"; "{} documents ({} build)", paths.len(), mode.name());
    if mode == BuildMode::Incremental && session.previous.is_empty() {
        log!("build"; "no usable manifest, every document is rebuilt");
    }

    let progress = Progress::start("documents", paths.len());
    let outcomes = session.run(&paths, mode, config.build.jobs, cancel, &|outcome| {
        if let Some(progress) = &progress {
            progress.tick();
        }
        observe(outcome);
    });
    if let Some(progress) = progress {
        progress.finish();
    }
    let outcomes = outcomes?;
    let mut report = BuildReport::default();
    let mut next = BuildManifest::default();
    for outcome in &outcomes {
        apply(&mut next, &session.previous, outcome);
        report.record(outcome);
    }
    report.removed = remove_stale(&session.previous, &next, output);

    if report.cancelled == 0 {
        let assets = mirror_assets(&config.build.assets, output, config.build.clean);
        report.assets = assets.copied;
        for (path, err) in &assets.failures {
            report.record_failure(path, err);
        }
    }

    save_manifest(&next, &config.build.manifest);
    report.log_summary();
    Ok(report)
}

/// Rebuild only `changed` content paths, incrementally.
///
/// Paths that no longer exist have their page and manifest entry removed.
/// Every other manifest entry is carried over untouched.
pub fn build_documents(config: &SiteConfig, changed: &[PathBuf], cancel: &AtomicBool) -> Result<BuildReport> {
    let loader = ContentLoader::new(&config.build.content);
    let all: Vec<PathBuf> = loader.discover().collect();
    let session = Session::open(config, loader, &all)?;
    let output = &config.build.output;

    let mut next = session.previous.clone();
    let mut present = Vec::new();
    for path in changed.iter().filter(|p| is_content_file(p)) {
        next.remove(&session.loader.id_of(path));
        if path.is_file() {
            present.push(path.clone());
        }
    }

    let outcomes = session.run(&present, BuildMode::Incremental, config.build.jobs, cancel, &|_| {})?;
    let mut report = BuildReport::default();
    for outcome in &outcomes {
        apply(&mut next, &session.previous, outcome);
        report.record(outcome);
    }
    report.removed = remove_stale(&session.previous, &next, output);

    save_manifest(&next, &config.build.manifest);
    report.log_summary();
    Ok(report)
}

/// Copy one changed asset into the output root.
pub fn build_asset(config: &SiteConfig, path: &Path) -> Result<()> {
    if path.is_file() {
        copy_asset(path, &config.build.assets, &config.build.output, true)
            .with_context(|| format!("failed to copy asset {}", path.display()))?;
    }
    Ok(())
}

/// Shared, read-only state of one build.
struct Session {
    loader: ContentLoader,
    composer: Composer,
    previous: BuildManifest,
    output: PathBuf,
    /// Page path relative to the output root → id of the owning source.
    owners: FxHashMap<PathBuf, String>,
}

impl Session {
    /// `sources` is every discovered content path, in discovery order.
    fn open(config: &SiteConfig, loader: ContentLoader, sources: &[PathBuf]) -> Result<Self> {
        let output = config.build.output.clone();
        prepare_output(&output)?;

        let registry = TemplateRegistry::load(&config.build.templates, &config.build.default_layout)
            .context("failed to load templates")?;
        log!("build"; "{} layouts from {}", registry.layout_count(), config.build.templates.display());
        let composer = Composer::new(
            Arc::new(registry),
            SiteContext::from_config(config),
            &output,
            config.build.minify,
        );

        let mut owners = FxHashMap::default();
        for path in sources.iter().filter(|p| !is_partial(p)) {
            let id = loader.id_of(path);
            owners.entry(output_relative(&id)).or_insert(id);
        }

        Ok(Self {
            loader,
            composer,
            previous: BuildManifest::load(&config.build.manifest),
            output,
            owners,
        })
    }

    /// Fail `path` if another source owns the page it would produce.
    fn collision(&self, path: &Path) -> Option<Outcome> {
        if is_partial(path) {
            return None;
        }
        let id = self.loader.id_of(path);
        let relative = output_relative(&id);
        let owner = self.owners.get(&relative)?;
        if *owner == id {
            return None;
        }

        let output = self.output.join(&relative);
        let source = io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("page already produced by `{owner}`"),
        );
        Some(Outcome {
            id,
            source: path.to_path_buf(),
            state: DocState::WriteFailed,
            step: Step::Failed(DocumentError::write(output, source)),
        })
    }

    /// Process `paths` on a bounded pool. Outcomes keep the input order.
    ///
    /// `on_done` runs on the worker after every processed document.
    fn run(
        &self,
        paths: &[PathBuf],
        mode: BuildMode,
        jobs: usize,
        cancel: &AtomicBool,
        on_done: &(dyn Fn(&Outcome) + Sync),
    ) -> Result<Vec<Outcome>> {
        let pipeline = Pipeline {
            loader: &self.loader,
            renderer: Renderer::new(),
            composer: &self.composer,
            previous: &self.previous,
            output_root: &self.output,
            incremental: mode == BuildMode::Incremental,
        };

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(jobs)
            .build()
            .context("failed to start worker pool")?;

        Ok(pool.install(|| {
            paths
                .par_iter()
                .map(|path| {
                    if cancel.load(Ordering::Relaxed) {
                        return Outcome::cancelled(self.loader.id_of(path), path.clone());
                    }
                    let outcome = self.collision(path).unwrap_or_else(|| pipeline.process(path));
                    on_done(&outcome);
                    outcome
                })
                .collect()
        }))
    }
}

/// Create the output root and prove it is writable.
fn prepare_output(output: &Path) -> Result<()> {
    fs::create_dir_all(output)
        .with_context(|| format!("cannot create output directory {}", output.display()))?;

    let marker = output.join(WRITE_CHECK_FILE);
    fs::write(&marker, b"")
        .and_then(|()| fs::remove_file(&marker))
        .with_context(|| format!("output directory {} is not writable", output.display()))
}

/// Fold one outcome into the manifest being built.
fn apply(next: &mut BuildManifest, previous: &BuildManifest, outcome: &Outcome) {
    match &outcome.step {
        Step::Written(entry) => next.insert(&outcome.id, entry.clone()),
        Step::Reused | Step::Cancelled => {
            if let Some(entry) = previous.get(&outcome.id) {
                next.insert(&outcome.id, entry.clone());
            }
        }
        Step::Skipped | Step::Failed(_) => {}
    }
}

/// Delete pages recorded in `previous` that `next` no longer accounts for.
fn remove_stale(previous: &BuildManifest, next: &BuildManifest, output: &Path) -> usize {
    let live: FxHashSet<&str> = next.entries.values().map(|e| e.output.as_str()).collect();
    let mut removed = 0;

    for (id, entry) in &previous.entries {
        if next.get(id).is_some() || live.contains(entry.output.as_str()) {
            continue;
        }
        match remove_if_exists(&entry.output_path(output)) {
            Ok(()) => {
                log!("build"; "removed {}", entry.output);
                removed += 1;
            }
            Err(err) => log!("warn"; "cannot remove {}: {err}", entry.output),
        }
    }
    removed
}

fn save_manifest(manifest: &BuildManifest, path: &Path) {
    if let Err(err) = manifest.save(path) {
        log!("warn"; "cannot save manifest {}: {err}", path.display());
    }
}

fn cancelled_report(loader: &ContentLoader, paths: &[PathBuf]) -> BuildReport {
    let mut report = BuildReport::default();
    for path in paths {
        report.record(&Outcome::cancelled(loader.id_of(path), path.clone()));
    }
    log!("build"; "cancelled before any document was dispatched");
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compiler::DocState;
    use std::collections::BTreeMap;
    use tempfile::TempDir;
    use walkdir::WalkDir;

    const A: &str = "---\ntitle: A\ndate: 2024-01-05\n---\n# Alpha\n\nText.\n";
    const B: &str = "---\ntitle: B\ndate: 2024-01-06\nlayout: special\n---\nBody\n";
    const C: &str = "---\ndate: 2024-01-07\n---\nNo title\n";

    struct Site {
        dir: TempDir,
        config: SiteConfig,
    }

    impl Site {
        fn new() -> Self {
            let dir = TempDir::new().unwrap();
            fs::create_dir_all(dir.path().join("content")).unwrap();
            let mut config = SiteConfig::default();
            config.resolve_paths(dir.path());
            config.site.title = "Test Site".into();
            Self { dir, config }
        }

        fn incremental(mut self) -> Self {
            self.config.build.incremental = true;
            self
        }

        fn write(&self, rel: &str, text: &str) {
            let path = self.dir.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, text).unwrap();
        }

        fn content(&self, rel: &str) -> PathBuf {
            self.config.build.content.join(rel)
        }

        fn build(&self) -> BuildReport {
            build_site(&self.config, &AtomicBool::new(false)).unwrap()
        }

        fn output(&self, rel: &str) -> PathBuf {
            self.config.build.output.join(rel)
        }

        fn manifest_bytes(&self) -> Vec<u8> {
            fs::read(&self.config.build.manifest).unwrap()
        }

        /// Every file in the output root, relative path → bytes.
        fn snapshot(&self) -> BTreeMap<PathBuf, Vec<u8>> {
            let root = &self.config.build.output;
            WalkDir::new(root)
                .into_iter()
                .filter_map(Result::ok)
                .filter(|e| e.file_type().is_file())
                .map(|e| {
                    let rel = e.path().strip_prefix(root).unwrap().to_path_buf();
                    (rel, fs::read(e.path()).unwrap())
                })
                .collect()
        }
    }

    #[test]
    fn test_scenario_mixed_results() {
        let site = Site::new();
        site.write("content/a.md", A);
        site.write("content/b.md", B);
        site.write("content/c.md", C);

        let report = site.build();

        assert_eq!(report.state("a.md"), Some(DocState::Written));
        assert_eq!(report.state("b.md"), Some(DocState::ComposeFailed));
        assert_eq!(report.state("c.md"), Some(DocState::LoadFailed));
        let kinds: Vec<_> = report.failures.iter().map(|f| f.kind).collect();
        assert_eq!(kinds, ["TemplateNotFound", "MissingRequiredField"]);
        assert_eq!(report.exit_code(), 1);

        let pages: Vec<_> = site.snapshot().into_keys().collect();
        assert_eq!(pages, [PathBuf::from("a.html")]);
    }

    #[test]
    fn test_success_exit_code() {
        let site = Site::new();
        site.write("content/a.md", A);
        let report = site.build();
        assert_eq!(report.exit_code(), 0);
        assert_eq!(report.written, 1);
    }

    #[test]
    fn test_page_layout_and_location() {
        let site = Site::new();
        site.write("content/posts/hello.md", A);
        site.write("templates/posts.html", "<h1>{{ title }}</h1>{{ content }}<i>{{ site.title }}</i>");

        site.build();

        assert_eq!(
            fs::read_to_string(site.output("posts/hello.html")).unwrap(),
            "<h1>A</h1><h1 id=\"alpha\">Alpha</h1>\n<p>Text.</p>\n<i>Test Site</i>"
        );
    }

    #[test]
    fn test_full_builds_are_idempotent() {
        let site = Site::new();
        site.write("content/a.md", A);
        site.write("content/posts/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\n```rust\nlet x = 1;\n```\n");

        site.build();
        let first = site.snapshot();
        site.build();

        assert_eq!(first, site.snapshot());
        assert_eq!(first.len(), 2);
    }

    #[test]
    fn test_incremental_no_change_keeps_manifest() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB\n");

        let first = site.build();
        assert_eq!(first.written, 2);
        let manifest = site.manifest_bytes();
        let pages = site.snapshot();

        let second = site.build();

        assert_eq!(second.written, 0);
        assert_eq!(second.reused, 2);
        assert_eq!(site.manifest_bytes(), manifest);
        assert_eq!(site.snapshot(), pages);
    }

    #[test]
    fn test_incremental_matches_full_output() {
        let full = Site::new();
        let incremental = Site::new().incremental();
        for site in [&full, &incremental] {
            site.write("content/a.md", A);
            site.write("content/notes/n.md", "---\ntitle: N\ndate: 2024-03-01\n---\n- one\n- two\n");
        }

        full.build();
        incremental.build();
        incremental.build();

        assert_eq!(full.snapshot(), incremental.snapshot());
    }

    #[test]
    fn test_changed_document_is_rebuilt() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB\n");
        site.build();

        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB changed\n");
        let report = site.build();

        assert_eq!(report.written, 1);
        assert_eq!(report.reused, 1);
        assert!(fs::read_to_string(site.output("b.html")).unwrap().contains("B changed"));
    }

    #[test]
    fn test_template_change_invalidates() {
        let site = Site::new().incremental();
        site.write("templates/default.html", "<main>{{ content }}</main>");
        site.write("content/a.md", A);
        site.build();

        site.write("templates/default.html", "<article>{{ content }}</article>");
        let report = site.build();

        assert_eq!(report.written, 1);
        assert!(fs::read_to_string(site.output("a.html")).unwrap().starts_with("<article>"));
    }

    #[test]
    fn test_partial_change_invalidates() {
        let site = Site::new().incremental();
        site.write("templates/default.html", "{{ nav }}{{ content }}");
        site.write("templates/partials/nav.html", "<nav>v1</nav>");
        site.write("content/a.md", A);
        site.build();

        site.write("templates/partials/nav.html", "<nav>v2</nav>");
        let report = site.build();

        assert_eq!(report.written, 1);
        assert!(fs::read_to_string(site.output("a.html")).unwrap().starts_with("<nav>v2</nav>"));
    }

    #[test]
    fn test_edited_output_is_rewritten() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.build();

        fs::write(site.output("a.html"), "tampered").unwrap();
        let report = site.build();

        assert_eq!(report.written, 1);
        assert_ne!(fs::read_to_string(site.output("a.html")).unwrap(), "tampered");
    }

    #[test]
    fn test_deleted_document_page_removed() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.write("content/old.md", "---\ntitle: Old\ndate: 2020-01-01\n---\nOld\n");
        site.build();
        assert!(site.output("old.html").exists());

        fs::remove_file(site.content("old.md")).unwrap();
        let report = site.build();

        assert_eq!(report.removed, 1);
        assert!(!site.output("old.html").exists());
        assert!(site.output("a.html").exists());
        let manifest = BuildManifest::load(&site.config.build.manifest);
        assert!(manifest.get("old.md").is_none());
        assert!(manifest.get("a.md").is_some());
    }

    #[test]
    fn test_draft_and_failing_documents_lose_their_page() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB\n");
        site.build();

        site.write("content/a.md", "---\ntitle: A\ndate: 2024-01-05\ndraft: true\n---\n");
        site.write("content/b.md", "---\ndate: 2024-02-01\n---\n");
        let report = site.build();

        assert_eq!(report.skipped, 1);
        assert_eq!(report.failures.len(), 1);
        assert!(!site.output("a.html").exists());
        assert!(!site.output("b.html").exists());
        assert!(BuildManifest::load(&site.config.build.manifest).is_empty());
    }

    #[test]
    fn test_partial_failure_isolation() {
        let site = Site::new();
        site.write("content/bad.md", "---\ntitle: [unclosed\n---\n");
        site.write("content/good.md", A);

        let report = site.build();

        assert_eq!(report.state("bad.md"), Some(DocState::LoadFailed));
        assert_eq!(report.failures[0].kind, "MalformedMetadata");
        assert!(site.output("good.html").exists());
    }

    #[test]
    fn test_cancel_before_dispatch() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.build();
        let manifest = site.manifest_bytes();
        let pages = site.snapshot();

        site.write("content/a.md", "---\ntitle: A2\ndate: 2024-01-05\n---\nchanged\n");
        site.write("content/b.md", A);
        let report = build_site(&site.config, &AtomicBool::new(true)).unwrap();

        assert_eq!(report.cancelled, 2);
        assert_eq!(report.state("b.md"), Some(DocState::Cancelled));
        assert_eq!(report.exit_code(), 130);
        assert_eq!(site.manifest_bytes(), manifest);
        assert_eq!(site.snapshot(), pages);
    }

    #[test]
    fn test_cancel_mid_dispatch() {
        let mut site = Site::new().incremental();
        site.config.build.jobs = 1;
        for name in ["a", "b", "c"] {
            site.write(&format!("content/{name}.md"), A);
        }
        site.build();
        let before = BuildManifest::load(&site.config.build.manifest);

        for name in ["a", "b", "c"] {
            site.write(
                &format!("content/{name}.md"),
                &format!("---\ntitle: New\ndate: 2024-01-05\n---\nnew {name}\n"),
            );
        }
        let cancel = AtomicBool::new(false);
        let report =
            build_site_observed(&site.config, &cancel, |_| cancel.store(true, Ordering::Relaxed)).unwrap();

        assert_eq!(report.state("a.md"), Some(DocState::Written));
        assert_eq!(report.written, 1);
        assert_eq!(report.state("b.md"), Some(DocState::Cancelled));
        assert_eq!(report.state("c.md"), Some(DocState::Cancelled));
        assert_eq!(report.exit_code(), 130);

        assert!(fs::read_to_string(site.output("a.html")).unwrap().contains("new a"));
        for page in ["b.html", "c.html"] {
            let html = fs::read_to_string(site.output(page)).unwrap();
            assert!(html.contains("Text.") && !html.contains("new"), "{page}");
        }

        let after = BuildManifest::load(&site.config.build.manifest);
        assert_ne!(after.get("a.md"), before.get("a.md"));
        assert_eq!(after.get("b.md"), before.get("b.md"));
        assert_eq!(after.get("c.md"), before.get("c.md"));
    }

    #[test]
    fn test_output_collision_first_source_wins() {
        let site = Site::new().incremental();
        site.write("content/a.markdown", "---\ntitle: Long\ndate: 2024-01-05\n---\nfrom markdown\n");
        site.write("content/a.md", "---\ntitle: Short\ndate: 2024-01-05\n---\nfrom md\n");

        let first = site.build();
        assert_eq!(first.written, 1);
        assert_eq!(first.state("a.md"), Some(DocState::WriteFailed));
        assert_eq!(first.failures.len(), 1);
        assert_eq!(first.failures[0].path, site.content("a.md"));
        assert!(first.failures[0].message.contains("already produced by `a.markdown`"));
        let manifest = site.manifest_bytes();

        let second = site.build();
        assert_eq!(second.reused, 1);
        assert_eq!(second.written, 0);
        assert_eq!(second.failures.len(), 1);
        assert_eq!(site.manifest_bytes(), manifest);
        assert!(fs::read_to_string(site.output("a.html")).unwrap().contains("from markdown"));

        let ids: Vec<_> = BuildManifest::load(&site.config.build.manifest).ids().map(str::to_owned).collect();
        assert_eq!(ids, ["a.markdown"]);
    }

    #[test]
    fn test_build_documents_respects_owner() {
        let site = Site::new().incremental();
        site.write("content/a.markdown", "---\ntitle: Long\ndate: 2024-01-05\n---\nfrom markdown\n");
        site.build();

        site.write("content/a.md", "---\ntitle: Short\ndate: 2024-01-05\n---\nfrom md\n");
        let report =
            build_documents(&site.config, &[site.content("a.md")], &AtomicBool::new(false)).unwrap();

        assert_eq!(report.state("a.md"), Some(DocState::WriteFailed));
        assert_eq!(report.removed, 0);
        assert!(fs::read_to_string(site.output("a.html")).unwrap().contains("from markdown"));
    }

    #[test]
    fn test_clean_removes_unknown_files() {
        let mut site = Site::new();
        site.write("content/a.md", A);
        site.write("public/leftover.html", "old");
        site.config.build.clean = true;

        site.build();

        assert!(!site.output("leftover.html").exists());
        assert!(site.output("a.html").exists());
    }

    #[test]
    fn test_assets_mirrored() {
        let site = Site::new();
        site.write("content/a.md", A);
        site.write("assets/css/site.css", "body{}");

        let report = site.build();

        assert_eq!(report.assets, 1);
        assert_eq!(fs::read_to_string(site.output("css/site.css")).unwrap(), "body{}");
    }

    #[test]
    fn test_unusable_output_root_is_fatal() {
        let mut site = Site::new();
        site.write("content/a.md", A);
        site.write("blocker", "file");
        site.config.build.output = site.dir.path().join("blocker/public");

        assert!(build_site(&site.config, &AtomicBool::new(false)).is_err());
    }

    #[test]
    fn test_broken_template_is_fatal() {
        let site = Site::new();
        site.write("content/a.md", A);
        site.write("templates/default.html", "<p>no content slot</p>");

        assert!(build_site(&site.config, &AtomicBool::new(false)).is_err());
        assert!(!site.output("a.html").exists());
    }

    #[test]
    fn test_corrupt_manifest_forces_rebuild() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.build();
        fs::write(&site.config.build.manifest, "garbage").unwrap();

        let report = site.build();

        assert_eq!(report.written, 1);
        assert!(BuildManifest::load(&site.config.build.manifest).get("a.md").is_some());
    }

    #[test]
    fn test_build_documents_targets_changed_paths() {
        let site = Site::new().incremental();
        site.write("content/a.md", A);
        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB\n");
        site.build();

        site.write("content/b.md", "---\ntitle: B\ndate: 2024-02-01\n---\nB2\n");
        fs::remove_file(site.content("a.md")).unwrap();
        let changed = [site.content("a.md"), site.content("b.md")];

        let report = build_documents(&site.config, &changed, &AtomicBool::new(false)).unwrap();

        assert_eq!(report.written, 1);
        assert_eq!(report.removed, 1);
        assert!(!site.output("a.html").exists());
        assert!(fs::read_to_string(site.output("b.html")).unwrap().contains("B2"));

        let manifest = BuildManifest::load(&site.config.build.manifest);
        assert_eq!(manifest.ids().collect::<Vec<_>>(), ["b.md"]);
    }

    #[test]
    fn test_build_mode() {
        let mut config = SiteConfig::default();
        assert_eq!(BuildMode::from_config(&config), BuildMode::Full);
        config.build.incremental = true;
        assert_eq!(BuildMode::from_config(&config), BuildMode::Incremental);
        config.build.clean = true;
        assert_eq!(BuildMode::from_config(&config), BuildMode::Full);
    }
}
