//! Single-document pipeline: load, select template, render, compose, write.
//!
//! Runs on worker threads. Reads the previous manifest but never mutates
//! it; every decision is returned as an [`Outcome`] for the orchestrator to
//! apply.

use super::DocState;
use crate::{
    content::{ContentLoader, is_partial},
    error::DocumentError,
    manifest::{BuildManifest, ManifestEntry},
    render::Renderer,
    template::Composer,
    utils::fs::write_atomic,
};
use std::path::{Path, PathBuf};

/// What happened to one document.
#[derive(Debug)]
pub enum Step {
    /// A new page was written.
    Written(ManifestEntry),
    /// Fingerprint and output matched the manifest; nothing was written.
    Reused,
    /// Partial or draft.
    Skipped,
    Failed(DocumentError),
    Cancelled,
}

#[derive(Debug)]
pub struct Outcome {
    pub id: String,
    pub source: PathBuf,
    pub state: DocState,
    pub step: Step,
}

impl Outcome {
    pub fn cancelled(id: String, source: PathBuf) -> Self {
        Self {
            id,
            source,
            state: DocState::Cancelled,
            step: Step::Cancelled,
        }
    }
}

/// Everything a worker needs, shared by reference.
pub struct Pipeline<'a> {
    pub loader: &'a ContentLoader,
    pub renderer: Renderer,
    pub composer: &'a Composer,
    pub previous: &'a BuildManifest,
    pub output_root: &'a Path,
    /// Reuse pages whose fingerprint matches `previous`.
    pub incremental: bool,
}

type Failed = (DocState, DocumentError);

impl Pipeline<'_> {
    pub fn process(&self, path: &Path) -> Outcome {
        let id = self.loader.id_of(path);
        let (state, step) = match self.run(path) {
            Ok((state, step)) => (state, step),
            Err((state, error)) => (state, Step::Failed(error)),
        };

        Outcome {
            id,
            source: path.to_path_buf(),
            state,
            step,
        }
    }

    fn run(&self, path: &Path) -> Result<(DocState, Step), Failed> {
        if is_partial(path) {
            return Ok((DocState::Skipped, Step::Skipped));
        }

        let mut state = DocState::Discovered;
        let doc = self.loader.load(path).map_err(|err| (state.failure(), err))?;
        state = DocState::Loaded;
        if doc.metadata.is_draft() {
            return Ok((DocState::Skipped, Step::Skipped));
        }

        let template = self.composer.select(&doc);
        let fingerprint = template.as_ref().ok().map(|t| self.composer.fingerprint(&doc, t));
        if self.incremental
            && let Some(fingerprint) = &fingerprint
            && self.previous.is_fresh(&doc.id, fingerprint, self.output_root)
        {
            return Ok((DocState::Written, Step::Reused));
        }

        let rendered = self
            .renderer
            .render(&doc.body)
            .map_err(|err| (state.failure(), err.into()))?;
        state = DocState::Rendered;

        let template = template.map_err(|err| (state.failure(), err))?;
        let fingerprint = fingerprint.unwrap_or_else(|| self.composer.fingerprint(&doc, template));
        let page = self.composer.compose(&doc, &rendered, template);
        state = DocState::Composed;

        write_atomic(&page.output, &page.bytes)
            .map_err(|err| (state.failure(), DocumentError::write(&page.output, err)))?;

        Ok((DocState::Written, Step::Written(ManifestEntry::new(fingerprint, &page))))
    }
}
