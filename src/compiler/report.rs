//! End-of-build report.

use super::{DocState, Outcome, Step};
use crate::{error::DocumentError, log};
use std::{collections::BTreeMap, error::Error, path::PathBuf};

/// One failed document or asset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    pub path: PathBuf,
    pub kind: &'static str,
    pub message: String,
}

impl Failure {
    pub fn new(path: impl Into<PathBuf>, error: &DocumentError) -> Self {
        Self {
            path: path.into(),
            kind: error.kind(),
            message: error_chain(error),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub written: usize,
    pub reused: usize,
    pub skipped: usize,
    pub cancelled: usize,
    /// Stale pages deleted.
    pub removed: usize,
    pub assets: usize,
    pub failures: Vec<Failure>,
    /// Final state of every document, by id.
    pub states: BTreeMap<String, DocState>,
}

impl BuildReport {
    pub fn record(&mut self, outcome: &Outcome) {
        debug_assert!(outcome.state.is_terminal(), "{} is not final", outcome.state);
        debug_assert_eq!(outcome.state.is_failure(), matches!(outcome.step, Step::Failed(_)));
        match &outcome.step {
            Step::Written(_) => self.written += 1,
            Step::Reused => self.reused += 1,
            Step::Skipped => self.skipped += 1,
            Step::Cancelled => self.cancelled += 1,
            Step::Failed(err) => self.failures.push(Failure::new(&outcome.source, err)),
        }
        self.states.insert(outcome.id.clone(), outcome.state);
    }

    pub fn record_failure(&mut self, path: impl Into<PathBuf>, error: &DocumentError) {
        self.failures.push(Failure::new(path, error));
    }

    pub fn state(&self, id: &str) -> Option<DocState> {
        self.states.get(id).copied()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// 130 when the build was cancelled, 1 when any document or asset
    /// failed, 0 otherwise.
    pub fn exit_code(&self) -> u8 {
        if self.cancelled > 0 {
            130
        } else {
            u8::from(self.has_failures())
        }
    }

    pub fn log_summary(&self) {
        for failure in &self.failures {
            log!("failed"; "{} [{}] {}", failure.path.display(), failure.kind, failure.message);
        }

        let mut summary = format!(
            "{} written, {} reused, {} skipped, {} failed",
            self.written,
            self.reused,
            self.skipped,
            self.failures.len()
        );
        if self.removed > 0 {
            summary.push_str(&format!(", {} removed", self.removed));
        }
        if self.cancelled > 0 {
            summary.push_str(&format!(", {} cancelled", self.cancelled));
        }
        if self.assets > 0 {
            summary.push_str(&format!(", {} assets copied", self.assets));
        }

        if self.has_failures() {
            log!("error"; "{summary}");
        } else {
            log!("build"; "{summary}");
        }
    }
}

/// `outer: inner: root` message of an error and its sources.
fn error_chain(error: &dyn Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(err) = source {
        message.push_str(": ");
        message.push_str(&err.to_string());
        source = err.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    fn outcome(id: &str, state: DocState, step: Step) -> Outcome {
        Outcome {
            id: id.into(),
            source: PathBuf::from("content").join(id),
            state,
            step,
        }
    }

    #[test]
    fn test_counts_and_exit_code() {
        let mut report = BuildReport::default();
        report.record(&outcome("a.md", DocState::Written, Step::Reused));
        report.record(&outcome("d.md", DocState::Skipped, Step::Skipped));
        assert_eq!(report.exit_code(), 0);

        report.record(&outcome(
            "c.md",
            DocState::LoadFailed,
            Step::Failed(DocumentError::MissingRequiredField("title")),
        ));

        assert_eq!(report.reused, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.exit_code(), 1);
        assert_eq!(report.state("c.md"), Some(DocState::LoadFailed));
        assert_eq!(report.failures[0].kind, "MissingRequiredField");
        assert_eq!(report.failures[0].path, PathBuf::from("content/c.md"));
    }

    #[test]
    fn test_cancelled_exit_code_wins() {
        let mut report = BuildReport::default();
        report.record(&outcome(
            "c.md",
            DocState::LoadFailed,
            Step::Failed(DocumentError::MissingRequiredField("title")),
        ));
        report.record(&Outcome::cancelled("d.md".into(), PathBuf::from("content/d.md")));

        assert_eq!(report.cancelled, 1);
        assert_eq!(report.exit_code(), 130);
    }

    #[test]
    fn test_failure_message_includes_sources() {
        let err = DocumentError::write("public/a.html", io::Error::other("disk full"));
        let failure = Failure::new("content/a.md", &err);
        assert_eq!(failure.message, "failed to write `public/a.html`: disk full");
        assert_eq!(failure.kind, "WriteError");
    }
}
