//! Per-document compilation.
//!
//! - **pipeline**: drive one document from discovery to a written page
//! - **assets**: mirror static assets into the output root
//! - **report**: collect outcomes into the end-of-build report
//!
//! # Document states
//!
//! ```text
//! Discovered ──► Loaded ──► Rendered ──► Composed ──► Written
//!     │            │           │            │
//!     ▼            ▼           ▼            ▼
//! LoadFailed   RenderFailed  ComposeFailed  WriteFailed
//!
//! Skipped    partial or draft, never produces a page
//! Cancelled  build cancelled before the document was dispatched
//! ```
//!
//! The template is selected before rendering because the fingerprint
//! depends on it, but a missing template is only reported once the body
//! has rendered, as `ComposeFailed`.

pub mod assets;
pub mod pipeline;
pub mod report;

pub use pipeline::{Outcome, Pipeline, Step};
pub use report::{BuildReport, Failure};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DocState {
    Discovered,
    Loaded,
    Rendered,
    Composed,
    Written,
    LoadFailed,
    RenderFailed,
    ComposeFailed,
    WriteFailed,
    Skipped,
    Cancelled,
}

impl DocState {
    pub const fn name(self) -> &'static str {
        match self {
            Self::Discovered => "Discovered",
            Self::Loaded => "Loaded",
            Self::Rendered => "Rendered",
            Self::Composed => "Composed",
            Self::Written => "Written",
            Self::LoadFailed => "LoadFailed",
            Self::RenderFailed => "RenderFailed",
            Self::ComposeFailed => "ComposeFailed",
            Self::WriteFailed => "WriteFailed",
            Self::Skipped => "Skipped",
            Self::Cancelled => "Cancelled",
        }
    }

    pub const fn is_failure(self) -> bool {
        matches!(
            self,
            Self::LoadFailed | Self::RenderFailed | Self::ComposeFailed | Self::WriteFailed
        )
    }

    /// State reached when the step out of `self` fails.
    pub const fn failure(self) -> Self {
        match self {
            Self::Discovered => Self::LoadFailed,
            Self::Loaded => Self::RenderFailed,
            Self::Rendered => Self::ComposeFailed,
            Self::Composed => Self::WriteFailed,
            other => other,
        }
    }

    pub const fn is_terminal(self) -> bool {
        self.is_failure() || matches!(self, Self::Written | Self::Skipped | Self::Cancelled)
    }
}

impl std::fmt::Display for DocState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
