//! Document-scoped error taxonomy.
//!
//! Every variant is recorded against the failing document and reported at
//! the end of a build; none of them stops other documents from building.

use crate::render::RenderError;
use std::{io, path::PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DocumentError {
    #[error("failed to read source")]
    Read(#[source] io::Error),

    #[error("malformed metadata: {0}")]
    MalformedMetadata(String),

    #[error("missing required field `{0}`")]
    MissingRequiredField(&'static str),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("template `{0}` not found")]
    TemplateNotFound(String),

    #[error("failed to write `{}`", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl DocumentError {
    /// Stable kind name used in build reports.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Read(_) => "ReadError",
            Self::MalformedMetadata(_) => "MalformedMetadata",
            Self::MissingRequiredField(_) => "MissingRequiredField",
            Self::Render(_) => "RenderError",
            Self::TemplateNotFound(_) => "TemplateNotFound",
            Self::Write { .. } => "WriteError",
        }
    }

    pub fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_names() {
        assert_eq!(DocumentError::MalformedMetadata("x".into()).kind(), "MalformedMetadata");
        assert_eq!(DocumentError::MissingRequiredField("title").kind(), "MissingRequiredField");
        assert_eq!(DocumentError::TemplateNotFound("special".into()).kind(), "TemplateNotFound");
        assert_eq!(
            DocumentError::from(RenderError::UnterminatedFence { line: 3 }).kind(),
            "RenderError"
        );
        assert_eq!(
            DocumentError::write("a.html", io::Error::other("disk full")).kind(),
            "WriteError"
        );
    }

    #[test]
    fn test_display_messages() {
        let err = DocumentError::MissingRequiredField("title");
        assert_eq!(err.to_string(), "missing required field `title`");

        let err = DocumentError::TemplateNotFound("special".into());
        assert_eq!(err.to_string(), "template `special` not found");

        let err = DocumentError::from(RenderError::UnterminatedFence { line: 7 });
        assert!(err.to_string().contains("line 7"));
    }
}
