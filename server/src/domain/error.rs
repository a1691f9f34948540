//! Typed domain error enum.
//!
//! Every failure the dashboard can surface is one of these variants. Remote
//! operations wrap lower-level errors in [`DeckError::Operation`] so the
//! message names the operation, while [`DeckError::kind`] still reports the
//! original cause for status mapping.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by remote operations, project management and reconciliation.
#[derive(Debug, Error)]
pub enum DeckError {
    /// Missing or unusable host/user/key settings. Never retried.
    #[error("{0}")]
    Configuration(String),

    /// The SSH client could not connect, authenticate, or be spawned.
    #[error("SSH transport error: {0}")]
    Transport(String),

    /// The remote command did not finish within its window.
    #[error("Command execution timeout after {}s", .0.as_secs())]
    Timeout(Duration),

    /// Supervisor output was not the structured data we expected.
    #[error("{0}")]
    Parse(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Directory {0} already exists")]
    DirectoryExists(String),

    /// Malformed or incomplete request input.
    #[error("{0}")]
    Validation(String),

    /// A remote command an operation depends on ran but did not succeed.
    #[error("{message}")]
    RemoteFailed { message: String, details: String },

    #[error(transparent)]
    Store(#[from] anyhow::Error),

    /// `source`, tagged with the operation that was running.
    #[error("{operation} failed: {source}")]
    Operation {
        operation: &'static str,
        source: Box<DeckError>,
    },
}

/// Flat classification of a [`DeckError`], seen through operation wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Configuration,
    Transport,
    Timeout,
    Parse,
    NotFound,
    Conflict,
    DirectoryExists,
    Validation,
    RemoteFailed,
    Store,
}

impl DeckError {
    /// Wrap this error with the name of the operation that hit it.
    #[must_use]
    pub fn during(self, operation: &'static str) -> Self {
        Self::Operation {
            operation,
            source: Box::new(self),
        }
    }

    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Configuration(_) => ErrorKind::Configuration,
            Self::Transport(_) => ErrorKind::Transport,
            Self::Timeout(_) => ErrorKind::Timeout,
            Self::Parse(_) => ErrorKind::Parse,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::DirectoryExists(_) => ErrorKind::DirectoryExists,
            Self::Validation(_) => ErrorKind::Validation,
            Self::RemoteFailed { .. } => ErrorKind::RemoteFailed,
            Self::Store(_) => ErrorKind::Store,
            Self::Operation { source, .. } => source.kind(),
        }
    }

    /// Remote stderr attached to a [`DeckError::RemoteFailed`], if any.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            Self::RemoteFailed { details, .. } if !details.is_empty() => Some(details),
            Self::Operation { source, .. } => source.details(),
            _ => None,
        }
    }
}
