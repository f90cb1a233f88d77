//! Framework error type.
//!
//! Sub-crates define their own error enums and wrap `OrgError` as one variant
//! via `#[from]` where they need to surface a core failure.

use thiserror::Error;

use crate::AgentId;

/// The top-level error type for `org-core` and a common base for sub-crates.
#[derive(Debug, Error)]
pub enum OrgError {
    #[error("agent {0} not found")]
    AgentNotFound(AgentId),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `org-*` crates.
pub type OrgResult<T> = Result<T, OrgError>;
