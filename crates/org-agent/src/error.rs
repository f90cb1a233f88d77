use org_core::{AgentId, OrgError, Role};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("population parse error: {0}")]
    Parse(String),

    #[error("agent ids must be contiguous from 0: expected {expected}, found {found}")]
    NonContiguousId { expected: AgentId, found: AgentId },

    #[error("role {0} has no permitted resources")]
    NoResources(Role),

    #[error(transparent)]
    Core(#[from] OrgError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type AgentResult<T> = Result<T, AgentError>;
