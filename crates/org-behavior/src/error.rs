use thiserror::Error;

use org_core::OrgError;

#[derive(Debug, Error)]
pub enum BehaviorError {
    #[error("behavior configuration error: {0}")]
    Config(String),

    #[error("transition table parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Core(#[from] OrgError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type BehaviorResult<T> = Result<T, BehaviorError>;
