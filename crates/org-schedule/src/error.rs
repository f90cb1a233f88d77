use thiserror::Error;

use org_core::OrgError;

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule parse error: {0}")]
    Parse(String),

    #[error("invalid schedule policy: {0}")]
    Config(String),

    #[error(transparent)]
    Core(#[from] OrgError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ScheduleResult<T> = Result<T, ScheduleError>;
