use thiserror::Error;

use org_agent::AgentError;
use org_behavior::BehaviorError;
use org_complexity::ComplexityError;
use org_core::OrgError;
use org_feedback::SyncError;
use org_schedule::ScheduleError;

#[derive(Debug, Error)]
pub enum SimError {
    #[error("simulation configuration error: {0}")]
    Config(String),

    #[error("{what} length {got} does not match agent count {expected}")]
    AgentCountMismatch {
        expected: usize,
        got:      usize,
        what:     &'static str,
    },

    #[error(transparent)]
    Core(#[from] OrgError),

    #[error(transparent)]
    Agent(#[from] AgentError),

    #[error(transparent)]
    Behavior(#[from] BehaviorError),

    #[error(transparent)]
    Schedule(#[from] ScheduleError),

    #[error(transparent)]
    Complexity(#[from] ComplexityError),

    #[error(transparent)]
    Sync(#[from] SyncError),
}

pub type SimResult<T> = Result<T, SimError>;
