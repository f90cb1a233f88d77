use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("synchronizer has shut down; feedback not accepted")]
    Closed,

    #[error("invalid synchronizer config: {0}")]
    Config(String),
}

pub type SyncResult<T> = Result<T, SyncError>;
