use thiserror::Error;

#[derive(Debug, Error)]
pub enum ComplexityError {
    #[error("invalid query context: {0}")]
    InvalidContext(String),

    #[error("invalid controller config: {0}")]
    Config(String),
}

pub type ComplexityResult<T> = Result<T, ComplexityError>;
