use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("invalid direction {0}, expected 0-3")]
    InvalidDirection(u8),

    #[error("invalid board state: {0}")]
    InvalidBoardState(String),

    #[error("random stream exhausted ({requested} more values requested)")]
    ExhaustedRandomStream { requested: usize },

    #[error("could not seed from os entropy: {0}")]
    Entropy(#[from] getrandom::Error),

    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, EngineError>;
