//! Opponent and driver error types

use game_session::{EngineError, SessionError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OpponentError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Stockfish error: {0}")]
    Stockfish(String),

    #[error("Unknown command: {0}")]
    Command(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl From<OpponentError> for EngineError {
    fn from(err: OpponentError) -> Self {
        match err {
            OpponentError::Stockfish(msg) => EngineError::Protocol(msg),
            other => EngineError::Unavailable(other.to_string()),
        }
    }
}
