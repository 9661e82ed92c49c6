//! Session error types

use chess_core::RulesError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Human vs CPU mode requires an opponent engine")]
    EngineRequired,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),

    #[error(transparent)]
    Rules(#[from] RulesError),
}
