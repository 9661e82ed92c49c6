//! Contract for the automated opponent.

use std::time::Duration;

use futures::future::BoxFuture;
use thiserror::Error;

/// What the engine sent back for one request.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EngineReply {
    /// Coordinate encoding such as `e2e4` or `e7e8q`; `(none)` when the engine
    /// has no move.
    pub best_move: String,
    /// Centipawn score from the side to move's view.
    pub cp: Option<i32>,
    /// Mate distance in moves from the side to move's view.
    pub mate: Option<i32>,
    /// Principal variation in coordinate notation.
    pub pv: Vec<String>,
}

impl EngineReply {
    /// A reply carrying only the move, for engines that report no score.
    pub fn bare(best_move: impl Into<String>) -> Self {
        Self {
            best_move: best_move.into(),
            ..Self::default()
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine protocol error: {0}")]
    Protocol(String),

    #[error("Engine disposed")]
    Disposed,
}

/// An opponent that picks moves for a position given as FEN.
///
/// Futures are `'static` so a request can run on its own task while the
/// session keeps handling input.
pub trait OpponentEngine: Send + Sync {
    fn request_best_move(&self, fen: String) -> BoxFuture<'static, Result<EngineReply, EngineError>>;

    /// Release the engine. Requests still in flight resolve to an error or are
    /// never observed.
    fn dispose(&self) -> BoxFuture<'static, ()>;
}
