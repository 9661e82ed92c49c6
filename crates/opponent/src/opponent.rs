//! Stockfish as the session's opponent engine.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use game_session::{EngineError, EngineReply, OpponentEngine};
use tokio::sync::Mutex;
use tracing::debug;

use crate::config::OpponentConfig;
use crate::error::OpponentError;
use crate::stockfish::{SearchLimit, StockfishEngine};

/// One Stockfish process shared by every request of a session. `None` once
/// disposed.
pub struct StockfishOpponent {
    engine: Arc<Mutex<Option<StockfishEngine>>>,
    limit: SearchLimit,
}

impl StockfishOpponent {
    pub async fn spawn(config: &OpponentConfig) -> Result<Self, OpponentError> {
        let engine = StockfishEngine::new(&config.stockfish_path, config.skill_level).await?;
        Ok(Self {
            engine: Arc::new(Mutex::new(Some(engine))),
            limit: config.search_limit(),
        })
    }
}

impl OpponentEngine for StockfishOpponent {
    fn request_best_move(&self, fen: String) -> BoxFuture<'static, Result<EngineReply, EngineError>> {
        let engine = Arc::clone(&self.engine);
        let limit = self.limit;
        async move {
            let mut guard = engine.lock().await;
            let stockfish = guard.as_mut().ok_or(EngineError::Disposed)?;
            let result = stockfish.search(&fen, limit).await?;
            debug!(best_move = %result.best_move, cp = ?result.cp, mate = ?result.mate, "Search finished");
            Ok::<_, EngineError>(EngineReply {
                best_move: result.best_move,
                cp: result.cp,
                mate: result.mate,
                pv: result.pv,
            })
        }
        .boxed()
    }

    fn dispose(&self) -> BoxFuture<'static, ()> {
        let engine = Arc::clone(&self.engine);
        async move {
            let taken = engine.lock().await.take();
            if let Some(mut stockfish) = taken {
                stockfish.quit().await;
            }
        }
        .boxed()
    }
}
