//! Drives the opponent engine when it is the automated side's turn.
//!
//! A request runs on its own tokio task and reports back through an
//! [`EngineEvent`]. The orchestrator only ever has one request in flight and
//! recognizes its own reply by generation and request id, so anything coming
//! back after a reset, a reconfigure or a shutdown is dropped as stale.

use std::sync::Arc;
use std::time::Duration;

use chess_core::notation::parse_move_encoding;
use chess_core::{ChessMove, Color, GameStatus, NotationError, Position, RulesEngine};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::analysis::EngineAnalysis;
use crate::engine::{EngineError, EngineReply, OpponentEngine};
use crate::settings::GameSettings;
use crate::store::PositionStore;
use crate::turn_gate::OpponentActivity;

/// Completion of one engine request.
#[derive(Debug)]
pub struct EngineEvent {
    pub generation: u64,
    pub request_id: u64,
    pub result: Result<EngineReply, EngineError>,
}

/// Receiving end for engine completions. The owner of the session polls it and
/// hands every event to [`crate::GameSession::handle_engine_event`].
pub type EngineEvents = mpsc::UnboundedReceiver<EngineEvent>;

/// What became of an engine reply.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplyOutcome {
    Applied { mv: ChessMove, san: String },
    /// Not the reply for the live request, or the position moved on.
    Stale,
    Failed(EngineError),
    Malformed(NotationError),
    Rejected(ChessMove),
}

struct EngineSession {
    engine: Arc<dyn OpponentEngine>,
    generation: u64,
}

struct PendingRequest {
    id: u64,
    generation: u64,
    fen: String,
    side: Color,
    task: JoinHandle<()>,
}

enum State {
    Idle,
    Requesting(PendingRequest),
}

pub struct OpponentOrchestrator {
    session: Option<EngineSession>,
    state: State,
    generation: u64,
    next_request_id: u64,
    /// FEN of the position whose reply was dropped.
    stalled_on: Option<String>,
    analysis: Option<EngineAnalysis>,
    thinking: watch::Sender<bool>,
    events: mpsc::UnboundedSender<EngineEvent>,
    request_timeout: Duration,
}

impl OpponentOrchestrator {
    pub fn new(request_timeout: Duration) -> (Self, EngineEvents) {
        let (events, rx) = mpsc::unbounded_channel();
        let (thinking, _) = watch::channel(false);
        let orchestrator = Self {
            session: None,
            state: State::Idle,
            generation: 0,
            next_request_id: 0,
            stalled_on: None,
            analysis: None,
            thinking,
            events,
            request_timeout,
        };
        (orchestrator, rx)
    }

    pub fn has_session(&self) -> bool {
        self.session.is_some()
    }

    pub fn start_session(&mut self, engine: Arc<dyn OpponentEngine>) {
        self.end_session();
        self.generation += 1;
        info!(generation = self.generation, "Engine session started");
        self.session = Some(EngineSession {
            engine,
            generation: self.generation,
        });
    }

    /// Abort any request, invalidate the generation and release the engine.
    pub fn end_session(&mut self) {
        self.cancel_request();
        self.generation += 1;
        self.analysis = None;

        let Some(session) = self.session.take() else {
            return;
        };
        info!(generation = session.generation, "Engine session ended");
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(session.engine.dispose());
            }
            Err(_) => warn!("No runtime to dispose the engine on; dropping it"),
        }
    }

    /// Start a request if the opponent is due to move. Returns whether one was
    /// started.
    pub fn maybe_request(
        &mut self,
        settings: &GameSettings,
        position: &Position,
        status: GameStatus,
    ) -> bool {
        let Some((engine, generation)) = self
            .session
            .as_ref()
            .map(|s| (Arc::clone(&s.engine), s.generation))
        else {
            return false;
        };
        if matches!(self.state, State::Requesting(_))
            || status.is_terminal()
            || settings.opponent_side() != Some(position.side_to_move())
            || self.stalled_on.as_deref() == Some(position.fen())
        {
            return false;
        }

        let handle = match Handle::try_current() {
            Ok(handle) => handle,
            Err(err) => {
                error!(%err, "Cannot request an engine move outside a tokio runtime");
                self.stalled_on = Some(position.fen().to_string());
                return false;
            }
        };

        self.next_request_id += 1;
        let id = self.next_request_id;
        let fen = position.fen().to_string();

        let request = engine.request_best_move(fen.clone());
        let events = self.events.clone();
        let timeout = self.request_timeout;
        let task = handle.spawn(async move {
            let result = match tokio::time::timeout(timeout, request).await {
                Ok(result) => result,
                Err(_) => Err(EngineError::Timeout(timeout)),
            };
            // The receiver is gone once the session owner shuts down.
            let _ = events.send(EngineEvent {
                generation,
                request_id: id,
                result,
            });
        });

        debug!(request_id = id, generation, fen = %fen, "Engine request sent");
        self.state = State::Requesting(PendingRequest {
            id,
            generation,
            fen,
            side: position.side_to_move(),
            task,
        });
        self.thinking.send_replace(true);
        true
    }

    /// Apply the engine's reply if it belongs to the live request.
    pub fn resolve<R: RulesEngine + ?Sized>(
        &mut self,
        event: EngineEvent,
        rules: &R,
        store: &mut PositionStore,
    ) -> ReplyOutcome {
        let live = matches!(
            &self.state,
            State::Requesting(p) if p.generation == event.generation && p.id == event.request_id
        );
        if !live {
            debug!(
                request_id = event.request_id,
                generation = event.generation,
                "Dropping stale engine reply"
            );
            return ReplyOutcome::Stale;
        }
        let State::Requesting(pending) = std::mem::replace(&mut self.state, State::Idle) else {
            return ReplyOutcome::Stale;
        };
        self.thinking.send_replace(false);

        let reply = match event.result {
            Ok(reply) => reply,
            Err(err) => {
                warn!(%err, request_id = pending.id, "Engine request failed");
                self.stalled_on = Some(pending.fen);
                return ReplyOutcome::Failed(err);
            }
        };

        if store.position().fen() != pending.fen {
            warn!(request_id = pending.id, "Position changed while the engine was thinking");
            return ReplyOutcome::Stale;
        }

        self.analysis = Some(EngineAnalysis::from_reply(&pending.fen, pending.side, &reply));

        let mv = match parse_move_encoding(&reply.best_move) {
            Ok(mv) => rules.complete_promotion(store.position(), mv),
            Err(err) => {
                warn!(%err, best_move = %reply.best_move, "Unusable engine move");
                self.stalled_on = Some(pending.fen);
                return ReplyOutcome::Malformed(err);
            }
        };

        match store.submit(rules, mv) {
            Ok(entry) => ReplyOutcome::Applied {
                mv,
                san: entry.san.clone(),
            },
            Err(err) => {
                warn!(%err, "Engine move rejected");
                self.stalled_on = Some(pending.fen);
                ReplyOutcome::Rejected(mv)
            }
        }
    }

    /// Abort the in-flight request, if any, and forget a stalled position.
    /// The engine session stays open.
    pub fn cancel_request(&mut self) {
        if let State::Requesting(pending) = std::mem::replace(&mut self.state, State::Idle) {
            debug!(request_id = pending.id, "Engine request cancelled");
            pending.task.abort();
        }
        self.stalled_on = None;
        self.thinking.send_replace(false);
    }

    /// Clear the stall mark so the next trigger asks the engine again.
    pub fn retry(&mut self) -> bool {
        self.stalled_on.take().is_some()
    }

    pub fn activity(&self, position: &Position) -> OpponentActivity {
        match &self.state {
            State::Requesting(_) => OpponentActivity::Thinking,
            State::Idle if self.stalled_on.as_deref() == Some(position.fen()) => {
                OpponentActivity::Stalled
            }
            State::Idle => OpponentActivity::Idle,
        }
    }

    pub fn is_requesting(&self) -> bool {
        matches!(self.state, State::Requesting(_))
    }

    pub fn is_thinking(&self) -> bool {
        *self.thinking.borrow()
    }

    /// Observe the thinking indicator.
    pub fn thinking(&self) -> watch::Receiver<bool> {
        self.thinking.subscribe()
    }

    pub fn analysis(&self) -> Option<&EngineAnalysis> {
        self.analysis.as_ref()
    }
}

impl Drop for OpponentOrchestrator {
    fn drop(&mut self) {
        self.end_session();
    }
}
