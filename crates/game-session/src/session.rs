//! The game session: one object owning everything a game needs.

use std::sync::Arc;
use std::time::Duration;

use chess_core::{GameStatus, Position, Role, RulesEngine, Square, StandardRules};
use tokio::sync::watch;
use tracing::{debug, error, info};

use crate::analysis::EngineAnalysis;
use crate::engine::OpponentEngine;
use crate::error::SessionError;
use crate::highlight::Highlights;
use crate::orchestrator::{EngineEvent, EngineEvents, OpponentOrchestrator, ReplyOutcome};
use crate::selection::{ClickOutcome, PromotionOutcome, SelectionMachine, SelectionState};
use crate::settings::GameSettings;
use crate::snapshot::AssistantSnapshot;
use crate::store::{MoveHistoryEntry, PositionStore};
use crate::turn_gate::{admit_input, InputRejection, OpponentActivity};

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Position every game (and every reset) starts from.
    pub initial_position: Position,
    /// How long one engine request may take before it counts as failed.
    pub request_timeout: Duration,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            initial_position: Position::starting(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl SessionOptions {
    pub fn with_fen(fen: &str) -> Result<Self, SessionError> {
        Ok(Self {
            initial_position: Position::from_fen(fen)?,
            ..Self::default()
        })
    }

    pub fn request_timeout(self, request_timeout: Duration) -> Self {
        Self {
            request_timeout,
            ..self
        }
    }
}

/// Point-and-click chess between a human and either another human or the
/// opponent engine.
///
/// All methods run to completion on the caller's task. Engine completions
/// arrive on the [`EngineEvents`] receiver returned by the constructor and
/// must be passed back through [`GameSession::handle_engine_event`].
pub struct GameSession<R: RulesEngine = StandardRules> {
    rules: R,
    settings: GameSettings,
    store: PositionStore,
    selection: SelectionMachine,
    orchestrator: OpponentOrchestrator,
}

impl<R: RulesEngine> GameSession<R> {
    pub fn new(
        rules: R,
        settings: GameSettings,
        engine: Option<Arc<dyn OpponentEngine>>,
    ) -> Result<(Self, EngineEvents), SessionError> {
        Self::with_options(rules, settings, engine, SessionOptions::default())
    }

    pub fn with_options(
        rules: R,
        settings: GameSettings,
        engine: Option<Arc<dyn OpponentEngine>>,
        options: SessionOptions,
    ) -> Result<(Self, EngineEvents), SessionError> {
        check_engine(&settings, engine.as_ref())?;

        let (orchestrator, events) = OpponentOrchestrator::new(options.request_timeout);
        let mut session = Self {
            rules,
            settings,
            store: PositionStore::new(options.initial_position),
            selection: SelectionMachine::new(),
            orchestrator,
        };
        session.enter_mode(engine);
        info!(mode = session.settings.mode_label(), "Game session created");
        session.after_transition();
        Ok((session, events))
    }

    /// A click on `cell`, discarded when the Turn Gate says no.
    pub fn click(&mut self, cell: Square) -> ClickOutcome {
        if let Err(reason) = self.admit() {
            debug!(%cell, %reason, "Click discarded");
            return ClickOutcome::Rejected(reason);
        }

        let outcome = self.selection.click(&self.rules, &mut self.store, cell);
        if matches!(outcome, ClickOutcome::Committed { .. }) {
            self.after_transition();
        }
        outcome
    }

    /// Answer the promotion chooser; `None` dismisses it.
    pub fn choose_promotion(&mut self, choice: Option<Role>) -> PromotionOutcome {
        let outcome = self
            .selection
            .choose_promotion(&self.rules, &mut self.store, choice);
        if matches!(outcome, PromotionOutcome::Committed { .. }) {
            self.after_transition();
        }
        outcome
    }

    pub fn handle_engine_event(&mut self, event: EngineEvent) -> ReplyOutcome {
        let outcome = self
            .orchestrator
            .resolve(event, &self.rules, &mut self.store);
        if matches!(outcome, ReplyOutcome::Applied { .. }) {
            self.after_transition();
        }
        outcome
    }

    /// Start the game over from the initial position. The engine session, if
    /// any, stays open; a request in flight is abandoned.
    pub fn reset(&mut self) {
        self.orchestrator.cancel_request();
        self.store.reset();
        self.selection.reset();
        info!("Game reset");
        self.after_transition();
    }

    /// Ask the engine again after its reply for the current position was
    /// dropped. Returns whether a request was started. A selection the human
    /// had begun in the meantime is dropped.
    pub fn retry_opponent(&mut self) -> bool {
        if !self.orchestrator.retry() {
            return false;
        }
        self.selection.reset();
        info!("Retrying the opponent engine");
        self.after_transition()
    }

    /// Switch to new settings. The old engine session ends and a fresh game
    /// begins. Nothing changes when the new settings are invalid.
    pub fn reconfigure(
        &mut self,
        settings: GameSettings,
        engine: Option<Arc<dyn OpponentEngine>>,
    ) -> Result<(), SessionError> {
        check_engine(&settings, engine.as_ref())?;

        self.orchestrator.end_session();
        self.settings = settings;
        self.store.reset();
        self.selection.reset();
        self.enter_mode(engine);
        info!(mode = self.settings.mode_label(), "Game session reconfigured");
        self.after_transition();
        Ok(())
    }

    /// End the engine session. The board stays readable.
    pub fn shutdown(&mut self) {
        self.selection.reset();
        self.orchestrator.end_session();
        info!("Game session shut down");
    }

    pub fn position(&self) -> &Position {
        self.store.position()
    }

    pub fn initial_position(&self) -> &Position {
        self.store.initial()
    }

    pub fn history(&self) -> &[MoveHistoryEntry] {
        self.store.history()
    }

    pub fn san_moves(&self) -> Vec<String> {
        self.store.san_moves()
    }

    pub fn status(&self) -> GameStatus {
        self.store.status(&self.rules)
    }

    pub fn selection(&self) -> SelectionState {
        self.selection.state()
    }

    pub fn pending_promotion(&self) -> Option<(Square, Square)> {
        self.selection.pending_promotion()
    }

    pub fn highlights(&self) -> &Highlights {
        self.selection.highlights()
    }

    pub fn is_thinking(&self) -> bool {
        self.orchestrator.is_thinking()
    }

    pub fn thinking(&self) -> watch::Receiver<bool> {
        self.orchestrator.thinking()
    }

    /// True when the engine's reply for the current position was dropped.
    pub fn is_stalled(&self) -> bool {
        self.orchestrator.activity(self.store.position()) == OpponentActivity::Stalled
    }

    pub fn input_accepted(&self) -> bool {
        self.admit().is_ok()
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub fn rules(&self) -> &R {
        &self.rules
    }

    pub fn analysis(&self) -> Option<&EngineAnalysis> {
        self.orchestrator.analysis()
    }

    pub fn snapshot(&self) -> AssistantSnapshot {
        AssistantSnapshot::capture(
            &self.settings,
            &self.store,
            self.status(),
            self.is_thinking(),
            self.orchestrator.analysis(),
        )
    }

    fn admit(&self) -> Result<(), InputRejection> {
        let position = self.store.position();
        admit_input(
            &self.settings,
            self.rules.side_to_move(position),
            self.store.status(&self.rules),
            self.orchestrator.activity(position),
        )
    }

    fn enter_mode(&mut self, engine: Option<Arc<dyn OpponentEngine>>) {
        match engine {
            Some(engine) if self.settings.is_vs_opponent() => {
                self.orchestrator.start_session(engine)
            }
            Some(_) => debug!("Engine not needed for Human vs Human; ignoring it"),
            None => {}
        }
    }

    /// Re-evaluate the board after it changed and let the orchestrator take
    /// the opponent's turn. Returns whether an engine request started.
    fn after_transition(&mut self) -> bool {
        debug_assert!(
            !self.selection.is_mid_flow(),
            "selection mid-flow while handing the turn over"
        );
        if self.selection.is_mid_flow() {
            error!(state = ?self.selection.state(), "Selection mid-flow at turn hand-over");
            return false;
        }

        let status = self.store.status(&self.rules);
        if status.is_terminal() {
            info!(status = status.label(), "Game over");
            return false;
        }
        self.orchestrator
            .maybe_request(&self.settings, self.store.position(), status)
    }
}

fn check_engine(
    settings: &GameSettings,
    engine: Option<&Arc<dyn OpponentEngine>>,
) -> Result<(), SessionError> {
    if settings.is_vs_opponent() && engine.is_none() {
        return Err(SessionError::EngineRequired);
    }
    Ok(())
}
