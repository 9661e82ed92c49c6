//! Move-selection state machine and opponent-turn orchestration.
//!
//! A [`GameSession`] turns board clicks into validated moves, runs the pawn
//! promotion sub-flow, gates input by whose turn it is and drives an
//! asynchronous [`OpponentEngine`] when the other side is automated.
//!
//! The session is single-writer: every transition runs to completion on the
//! caller's task. The only suspension point is the engine request, whose
//! completion comes back as an [`EngineEvent`] that the caller feeds to
//! [`GameSession::handle_engine_event`].

pub mod analysis;
pub mod engine;
pub mod error;
pub mod highlight;
pub mod orchestrator;
pub mod selection;
pub mod session;
pub mod settings;
pub mod snapshot;
pub mod store;
pub mod turn_gate;

pub use analysis::EngineAnalysis;
pub use engine::{EngineError, EngineReply, OpponentEngine};
pub use error::SessionError;
pub use highlight::{compute_highlights, HighlightKind, Highlights};
pub use orchestrator::{EngineEvent, EngineEvents, OpponentOrchestrator, ReplyOutcome};
pub use selection::{ClickOutcome, PromotionOutcome, SelectionMachine, SelectionState};
pub use session::{GameSession, SessionOptions};
pub use settings::{GameMode, GameSettings};
pub use snapshot::{AnalysisSnapshot, AssistantSnapshot};
pub use store::{MoveHistoryEntry, PositionStore};
pub use turn_gate::{admit_input, is_input_accepted, InputRejection, OpponentActivity};
