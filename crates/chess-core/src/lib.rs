//! Chess rules collaborator for the game session.
//!
//! Wraps shakmaty behind the [`RulesEngine`] contract so the session layer only
//! ever sees positions, coordinate moves and a game status. Also holds the move
//! encodings exchanged with the opponent engine and the movetext helpers used
//! by the assistant snapshot.

pub use shakmaty;
pub use shakmaty::{Color, Piece, Role, Square};

pub mod error;
pub mod notation;
pub mod pgn;
pub mod rules;
pub mod types;

pub use error::{NotationError, RulesError};
pub use rules::{AppliedMove, Position, RulesEngine, StandardRules, STARTING_FEN};
pub use types::{color_name, ChessMove, GameStatus};
