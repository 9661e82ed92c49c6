//! Decides whether a board click may be acted on right now.

use chess_core::{Color, GameStatus};
use thiserror::Error;

use crate::settings::{GameMode, GameSettings};

/// What the opponent orchestrator is doing for the current position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpponentActivity {
    Idle,
    /// A request is in flight.
    Thinking,
    /// The engine's reply for this position was dropped; the human may act.
    Stalled,
}

/// Why a click was discarded.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRejection {
    #[error("the game is over")]
    GameOver,

    #[error("it is the opponent's turn")]
    OpponentTurn,

    #[error("the opponent is thinking")]
    OpponentThinking,
}

/// Human-vs-human always accepts; against the engine only the human's side does.
pub fn is_input_accepted(settings: &GameSettings, side_to_move: Color) -> bool {
    match settings.mode {
        GameMode::HumanVsHuman => true,
        GameMode::HumanVsOpponent { human_side } => side_to_move == human_side,
    }
}

pub fn admit_input(
    settings: &GameSettings,
    side_to_move: Color,
    status: GameStatus,
    activity: OpponentActivity,
) -> Result<(), InputRejection> {
    if status.is_terminal() {
        return Err(InputRejection::GameOver);
    }
    match activity {
        OpponentActivity::Thinking => Err(InputRejection::OpponentThinking),
        OpponentActivity::Stalled => Ok(()),
        OpponentActivity::Idle if is_input_accepted(settings, side_to_move) => Ok(()),
        OpponentActivity::Idle => Err(InputRejection::OpponentTurn),
    }
}
