//! Commands typed into the terminal driver.

use std::str::FromStr;

use chess_core::notation::promotion_from_char;
use chess_core::{Role, Square};

use crate::error::OpponentError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Click a cell, e.g. `e2`.
    Click(Square),
    Promote(Role),
    /// Dismiss the promotion chooser.
    Cancel,
    Reset,
    Retry,
    Status,
    Snapshot,
    Pgn,
    Help,
    Quit,
}

pub const HELP: &str = "\
commands:
  <square>             click a cell (e2)
  promote <q|r|b|n>    pick the promotion piece
  cancel               dismiss the promotion chooser
  reset                start the game over
  retry                ask the engine again after a failure
  status               show whose turn it is and the game status
  snapshot             print the assistant snapshot as JSON
  pgn                  print the game as PGN
  quit";

impl FromStr for Command {
    type Err = OpponentError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        let head = words
            .next()
            .ok_or_else(|| OpponentError::Command(String::new()))?
            .to_ascii_lowercase();

        let command = match head.as_str() {
            "promote" | "p" => {
                let role = words
                    .next()
                    .and_then(|w| w.chars().next())
                    .and_then(promotion_from_char)
                    .ok_or_else(|| OpponentError::Command(s.trim().to_string()))?;
                Command::Promote(role)
            }
            "cancel" => Command::Cancel,
            "reset" => Command::Reset,
            "retry" => Command::Retry,
            "status" => Command::Status,
            "snapshot" => Command::Snapshot,
            "pgn" => Command::Pgn,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            cell => Command::Click(
                cell.parse()
                    .map_err(|_| OpponentError::Command(s.trim().to_string()))?,
            ),
        };
        Ok(command)
    }
}
