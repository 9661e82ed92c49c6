//! Position store: the current position plus the append-only move log.

use chess_core::{ChessMove, Color, GameStatus, Position, RulesEngine, RulesError};
use chrono::{DateTime, Utc};
use tracing::info;

/// Occurrences of one position that make the game a draw.
const REPETITION_DRAW: usize = 3;

#[derive(Debug, Clone)]
pub struct MoveHistoryEntry {
    /// 1-based half-move index
    pub ply: usize,
    pub mv: ChessMove,
    pub san: String,
    /// FEN of the position this move produced
    pub fen_after: String,
    /// Side that played the move
    pub side: Color,
    pub played_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct PositionStore {
    initial: Position,
    position: Position,
    history: Vec<MoveHistoryEntry>,
}

impl PositionStore {
    pub fn new(initial: Position) -> Self {
        Self {
            position: initial.clone(),
            initial,
            history: Vec::new(),
        }
    }

    pub fn position(&self) -> &Position {
        &self.position
    }

    pub fn initial(&self) -> &Position {
        &self.initial
    }

    pub fn history(&self) -> &[MoveHistoryEntry] {
        &self.history
    }

    pub fn last_move(&self) -> Option<&MoveHistoryEntry> {
        self.history.last()
    }

    /// SAN of every move played so far, in order.
    pub fn san_moves(&self) -> Vec<String> {
        self.history.iter().map(|e| e.san.clone()).collect()
    }

    /// Apply `mv` to the current position. On rejection nothing changes.
    pub fn submit<R: RulesEngine + ?Sized>(
        &mut self,
        rules: &R,
        mv: ChessMove,
    ) -> Result<&MoveHistoryEntry, RulesError> {
        let applied = rules.apply(&self.position, &mv)?;

        let entry = MoveHistoryEntry {
            ply: self.history.len() + 1,
            mv,
            san: applied.san,
            fen_after: applied.position.fen().to_string(),
            side: self.position.side_to_move(),
            played_at: Utc::now(),
        };
        info!(ply = entry.ply, mv = %mv, san = %entry.san, "Move applied");

        self.position = applied.position;
        self.history.push(entry);
        Ok(&self.history[self.history.len() - 1])
    }

    /// Rules status of the current position, drawn on threefold repetition.
    pub fn status<R: RulesEngine + ?Sized>(&self, rules: &R) -> GameStatus {
        let status = rules.status(&self.position);
        if !status.is_terminal() && self.repetitions() >= REPETITION_DRAW {
            GameStatus::Draw
        } else {
            status
        }
    }

    /// How many times the current position has occurred, itself included.
    pub fn repetitions(&self) -> usize {
        let current = self.position.repetition_key();
        let initial = self.initial.repetition_key();
        std::iter::once(initial.as_str())
            .chain(self.history.iter().map(|e| e.fen_after.as_str()))
            .filter(|fen| repetition_key(fen) == current)
            .count()
    }

    /// Back to the initial position; the move log is cleared.
    pub fn reset(&mut self) {
        self.position = self.initial.clone();
        self.history.clear();
    }
}

fn repetition_key(fen: &str) -> String {
    fen.split_whitespace().take(4).collect::<Vec<_>>().join(" ")
}
