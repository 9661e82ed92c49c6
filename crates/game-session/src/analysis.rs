//! Engine evaluation of the last analyzed position.

use chess_core::Color;

use crate::engine::EngineReply;

/// Score and suggestions the engine produced for one position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineAnalysis {
    pub fen: String,
    pub side_to_move: Color,
    pub best_move: String,
    pub cp: Option<i32>,
    pub mate: Option<i32>,
    pub pv: Vec<String>,
}

impl EngineAnalysis {
    pub fn from_reply(fen: &str, side_to_move: Color, reply: &EngineReply) -> Self {
        Self {
            fen: fen.to_string(),
            side_to_move,
            best_move: reply.best_move.clone(),
            cp: reply.cp,
            mate: reply.mate,
            pv: reply.pv.clone(),
        }
    }

    /// Centipawns from white's point of view; mates map to +/-10000 less ten
    /// per move to mate.
    pub fn white_cp(&self) -> i32 {
        eval_to_white_cp(self.cp, self.mate, self.side_to_move == Color::White)
    }

    pub fn evaluation_pawns(&self) -> f64 {
        f64::from(self.white_cp()) / 100.0
    }

    /// Winning chances for the side to move, in percent.
    pub fn winning_percentage(&self) -> f64 {
        let cp = self.white_cp();
        let own = if self.side_to_move == Color::White { cp } else { -cp };
        winning_percentage(own)
    }

    /// Best move followed by the rest of the principal variation.
    pub fn suggested_moves(&self) -> Vec<String> {
        let mut moves = Vec::with_capacity(self.pv.len().max(1));
        if !self.best_move.is_empty() {
            moves.push(self.best_move.clone());
        }
        moves.extend(
            self.pv
                .iter()
                .skip_while(|m| **m == self.best_move)
                .cloned(),
        );
        moves
    }
}

fn eval_to_white_cp(cp: Option<i32>, mate: Option<i32>, is_white_to_move: bool) -> i32 {
    let score = if let Some(m) = mate {
        if m > 0 {
            10000 - m * 10
        } else {
            -10000 - m * 10
        }
    } else {
        cp.unwrap_or(0)
    };
    if is_white_to_move {
        score
    } else {
        -score
    }
}

/// Logistic mapping of a centipawn score to winning chances (0 to 100).
pub fn winning_percentage(cp: i32) -> f64 {
    let cp = f64::from(cp.clamp(-10000, 10000));
    50.0 + 50.0 * (2.0 / (1.0 + (-0.00368208 * cp).exp()) - 1.0)
}
