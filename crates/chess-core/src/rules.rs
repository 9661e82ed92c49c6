//! Rules engine contract and its shakmaty implementation.
//!
//! The session never looks inside a position; it asks a [`RulesEngine`] for
//! legal destinations, applies moves and reads the status back.

use std::fmt;

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Piece, Position as _, Rank, Role, Square,
};

use crate::error::RulesError;
use crate::types::{ChessMove, GameStatus};

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Half-moves without capture or pawn move after which the game is drawn.
const FIFTY_MOVE_HALFMOVES: u32 = 100;

/// Immutable board state. A new `Position` is produced for every applied move.
#[derive(Debug, Clone)]
pub struct Position {
    board: Chess,
    fen: String,
}

impl Position {
    pub fn starting() -> Self {
        Self::from_chess(Chess::default())
    }

    pub fn from_fen(fen: &str) -> Result<Self, RulesError> {
        let parsed: Fen = fen
            .trim()
            .parse()
            .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))?;
        let board = parsed
            .into_position::<Chess>(CastlingMode::Standard)
            .map_err(|e| RulesError::InvalidFen(format!("{fen}: {e}")))?;
        Ok(Self::from_chess(board))
    }

    fn from_chess(board: Chess) -> Self {
        let fen = Fen::from_position(&board, EnPassantMode::Legal).to_string();
        Self { board, fen }
    }

    pub fn fen(&self) -> &str {
        &self.fen
    }

    pub fn side_to_move(&self) -> Color {
        self.board.turn()
    }

    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.board.board().piece_at(square)
    }

    pub fn fullmoves(&self) -> u32 {
        self.board.fullmoves().get()
    }

    /// Placement, side, castling rights and en passant square, without the
    /// move counters. Two positions with the same key repeat each other.
    pub fn repetition_key(&self) -> String {
        self.fen
            .split_whitespace()
            .take(4)
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.fen)
    }
}

/// Result of applying a move: the successor position and the move in SAN.
#[derive(Debug, Clone)]
pub struct AppliedMove {
    pub position: Position,
    pub san: String,
}

pub trait RulesEngine {
    /// Distinct destination cells of the legal moves starting on `from`.
    fn legal_destinations(&self, position: &Position, from: Square) -> Vec<Square>;

    /// Apply `mv` to `position`, or reject it if it is not legal there.
    fn apply(&self, position: &Position, mv: &ChessMove) -> Result<AppliedMove, RulesError>;

    fn status(&self, position: &Position) -> GameStatus;

    fn side_to_move(&self, position: &Position) -> Color {
        position.side_to_move()
    }

    fn piece_at(&self, position: &Position, square: Square) -> Option<Piece> {
        position.piece_at(square)
    }

    /// True when the piece on `from` is a pawn and `to` is the last rank for
    /// its color.
    fn requires_promotion(&self, position: &Position, from: Square, to: Square) -> bool {
        match self.piece_at(position, from) {
            Some(Piece {
                color,
                role: Role::Pawn,
            }) => to.rank() == promotion_rank(color),
            _ => false,
        }
    }

    /// Fill in a queen when the move needs a promotion piece to be well formed
    /// and none was given.
    fn complete_promotion(&self, position: &Position, mv: ChessMove) -> ChessMove {
        if mv.promotion.is_none() && self.requires_promotion(position, mv.from, mv.to) {
            mv.with_promotion(Role::Queen)
        } else {
            mv
        }
    }
}

fn promotion_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

/// Standard chess rules backed by shakmaty.
#[derive(Debug, Clone, Copy, Default)]
pub struct StandardRules;

impl RulesEngine for StandardRules {
    fn legal_destinations(&self, position: &Position, from: Square) -> Vec<Square> {
        let mut targets = Vec::new();
        for m in position.board.legal_moves() {
            // Castling is reported with the king's destination (e1g1), the
            // cell a player actually clicks.
            if let UciMove::Normal { from: origin, to, .. } = m.to_uci(CastlingMode::Standard) {
                if origin == from && !targets.contains(&to) {
                    targets.push(to);
                }
            }
        }
        targets
    }

    fn apply(&self, position: &Position, mv: &ChessMove) -> Result<AppliedMove, RulesError> {
        let illegal = || RulesError::IllegalMove {
            uci: mv.to_string(),
            fen: position.fen.clone(),
        };

        let uci = UciMove::Normal {
            from: mv.from,
            to: mv.to,
            promotion: mv.promotion,
        };
        let legal = uci.to_move(&position.board).map_err(|_| illegal())?;

        let mut san = San::from_move(&position.board, legal.clone()).to_string();
        let next = position
            .board
            .clone()
            .play(legal)
            .map_err(|_| illegal())?;

        if next.is_checkmate() {
            san.push('#');
        } else if next.is_check() {
            san.push('+');
        }

        Ok(AppliedMove {
            position: Position::from_chess(next),
            san,
        })
    }

    fn status(&self, position: &Position) -> GameStatus {
        let board = &position.board;
        if board.is_checkmate() {
            GameStatus::Checkmate
        } else if board.is_stalemate() {
            GameStatus::Stalemate
        } else if board.is_insufficient_material() || board.halfmoves() >= FIFTY_MOVE_HALFMOVES {
            GameStatus::Draw
        } else if board.is_check() {
            GameStatus::Check
        } else {
            GameStatus::Ongoing
        }
    }
}
