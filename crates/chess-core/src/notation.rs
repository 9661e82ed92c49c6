//! Coordinate move encoding exchanged with the opponent engine.
//! `e2e4`, `e7e8q`; the optional trailing letter names the promotion piece.

use regex::Regex;
use shakmaty::{Role, Square};

use crate::error::NotationError;
use crate::types::ChessMove;

const MOVE_PATTERN: &str = r"^([a-h][1-8])([a-h][1-8])([qrbn])?$";

/// Parse an engine reply such as `e7e8q` into a move.
/// `(none)` and the null move `0000` mean the engine had nothing to play.
pub fn parse_move_encoding(encoding: &str) -> Result<ChessMove, NotationError> {
    let text = encoding.trim().to_ascii_lowercase();
    if text.is_empty() || text == "(none)" || text == "0000" {
        return Err(NotationError::NoMove);
    }

    let re = Regex::new(MOVE_PATTERN).map_err(|e| NotationError::Malformed(e.to_string()))?;
    let caps = re
        .captures(&text)
        .ok_or_else(|| NotationError::Malformed(encoding.to_string()))?;

    let from: Square = caps[1]
        .parse()
        .map_err(|_| NotationError::Malformed(encoding.to_string()))?;
    let to: Square = caps[2]
        .parse()
        .map_err(|_| NotationError::Malformed(encoding.to_string()))?;
    let promotion = caps
        .get(3)
        .and_then(|m| m.as_str().chars().next())
        .and_then(promotion_from_char);

    Ok(ChessMove {
        from,
        to,
        promotion,
    })
}

/// Promotion letter to piece kind. Kings and pawns are never promotion targets.
pub fn promotion_from_char(c: char) -> Option<Role> {
    match c.to_ascii_lowercase() {
        'q' => Some(Role::Queen),
        'r' => Some(Role::Rook),
        'b' => Some(Role::Bishop),
        'n' => Some(Role::Knight),
        _ => None,
    }
}
