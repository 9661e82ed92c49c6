//! Destination highlights for the selected piece.

use std::collections::BTreeMap;

use chess_core::{Position, RulesEngine, Square};

/// Marker kinds; the renderer maps them to its own styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HighlightKind {
    Origin,
    QuietDestination,
    CaptureDestination,
}

pub type Highlights = BTreeMap<Square, HighlightKind>;

/// Cell markers for `selected` in `position`; empty when nothing is selected.
pub fn compute_highlights<R: RulesEngine + ?Sized>(
    rules: &R,
    position: &Position,
    selected: Option<Square>,
) -> Highlights {
    let mut highlights = Highlights::new();
    let Some(origin) = selected else {
        return highlights;
    };

    let mover = rules.piece_at(position, origin);
    for dest in rules.legal_destinations(position, origin) {
        let capture = match (mover, rules.piece_at(position, dest)) {
            (Some(own), Some(target)) => own.color != target.color,
            _ => false,
        };
        let kind = if capture {
            HighlightKind::CaptureDestination
        } else {
            HighlightKind::QuietDestination
        };
        highlights.insert(dest, kind);
    }
    highlights.insert(origin, HighlightKind::Origin);
    highlights
}
