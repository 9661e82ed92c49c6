//! Text board for the terminal driver.

use chess_core::shakmaty::{File, Rank};
use chess_core::{Position, Square};
use game_session::{HighlightKind, Highlights};

/// Eight ranks from white's side, each cell as its piece letter (uppercase
/// for white, `-` when empty) followed by the highlight marker.
pub fn render_board(position: &Position, highlights: &Highlights) -> String {
    let mut out = String::new();
    for rank in Rank::ALL.into_iter().rev() {
        out.push(rank.char());
        out.push(' ');
        for file in File::ALL {
            let square = Square::from_coords(file, rank);
            let piece = position.piece_at(square).map_or('-', |p| p.char());
            let marker = highlights.get(&square).map_or(' ', |kind| marker(*kind));
            out.push(' ');
            out.push(piece);
            out.push(marker);
        }
        out.push('\n');
    }
    out.push_str("  ");
    for file in File::ALL {
        out.push(' ');
        out.push(file.char());
        out.push(' ');
    }
    out.push('\n');
    out
}

fn marker(kind: HighlightKind) -> char {
    match kind {
        HighlightKind::Origin => '*',
        HighlightKind::QuietDestination => '.',
        HighlightKind::CaptureDestination => 'x',
    }
}
