//! Movetext formatting for the assistant bridge and PGN export.

use shakmaty::Color;

use crate::types::GameStatus;

/// Numbered SAN text in the assistant's format: `1. e4 1... e5 2. Nf3`.
pub fn format_movetext(sans: &[String]) -> String {
    sans.iter()
        .enumerate()
        .map(|(i, san)| {
            let number = i / 2 + 1;
            if i % 2 == 0 {
                format!("{number}. {san}")
            } else {
                format!("{number}... {san}")
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// PGN result token for a finished (or unfinished) game.
pub fn result_token(status: GameStatus, side_to_move: Color) -> &'static str {
    match status {
        GameStatus::Checkmate => match side_to_move {
            Color::White => "0-1",
            Color::Black => "1-0",
        },
        GameStatus::Stalemate | GameStatus::Draw => "1/2-1/2",
        GameStatus::Ongoing | GameStatus::Check => "*",
    }
}

/// Render a game as PGN: tag pairs, a blank line, then standard movetext.
pub fn export_pgn(tags: &[(&str, String)], sans: &[String], result: &str) -> String {
    let mut pgn = String::new();
    for (key, value) in tags {
        pgn.push_str(&format!("[{key} \"{}\"]\n", value.replace('"', "'")));
    }
    pgn.push_str(&format!("[Result \"{result}\"]\n\n"));

    for (i, san) in sans.iter().enumerate() {
        if i % 2 == 0 {
            pgn.push_str(&format!("{}. ", i / 2 + 1));
        }
        pgn.push_str(san);
        pgn.push(' ');
    }
    pgn.push_str(result);
    pgn
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sans(moves: &[&str]) -> Vec<String> {
        moves.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_format_movetext() {
        assert_eq!(format_movetext(&[]), "");
        assert_eq!(
            format_movetext(&sans(&["e4", "e5", "Nf3"])),
            "1. e4 1... e5 2. Nf3"
        );
    }

    #[test]
    fn test_result_token() {
        assert_eq!(result_token(GameStatus::Checkmate, Color::White), "0-1");
        assert_eq!(result_token(GameStatus::Checkmate, Color::Black), "1-0");
        assert_eq!(result_token(GameStatus::Stalemate, Color::White), "1/2-1/2");
        assert_eq!(result_token(GameStatus::Check, Color::White), "*");
    }

    #[test]
    fn test_export_pgn() {
        let pgn = export_pgn(
            &[("White", "Human".to_string()), ("Black", "Stockfish".to_string())],
            &sans(&["f3", "e5", "g4", "Qh4#"]),
            "0-1",
        );
        assert_eq!(
            pgn,
            "[White \"Human\"]\n[Black \"Stockfish\"]\n[Result \"0-1\"]\n\n1. f3 e5 2. g4 Qh4# 0-1"
        );
    }
}
