//! Read-only view of the game for the spoken assistant.

use chess_core::pgn::format_movetext;
use chess_core::{color_name, GameStatus};
use serde::Serialize;

use crate::analysis::EngineAnalysis;
use crate::settings::{human_color_label, GameSettings};
use crate::store::PositionStore;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisSnapshot {
    /// Pawns from white's point of view
    pub evaluation: f64,
    /// Winning chances of the side to move in the analyzed position
    pub winning_percentage: f64,
    pub suggested_moves: Vec<String>,
    pub analyzed_position: String,
}

impl From<&EngineAnalysis> for AnalysisSnapshot {
    fn from(analysis: &EngineAnalysis) -> Self {
        Self {
            evaluation: analysis.evaluation_pawns(),
            winning_percentage: analysis.winning_percentage(),
            suggested_moves: analysis.suggested_moves(),
            analyzed_position: analysis.fen.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantSnapshot {
    pub position: String,
    pub game_mode: String,
    pub human_color: Option<String>,
    pub current_turn: String,
    pub game_status: String,
    pub move_history: String,
    pub last_move: String,
    pub thinking: bool,
    pub analysis: Option<AnalysisSnapshot>,
}

impl AssistantSnapshot {
    pub fn capture(
        settings: &GameSettings,
        store: &PositionStore,
        status: GameStatus,
        thinking: bool,
        analysis: Option<&EngineAnalysis>,
    ) -> Self {
        let position = store.position();
        Self {
            position: position.fen().to_string(),
            game_mode: settings.mode_label().to_string(),
            human_color: human_color_label(settings),
            current_turn: color_name(position.side_to_move()).to_string(),
            game_status: status.label().to_string(),
            move_history: format_movetext(&store.san_moves()),
            last_move: store
                .last_move()
                .map(|e| e.san.clone())
                .unwrap_or_else(|| "None".to_string()),
            thinking,
            analysis: analysis.map(AnalysisSnapshot::from),
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
