use std::str::FromStr;

use chess_core::{color_name, Color};

use crate::error::SessionError;

/// Who controls the two sides.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameMode {
    HumanVsHuman,
    /// The side not assigned to the human is played by the opponent engine.
    HumanVsOpponent { human_side: Color },
}

/// Settings for one game session. Never changed mid-session; a new session
/// starts through [`crate::GameSession::reconfigure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameSettings {
    pub mode: GameMode,
}

impl GameSettings {
    pub fn human_vs_human() -> Self {
        Self {
            mode: GameMode::HumanVsHuman,
        }
    }

    pub fn human_vs_opponent(human_side: Color) -> Self {
        Self {
            mode: GameMode::HumanVsOpponent { human_side },
        }
    }

    pub fn is_vs_opponent(&self) -> bool {
        matches!(self.mode, GameMode::HumanVsOpponent { .. })
    }

    pub fn human_side(&self) -> Option<Color> {
        match self.mode {
            GameMode::HumanVsHuman => None,
            GameMode::HumanVsOpponent { human_side } => Some(human_side),
        }
    }

    pub fn opponent_side(&self) -> Option<Color> {
        self.human_side().map(Color::other)
    }

    pub fn mode_label(&self) -> &'static str {
        match self.mode {
            GameMode::HumanVsHuman => "Human vs Human",
            GameMode::HumanVsOpponent { .. } => "Human vs CPU",
        }
    }

    /// Build settings from the textual mode and color used by the setup
    /// screen and the environment (`human-vs-cpu`, `white`).
    pub fn parse(mode: &str, human_color: &str) -> Result<Self, SessionError> {
        match mode.trim().to_ascii_lowercase().as_str() {
            "human-vs-human" | "hvh" => Ok(Self::human_vs_human()),
            "human-vs-cpu" | "human-vs-opponent" | "hvc" => {
                Ok(Self::human_vs_opponent(parse_color(human_color)?))
            }
            other => Err(SessionError::InvalidSetting(format!(
                "unknown game mode '{other}'"
            ))),
        }
    }
}

impl Default for GameSettings {
    fn default() -> Self {
        Self::human_vs_opponent(Color::White)
    }
}

impl FromStr for GameSettings {
    type Err = SessionError;

    /// `human-vs-human`, or `human-vs-cpu[:color]` (color defaults to white).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(':') {
            Some((mode, color)) => Self::parse(mode, color),
            None => Self::parse(s, "white"),
        }
    }
}

fn parse_color(text: &str) -> Result<Color, SessionError> {
    match text.trim().to_ascii_lowercase().as_str() {
        "white" | "w" => Ok(Color::White),
        "black" | "b" => Ok(Color::Black),
        other => Err(SessionError::InvalidSetting(format!(
            "unknown color '{other}'"
        ))),
    }
}

pub(crate) fn human_color_label(settings: &GameSettings) -> Option<String> {
    settings.human_side().map(|side| color_name(side).to_string())
}
