//! Driver configuration from environment variables and command-line flags

use std::env;
use std::time::Duration;

use game_session::GameSettings;
use tracing::info;

use crate::error::OpponentError;
use crate::stockfish::SearchLimit;

const MAX_SKILL_LEVEL: u8 = 20;

#[derive(Clone, Debug)]
pub struct OpponentConfig {
    /// Path to Stockfish binary
    pub stockfish_path: String,

    /// Nodes per search
    pub nodes: u32,

    /// Fixed time per search; takes precedence over `nodes`
    pub movetime_ms: Option<u64>,

    /// Stockfish `Skill Level` (0-20); full strength when unset
    pub skill_level: Option<u8>,

    /// How long a single engine request may take
    pub request_timeout: Duration,

    /// `human-vs-cpu` or `human-vs-human`
    pub game_mode: String,

    /// Side the human plays against the engine
    pub human_color: String,
}

impl OpponentConfig {
    /// Load configuration from environment variables.
    pub fn load() -> Result<Self, OpponentError> {
        let stockfish_path = env::var("STOCKFISH_PATH")
            .unwrap_or_else(|_| "/usr/local/bin/stockfish".to_string());

        let nodes = env::var("ENGINE_NODES")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(200_000);

        let movetime_ms = env::var("ENGINE_MOVETIME_MS")
            .ok()
            .and_then(|v| v.parse().ok());

        let skill_level = match env::var("ENGINE_SKILL_LEVEL").ok() {
            Some(raw) => Some(parse_skill_level(&raw)?),
            None => None,
        };

        let timeout_secs = env::var("ENGINE_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        let game_mode = env::var("GAME_MODE").unwrap_or_else(|_| "human-vs-cpu".to_string());
        let human_color = env::var("HUMAN_COLOR").unwrap_or_else(|_| "white".to_string());

        Ok(Self {
            stockfish_path,
            nodes,
            movetime_ms,
            skill_level,
            request_timeout: Duration::from_secs(timeout_secs),
            game_mode,
            human_color,
        })
    }

    /// Apply `--mode <mode>` and `--color <color>` on top of the environment.
    pub fn with_args<I>(mut self, args: I) -> Result<Self, OpponentError>
    where
        I: IntoIterator<Item = String>,
    {
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let target = match arg.as_str() {
                "--mode" => &mut self.game_mode,
                "--color" => &mut self.human_color,
                other => return Err(OpponentError::Config(format!("unknown argument '{other}'"))),
            };
            *target = args
                .next()
                .ok_or_else(|| OpponentError::Config(format!("{arg} needs a value")))?;
        }
        info!(mode = %self.game_mode, color = %self.human_color, "Configuration loaded");
        Ok(self)
    }

    pub fn settings(&self) -> Result<GameSettings, OpponentError> {
        Ok(GameSettings::parse(&self.game_mode, &self.human_color)?)
    }

    pub fn search_limit(&self) -> SearchLimit {
        match self.movetime_ms {
            Some(ms) => SearchLimit::MoveTime(Duration::from_millis(ms)),
            None => SearchLimit::Nodes(self.nodes),
        }
    }
}

fn parse_skill_level(raw: &str) -> Result<u8, OpponentError> {
    raw.trim()
        .parse::<u8>()
        .ok()
        .filter(|level| *level <= MAX_SKILL_LEVEL)
        .ok_or_else(|| {
            OpponentError::Config(format!(
                "ENGINE_SKILL_LEVEL must be 0-{MAX_SKILL_LEVEL}, got '{raw}'"
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chess_core::Color;

    fn config() -> OpponentConfig {
        OpponentConfig {
            stockfish_path: "stockfish".to_string(),
            nodes: 1000,
            movetime_ms: None,
            skill_level: None,
            request_timeout: Duration::from_secs(5),
            game_mode: "human-vs-cpu".to_string(),
            human_color: "white".to_string(),
        }
    }

    #[test]
    fn test_cli_flags_override() {
        let args = ["--mode", "human-vs-cpu", "--color", "black"].map(String::from);
        let config = config().with_args(args).unwrap();
        assert_eq!(
            config.settings().unwrap(),
            GameSettings::human_vs_opponent(Color::Black)
        );
    }

    #[test]
    fn test_cli_flag_without_value() {
        let args = ["--color".to_string()];
        assert!(matches!(
            config().with_args(args),
            Err(OpponentError::Config(_))
        ));
    }

    #[test]
    fn test_movetime_wins_over_nodes() {
        let mut config = config();
        assert_eq!(config.search_limit(), SearchLimit::Nodes(1000));
        config.movetime_ms = Some(500);
        assert_eq!(
            config.search_limit(),
            SearchLimit::MoveTime(Duration::from_millis(500))
        );
    }

    #[test]
    fn test_skill_level_range() {
        assert_eq!(parse_skill_level("0").unwrap(), 0);
        assert_eq!(parse_skill_level(" 20 ").unwrap(), 20);
        assert!(parse_skill_level("21").is_err());
        assert!(parse_skill_level("strong").is_err());
    }
}
