//! Stockfish engine wrapper using UCI protocol (async I/O)

use std::time::Duration;

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};

use tracing::{debug, info};

use crate::error::OpponentError;

/// How long one search may run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchLimit {
    Nodes(u32),
    MoveTime(Duration),
}

impl SearchLimit {
    fn go_command(self) -> String {
        match self {
            SearchLimit::Nodes(nodes) => format!("go nodes {nodes}"),
            SearchLimit::MoveTime(time) => format!("go movetime {}", time.as_millis()),
        }
    }
}

/// Result of a single search
#[derive(Debug, Clone, Default)]
pub struct SearchResult {
    /// Centipawn score (from engine's perspective, i.e., side to move)
    pub cp: Option<i32>,
    /// Mate in N moves (positive = side to move mates)
    pub mate: Option<i32>,
    /// Best move in UCI notation, `(none)` when there is no legal move
    pub best_move: String,
    /// Principal variation of the last reported depth
    pub pv: Vec<String>,
}

/// Stockfish engine instance
pub struct StockfishEngine {
    process: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

impl StockfishEngine {
    /// Spawn a new Stockfish process and initialize UCI
    pub async fn new(path: &str, skill_level: Option<u8>) -> Result<Self, OpponentError> {
        let mut process = Command::new(path)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| OpponentError::Stockfish(format!("Failed to spawn Stockfish at {path}: {e}")))?;

        let stdin = process
            .stdin
            .take()
            .ok_or_else(|| OpponentError::Stockfish("stdin not captured".into()))?;
        let stdout = process
            .stdout
            .take()
            .ok_or_else(|| OpponentError::Stockfish("stdout not captured".into()))?;

        let mut engine = Self {
            process,
            stdin,
            stdout: BufReader::new(stdout),
        };

        engine.send("uci").await?;
        engine.wait_for("uciok").await?;

        engine.send("setoption name Threads value 1").await?;
        engine.send("setoption name Hash value 64").await?;
        if let Some(level) = skill_level {
            engine
                .send(&format!("setoption name Skill Level value {level}"))
                .await?;
        }
        engine.send("isready").await?;
        engine.wait_for("readyok").await?;

        info!(path, ?skill_level, "Stockfish ready");
        Ok(engine)
    }

    /// Send a command to Stockfish
    async fn send(&mut self, cmd: &str) -> Result<(), OpponentError> {
        debug!(cmd, "SF <");
        self.stdin
            .write_all(format!("{cmd}\n").as_bytes())
            .await
            .map_err(|e| OpponentError::Stockfish(format!("Failed to write to Stockfish: {e}")))?;
        self.stdin
            .flush()
            .await
            .map_err(|e| OpponentError::Stockfish(format!("Failed to flush stdin: {e}")))?;
        Ok(())
    }

    /// Read one line, trimmed. End of output means the process is gone.
    async fn read_line(&mut self, line: &mut String) -> Result<(), OpponentError> {
        line.clear();
        let read = self
            .stdout
            .read_line(line)
            .await
            .map_err(|e| OpponentError::Stockfish(format!("Failed to read from Stockfish: {e}")))?;
        if read == 0 {
            return Err(OpponentError::Stockfish("Stockfish closed its output".into()));
        }
        Ok(())
    }

    /// Wait for a specific response line
    async fn wait_for(&mut self, expected: &str) -> Result<(), OpponentError> {
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();
            debug!(line = trimmed, "SF >");
            if trimmed == expected {
                return Ok(());
            }
        }
    }

    /// Search a position and return the best move with its score.
    ///
    /// A previous search may have been abandoned half way, so any search still
    /// running is stopped and its output drained before the new one starts.
    pub async fn search(&mut self, fen: &str, limit: SearchLimit) -> Result<SearchResult, OpponentError> {
        self.send("stop").await?;
        self.send("isready").await?;
        self.wait_for("readyok").await?;

        self.send(&format!("position fen {fen}")).await?;
        self.send(&limit.go_command()).await?;

        let mut result = SearchResult::default();
        let mut line = String::new();
        loop {
            self.read_line(&mut line).await?;
            let trimmed = line.trim();

            if trimmed.starts_with("info") && trimmed.contains(" pv ") {
                if let Some(cp) = parse_cp(trimmed) {
                    result.cp = Some(cp);
                    result.mate = None;
                }
                if let Some(mate) = parse_mate(trimmed) {
                    result.mate = Some(mate);
                    result.cp = None;
                }
                result.pv = parse_pv(trimmed);
            } else if trimmed.starts_with("bestmove") {
                debug!(line = trimmed, "SF >");
                result.best_move = parse_bestmove(trimmed)
                    .ok_or_else(|| OpponentError::Stockfish(format!("Malformed reply: {trimmed}")))?;
                break;
            }
        }

        Ok(result)
    }

    /// Send quit command and wait for process to exit
    pub async fn quit(&mut self) {
        let _ = self.send("quit").await;
        let _ = self.process.wait().await;
        info!("Stockfish exited");
    }
}

impl Drop for StockfishEngine {
    fn drop(&mut self) {
        // Best-effort synchronous kill in drop
        let _ = self.process.start_kill();
    }
}

/// Value following `keyword` in a whitespace-separated line.
fn parse_after<T: std::str::FromStr>(line: &str, keyword: &str) -> Option<T> {
    let mut parts = line.split_whitespace();
    parts.find(|part| *part == keyword)?;
    parts.next()?.parse().ok()
}

/// Parse centipawn score from info line
fn parse_cp(line: &str) -> Option<i32> {
    parse_after(line, "cp")
}

/// Parse mate score from info line
fn parse_mate(line: &str) -> Option<i32> {
    parse_after(line, "mate")
}

/// Parse PV moves from info line
fn parse_pv(line: &str) -> Vec<String> {
    let mut moves = Vec::new();
    let mut in_pv = false;

    for part in line.split_whitespace() {
        if part == "pv" {
            in_pv = true;
            continue;
        }
        if in_pv {
            // PV ends at next keyword or end of line
            if part.starts_with("bmc") || part == "string" {
                break;
            }
            moves.push(part.to_string());
        }
    }

    moves
}

fn parse_bestmove(line: &str) -> Option<String> {
    parse_after(line, "bestmove")
}
