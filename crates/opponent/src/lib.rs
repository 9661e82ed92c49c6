//! Stockfish opponent for game sessions, plus the pieces of the terminal
//! driver that are worth testing on their own.

pub mod board;
pub mod commands;
pub mod config;
pub mod error;
pub mod opponent;
pub mod stockfish;

pub use config::OpponentConfig;
pub use error::OpponentError;
pub use opponent::StockfishOpponent;
