//! Error types for the engine binary.
//!
//! [`AppError`] collects every startup failure so `main` can propagate
//! with `?`. Once the game is running, failures are the engine's to report
//! as a terminal event; they never surface here.

use werewolf_types::GameId;

/// Top-level error for the engine binary.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: werewolf_core::config::ConfigError,
    },

    /// A snapshot could not be read.
    #[error("snapshot error: {source}")]
    Snapshot {
        /// The underlying store error.
        #[from]
        source: werewolf_core::store::SnapshotError,
    },

    /// A snapshot could not be turned back into a game.
    #[error("resume error: {source}")]
    Resume {
        /// The underlying engine error.
        #[from]
        source: werewolf_core::engine::EngineError,
    },

    /// `resume_game_id` is not a UUID.
    #[error("invalid game id {value:?}: {reason}")]
    InvalidGameId {
        /// The configured value.
        value: String,
        /// Parse failure.
        reason: String,
    },

    /// `resume_game_id` names a game with no snapshot on disk.
    #[error("no snapshot found for game {game_id}")]
    GameNotFound {
        /// The requested game.
        game_id: GameId,
    },

    /// NATS connection or subscription failed.
    #[error("NATS error: {message}")]
    Nats {
        /// Description of the NATS failure.
        message: String,
    },
}
