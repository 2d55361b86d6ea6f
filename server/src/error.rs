//! Error types for map loading, configuration and the game engine

use thiserror::Error;

/// Errors raised while turning map text into a grid.
#[derive(Debug, Error)]
pub enum MapError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("map source contains no rows")]
    Empty,

    /// Row width is fixed by the first line of the map.
    #[error("row {row} is {len} cells wide but the map is {width} wide")]
    RowTooWide { row: usize, len: usize, width: usize },
}

/// Errors raised while loading or validating a game configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Errors raised by the game engine itself.
#[derive(Debug, Error)]
pub enum GameError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("map has {available} free room cells but {needed} are required")]
    NotEnoughRoom { needed: usize, available: usize },

    #[error("game is over")]
    GameOver,
}
