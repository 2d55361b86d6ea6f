//! Tunable game rules
//!
//! Every field has a default matching the standard game, so a config file
//! only needs the values it changes:
//!
//! ```toml
//! gold_total = 300
//! min_piles = 12
//! ```

use crate::error::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Player icons run from `A` to `Z`.
pub const MAX_ICONS: usize = 26;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Gold shared out across all piles
    pub gold_total: u32,
    /// Lower bound on the pile count, inclusive
    pub min_piles: u32,
    /// Upper bound on the pile count, exclusive
    pub max_piles: u32,
    pub max_players: usize,
    /// Longer player names are truncated
    pub max_name_length: usize,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            gold_total: 250,
            min_piles: 10,
            max_piles: 20,
            max_players: MAX_ICONS,
            max_name_length: 50,
        }
    }
}

impl GameConfig {
    /// Reads and validates a TOML config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)?;
        let config: GameConfig = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gold_total == 0 {
            return Err(ConfigError::Invalid("gold_total must be positive".to_string()));
        }
        if self.min_piles == 0 {
            return Err(ConfigError::Invalid("min_piles must be positive".to_string()));
        }
        if self.min_piles >= self.max_piles {
            return Err(ConfigError::Invalid(format!(
                "min_piles ({}) must be below max_piles ({})",
                self.min_piles, self.max_piles
            )));
        }
        if self.max_players == 0 || self.max_players > MAX_ICONS {
            return Err(ConfigError::Invalid(format!(
                "max_players must be between 1 and {}",
                MAX_ICONS
            )));
        }
        if self.max_name_length == 0 {
            return Err(ConfigError::Invalid("max_name_length must be positive".to_string()));
        }
        Ok(())
    }
}
