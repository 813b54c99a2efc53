//! Bot configuration, optionally read from a TOML file.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Settings for one autonomous game. Missing fields take their defaults.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BotConfig {
    pub height: usize,
    pub width: usize,
    pub mines: usize,

    /// Seed for mine placement and guesses; a fresh one is drawn when unset.
    pub seed: Option<u64>,

    /// How many cells to draw before giving up on a random guess.
    pub max_random_attempts: usize,

    /// Pause between moves, so a game can be watched.
    pub delay_ms: u64,

    /// Cross-check the knowledge base with the SAT solver after every move.
    pub audit: bool,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            height: 8,
            width: 8,
            mines: 8,
            seed: None,
            max_random_attempts: 64,
            delay_ms: 0,
            audit: false,
        }
    }
}

impl BotConfig {
    pub fn validate(&self) -> Result<()> {
        if self.height == 0 || self.width == 0 {
            return Err(anyhow!("height and width must be > 0"));
        }
        if self.mines >= self.height * self.width {
            return Err(anyhow!(
                "mines must be fewer than the {} cells on the board",
                self.height * self.width
            ));
        }
        if self.max_random_attempts == 0 {
            return Err(anyhow!("max_random_attempts must be > 0"));
        }
        Ok(())
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `BotConfig::default()`.
pub fn load_config(path: &Path) -> Result<BotConfig> {
    if !path.exists() {
        return Ok(BotConfig::default());
    }
    let raw = fs::read_to_string(path)
        .with_context(|| format!("read config {}", path.display()))?;
    let config: BotConfig =
        toml::from_str(&raw).with_context(|| format!("parse config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}
