// ⚙️ Configuration - optional `expense-tracker.toml`
//
// A minimal config looks like:
//
//   database = "expenses.db"
//   currency = "$"
//   require_description = true
//
// Every key is optional; a missing file means defaults.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "expense-tracker.toml";

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrackerConfig {
    /// SQLite database holding the expenses
    pub database: PathBuf,

    /// Symbol printed in front of amounts
    pub currency: String,

    /// Whether expenses must carry a description
    pub require_description: bool,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        TrackerConfig {
            database: PathBuf::from("expenses.db"),
            currency: "$".to_string(),
            require_description: true,
        }
    }
}

impl TrackerConfig {
    /// Load `explicit` if given (it must exist), else `./expense-tracker.toml`
    /// if present, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => {
                let default_path = std::env::current_dir()
                    .context("Failed to resolve working directory")?
                    .join(CONFIG_FILE);
                if !default_path.exists() {
                    tracing::debug!("no {} found, using defaults", CONFIG_FILE);
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config = Self::from_toml_str(&text)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!(path = %path.display(), "config loaded");
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn with_database(mut self, database: Option<PathBuf>) -> Self {
        if let Some(database) = database {
            self.database = database;
        }
        self
    }

    pub fn format_amount(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency, amount)
    }
}
