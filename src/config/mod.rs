//! Configuration for PageWatch
//!
//! Values are resolved in layers, later layers win:
//! 1. built-in defaults
//! 2. `~/.pagewatch/config.json` (optional)
//! 3. environment (`.env` is loaded first through dotenvy)
//! 4. command-line flags (applied by the CLI)
//!
//! There is no built-in bot token or chat id.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, WatchError};
use crate::fetch::BROWSER_USER_AGENT;
use crate::scheduler::MAX_INTERVAL_SECS;

/// Default phrase: "register now".
pub const DEFAULT_FIND: &str = "سجل الان";

/// Upper bound on the per-request timeout, in seconds.
pub const MAX_TIMEOUT_SECS: f64 = 3600.0;

pub const ENV_FIND: &str = "PAGEWATCH_FIND";
pub const ENV_TIMEOUT: &str = "PAGEWATCH_TIMEOUT";
pub const ENV_INTERVAL: &str = "PAGEWATCH_INTERVAL";
pub const ENV_TICK_MS: &str = "PAGEWATCH_TICK_MS";
pub const ENV_TELEGRAM_TOKEN: &str = "TELEGRAM_BOT_TOKEN";
pub const ENV_TELEGRAM_CHAT_ID: &str = "TELEGRAM_CHAT_ID";

/// Telegram credentials.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub token: Option<String>,
    /// Chat that receives CLI-mode detections and the bot startup banner.
    pub chat_id: Option<String>,
}

impl TelegramConfig {
    /// Token if set and non-blank.
    pub fn token(&self) -> Option<&str> {
        non_blank(self.token.as_deref())
    }

    pub fn chat_id(&self) -> Option<&str> {
        non_blank(self.chat_id.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Runtime configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Phrase searched for in every page.
    pub find: String,
    /// Per-request timeout in seconds.
    pub timeout_secs: f64,
    /// Seconds between sweeps (CLI watch mode, and the bot default).
    pub interval_secs: f64,
    /// Bot loop granularity in milliseconds.
    pub tick_millis: u64,
    pub user_agent: String,
    pub telegram: TelegramConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            find: DEFAULT_FIND.to_string(),
            timeout_secs: 15.0,
            interval_secs: 5.0,
            tick_millis: 200,
            user_agent: BROWSER_USER_AGENT.to_string(),
            telegram: TelegramConfig::default(),
        }
    }
}

impl Config {
    /// Directory holding PageWatch state (`~/.pagewatch`).
    pub fn dir() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".pagewatch")
    }

    /// Default config file path.
    pub fn path() -> PathBuf {
        Self::dir().join("config.json")
    }

    /// Load defaults, the config file and the environment.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();
        let mut config = Self::load_from_path(&Self::path())?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    /// Load from a file; a missing file yields the defaults.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if !path.exists() {
            debug!("No config file at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| {
            WatchError::Config(format!("Invalid config file {}: {}", path.display(), e))
        })
    }

    /// Override fields from environment-style lookups. Unparseable numbers are
    /// ignored so a stray variable can't take the tool down.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(find) = lookup(ENV_FIND).filter(|v| !v.trim().is_empty()) {
            self.find = find;
        }
        if let Some(v) = lookup(ENV_TIMEOUT).and_then(|v| v.trim().parse().ok()) {
            self.timeout_secs = v;
        }
        if let Some(v) = lookup(ENV_INTERVAL).and_then(|v| v.trim().parse().ok()) {
            self.interval_secs = v;
        }
        if let Some(v) = lookup(ENV_TICK_MS).and_then(|v| v.trim().parse().ok()) {
            self.tick_millis = v;
        }
        if let Some(token) = lookup(ENV_TELEGRAM_TOKEN) {
            self.telegram.token = Some(token);
        }
        if let Some(chat_id) = lookup(ENV_TELEGRAM_CHAT_ID) {
            self.telegram.chat_id = Some(chat_id);
        }
    }

    /// Check values every mode depends on.
    pub fn validate(&self) -> Result<()> {
        if !(self.timeout_secs > 0.0 && self.timeout_secs <= MAX_TIMEOUT_SECS) {
            return Err(WatchError::Config(format!(
                "timeout must be between 0 and {} seconds, got {}",
                MAX_TIMEOUT_SECS, self.timeout_secs
            )));
        }
        let max_interval = MAX_INTERVAL_SECS as f64;
        if !(self.interval_secs > 0.0 && self.interval_secs <= max_interval) {
            return Err(WatchError::Config(format!(
                "interval must be between 0 and {} seconds, got {}",
                max_interval, self.interval_secs
            )));
        }
        if self.tick_millis == 0 {
            return Err(WatchError::Config("tick must be at least 1ms".to_string()));
        }
        Ok(())
    }

    /// Bot mode additionally needs a token.
    pub fn validate_for_bot(&self) -> Result<&str> {
        self.validate()?;
        self.telegram.token().ok_or_else(|| {
            WatchError::Config(format!(
                "Telegram token is required in bot mode (use --tg-token or {})",
                ENV_TELEGRAM_TOKEN
            ))
        })
    }
}
