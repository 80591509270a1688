// ============================
// chamber-backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use anyhow::{bail, Result};
use chamber_common::{DEFAULT_CHAT_CAPACITY, DEFAULT_SEAT_COUNT};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Default config file, looked up in the working directory
pub const CONFIG_FILE: &str = "chamber.toml";
/// Prefix for environment overrides, e.g. `CHAMBER_SEAT_COUNT=30`
pub const ENV_PREFIX: &str = "CHAMBER_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Server bind address
    pub bind_addr: SocketAddr,
    /// Number of seats in the chamber
    pub seat_count: u32,
    /// Chat messages kept in memory
    pub chat_capacity: usize,
    /// Directory served at `/`; `None` disables static hosting
    pub static_dir: Option<PathBuf>,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub json_logs: bool,
    /// Allow cross-origin requests from anywhere
    pub cors_allow_any: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3000)),
            seat_count: DEFAULT_SEAT_COUNT,
            chat_capacity: DEFAULT_CHAT_CAPACITY,
            static_dir: Some(PathBuf::from("public")),
            log_level: "info".to_string(),
            json_logs: false,
            cors_allow_any: true,
        }
    }
}

impl Settings {
    /// Defaults, then `path`, then `CHAMBER_*` environment variables
    pub fn figment(path: impl AsRef<Path>) -> Figment {
        Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed(ENV_PREFIX))
    }

    /// Load settings from `chamber.toml` and the environment
    pub fn load() -> Result<Self> {
        Self::load_from(CONFIG_FILE)
    }

    /// Load settings from an explicit file path and the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let settings: Settings = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.seat_count == 0 {
            bail!("seat_count must be at least 1");
        }
        if self.chat_capacity == 0 {
            bail!("chat_capacity must be at least 1");
        }
        if !LOG_LEVELS.contains(&self.log_level.to_lowercase().as_str()) {
            bail!(
                "log_level must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                self.log_level
            );
        }
        Ok(())
    }
}
