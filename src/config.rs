//! # Bot Configuration Module
//!
//! Runtime settings for the bot process: credentials, pool sizing, the
//! per-call database bound and the limits used by the read-only commands.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::errors::ConfigError;

// Defaults for optional settings
pub const DEFAULT_DB_TIMEOUT_SECS: u64 = 5;
pub const DEFAULT_DB_MAX_CONNECTIONS: u32 = 25;
pub const DEFAULT_HISTORY_LIMIT: i64 = 10;
pub const DEFAULT_STATS_SAMPLE_SIZE: i64 = 100;
pub const DEFAULT_PROGRESS_WINDOW_DAYS: i32 = 30;

/// Limits applied to the read-only commands
#[derive(Debug, Clone, PartialEq)]
pub struct QueryLimits {
    /// Number of sets shown by `/history`
    pub history_limit: i64,
    /// Number of recent sets summarized by `/stats`
    pub stats_sample_size: i64,
    /// Number of days aggregated by `/progress`
    pub progress_window_days: i32,
}

impl Default for QueryLimits {
    fn default() -> Self {
        Self {
            history_limit: DEFAULT_HISTORY_LIMIT,
            stats_sample_size: DEFAULT_STATS_SAMPLE_SIZE,
            progress_window_days: DEFAULT_PROGRESS_WINDOW_DAYS,
        }
    }
}

/// Configuration structure for the bot process
#[derive(Clone)]
pub struct BotConfig {
    /// Telegram bot token
    pub bot_token: String,
    /// Postgres connection string
    pub database_url: String,
    /// Upper bound for a single database round-trip
    pub db_timeout: Duration,
    /// Maximum pooled connections
    pub db_max_connections: u32,
    pub limits: QueryLimits,
}

impl std::fmt::Debug for BotConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BotConfig")
            .field("bot_token", &"<redacted>")
            .field("database_url", &"<redacted>")
            .field("db_timeout", &self.db_timeout)
            .field("db_max_connections", &self.db_max_connections)
            .field("limits", &self.limits)
            .finish()
    }
}

impl BotConfig {
    /// Read the configuration from process environment variables
    ///
    /// `TELEGRAM_BOT_TOKEN` (or `BOT_TOKEN`) and `DATABASE_URL` are required;
    /// everything else falls back to the defaults above.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bot_token = lookup("TELEGRAM_BOT_TOKEN")
            .or_else(|| lookup("BOT_TOKEN"))
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("TELEGRAM_BOT_TOKEN"))?;

        let database_url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;

        let db_timeout_secs: u64 =
            parse_or_default(&lookup, "DB_TIMEOUT_SECS", DEFAULT_DB_TIMEOUT_SECS)?;
        if db_timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "DB_TIMEOUT_SECS",
                value: "0".to_string(),
            });
        }

        let limits = QueryLimits {
            history_limit: parse_or_default(&lookup, "HISTORY_LIMIT", DEFAULT_HISTORY_LIMIT)?,
            stats_sample_size: parse_or_default(
                &lookup,
                "STATS_SAMPLE_SIZE",
                DEFAULT_STATS_SAMPLE_SIZE,
            )?,
            progress_window_days: parse_or_default(
                &lookup,
                "PROGRESS_WINDOW_DAYS",
                DEFAULT_PROGRESS_WINDOW_DAYS,
            )?,
        };

        Ok(Self {
            bot_token,
            database_url,
            db_timeout: Duration::from_secs(db_timeout_secs),
            db_max_connections: parse_or_default(
                &lookup,
                "DB_MAX_CONNECTIONS",
                DEFAULT_DB_MAX_CONNECTIONS,
            )?,
            limits,
        })
    }
}

fn parse_or_default<F, T>(lookup: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(name) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<T>().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}
