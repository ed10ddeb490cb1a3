//! Environment-backed configuration
//!
//! All runtime knobs come from environment variables (optionally seeded from
//! a `.env` file by the binary before `Config::from_env` runs).

use anyhow::{Context, Result};
use chrono::FixedOffset;

/// Runtime configuration for the bot process
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client id for the Slack app
    pub slack_client_id: String,
    /// OAuth client secret for the Slack app
    pub slack_client_secret: String,
    /// Redirect URI registered with the Slack app
    pub slack_redirect_uri: String,
    /// Fallback bot token used when a team has no stored OAuth token
    pub slack_fallback_token: Option<String>,
    /// Path to the sqlite database file
    pub database_path: String,
    /// Address the inbound event server binds to
    pub listen_addr: String,
    /// Wall-clock time (HH:MM, target timezone) of the daily reminder sweep
    pub dispatch_time: String,
    /// Fixed UTC offset in hours used for "today" comparisons
    pub timezone_offset_hours: i32,
    /// Default log filter when RUST_LOG is unset
    pub log_level: String,
}

impl Config {
    /// Build configuration from the process environment.
    ///
    /// Only the OAuth credentials are required; everything else has a
    /// sensible default for local runs.
    pub fn from_env() -> Result<Self> {
        Ok(Config {
            slack_client_id: required("SLACK_CLIENT_ID")?,
            slack_client_secret: required("SLACK_CLIENT_SECRET")?,
            slack_redirect_uri: required("SLACK_REDIRECT_URI")?,
            slack_fallback_token: std::env::var("SLACK_BOT_TOKEN").ok(),
            database_path: optional("DATABASE_PATH", "yotei.db"),
            listen_addr: optional("LISTEN_ADDR", "0.0.0.0:3000"),
            dispatch_time: optional("DISPATCH_TIME", "09:00"),
            timezone_offset_hours: optional("TIMEZONE_OFFSET_HOURS", "9")
                .parse()
                .context("TIMEZONE_OFFSET_HOURS must be an integer")?,
            log_level: optional("LOG_LEVEL", "info"),
        })
    }

    /// The fixed target timezone used for "today" comparisons (default JST)
    pub fn timezone(&self) -> Result<FixedOffset> {
        FixedOffset::east_opt(self.timezone_offset_hours * 3600)
            .context("TIMEZONE_OFFSET_HOURS out of range")
    }
}

fn required(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("missing required env var {key}"))
}

fn optional(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timezone_default_jst() {
        let config = Config {
            slack_client_id: String::new(),
            slack_client_secret: String::new(),
            slack_redirect_uri: String::new(),
            slack_fallback_token: None,
            database_path: String::new(),
            listen_addr: String::new(),
            dispatch_time: "09:00".to_string(),
            timezone_offset_hours: 9,
            log_level: "info".to_string(),
        };
        let tz = config.timezone().unwrap();
        assert_eq!(tz.local_minus_utc(), 9 * 3600);
    }
}
