use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::core::feed::fetcher::DEFAULT_FETCH_TIMEOUT;
use crate::core::panel::PANEL_ENTRY_SIZE;
use crate::core::static_files::DEFAULT_LOCAL_FEED_DIR;

pub const BIND_KEY: &str = "HOME_PANEL_BIND";
pub const LOCAL_FEED_DIR_KEY: &str = "HOME_PANEL_LOCAL_FEED_DIR";
pub const DEFAULT_LOCAL_FEED_KEY: &str = "HOME_PANEL_DEFAULT_LOCAL_FEED";
pub const MESSAGES_KEY: &str = "HOME_PANEL_MESSAGES";
pub const FETCH_TIMEOUT_KEY: &str = "HOME_PANEL_FETCH_TIMEOUT_MS";
pub const ENTRY_SIZE_KEY: &str = "HOME_PANEL_ENTRY_SIZE";

pub const DEFAULT_BIND: &str = "127.0.0.1:8080";
pub const DEFAULT_LOCAL_FEED: &str = "user-forum.xml";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid value for {key}: {value:?}")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub local_feed_dir: PathBuf,
    pub default_local_feed: String,
    pub message_catalog: Option<PathBuf>,
    pub fetch_timeout: Duration,
    pub panel_entry_size: usize,
}

impl AppConfig {
    /// Reads `.env.local` when present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::from_filename(".env.local");
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let bind_addr = match value(BIND_KEY) {
            Some(raw) => parse_value(BIND_KEY, &raw)?,
            None => parse_value(BIND_KEY, DEFAULT_BIND)?,
        };
        let fetch_timeout = match value(FETCH_TIMEOUT_KEY) {
            Some(raw) => Duration::from_millis(parse_value(FETCH_TIMEOUT_KEY, &raw)?),
            None => DEFAULT_FETCH_TIMEOUT,
        };
        let panel_entry_size = match value(ENTRY_SIZE_KEY) {
            Some(raw) => parse_value(ENTRY_SIZE_KEY, &raw)?,
            None => PANEL_ENTRY_SIZE,
        };
        let default_local_feed =
            value(DEFAULT_LOCAL_FEED_KEY).unwrap_or_else(|| DEFAULT_LOCAL_FEED.to_string());
        if default_local_feed.contains(['/', '\\']) {
            return Err(ConfigError::Invalid {
                key: DEFAULT_LOCAL_FEED_KEY,
                value: default_local_feed,
            });
        }

        Ok(Self {
            bind_addr,
            local_feed_dir: value(LOCAL_FEED_DIR_KEY)
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_LOCAL_FEED_DIR)),
            default_local_feed,
            message_catalog: value(MESSAGES_KEY).map(PathBuf::from),
            fetch_timeout,
            panel_entry_size,
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: raw.to_string(),
    })
}
