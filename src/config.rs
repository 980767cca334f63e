use anyhow::{Context, Result};
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::str::FromStr;

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 3000))
}

fn default_max_file_size() -> usize {
    // 10 MB in bytes
    10 * 1024 * 1024
}

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub max_file_size: usize,
    pub preview_rows: usize,
    pub histogram_bins: usize,
    pub session_idle_secs: u64,
    pub max_sessions: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            max_file_size: default_max_file_size(),
            preview_rows: 5,
            histogram_bins: 20,
            session_idle_secs: 30 * 60,
            max_sessions: 256,
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let config = Config {
            bind_addr: parse_var(&lookup, "BIND_ADDR", defaults.bind_addr)?,
            max_file_size: parse_var(&lookup, "MAX_FILE_SIZE", defaults.max_file_size)?,
            preview_rows: parse_var(&lookup, "PREVIEW_ROWS", defaults.preview_rows)?,
            histogram_bins: parse_var(&lookup, "HISTOGRAM_BINS", defaults.histogram_bins)?,
            session_idle_secs: parse_var(&lookup, "SESSION_IDLE_SECS", defaults.session_idle_secs)?,
            max_sessions: parse_var(&lookup, "MAX_SESSIONS", defaults.max_sessions)?,
        };

        if config.histogram_bins == 0 {
            anyhow::bail!("HISTOGRAM_BINS must be at least 1");
        }

        Ok(config)
    }
}

fn parse_var<F, T>(lookup: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("{}", e))
            .with_context(|| format!("Invalid value for {}: {:?}", key, raw)),
        None => Ok(default),
    }
}

pub fn load_config() -> Result<Config> {
    // Load .env file first
    dotenv().ok();
    Config::from_env()
}
