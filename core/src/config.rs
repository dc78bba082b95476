//! Runtime configuration shared by the server and the client.
//!
//! Values come from the environment (a `.env` file is honored), falling back
//! to defaults. Command-line flags on each binary override what is loaded
//! here.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};

pub const DATA_DIR_VAR: &str = "TODOS_DATA_DIR";
pub const BIND_ADDR_VAR: &str = "TODOS_BIND_ADDR";
pub const API_URL_VAR: &str = "TODOS_API_URL";

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_API_URL: &str = "http://127.0.0.1:3000";

/// Raw settings as found in the environment.
///
/// Each value is parsed only when asked for, so a binary is never rejected
/// for a malformed setting it does not use.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    data_dir: Option<String>,
    bind_addr: Option<String>,
    api_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        Config {
            data_dir: value(DATA_DIR_VAR),
            bind_addr: value(BIND_ADDR_VAR),
            api_url: value(API_URL_VAR),
        }
    }

    /// Directory for the task file and client log; `~/.todos` by default.
    pub fn data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => default_data_dir(),
        }
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        let raw = self.bind_addr.as_deref().unwrap_or(DEFAULT_BIND_ADDR);
        raw.parse()
            .with_context(|| format!("{} is not a socket address: '{}'", BIND_ADDR_VAR, raw))
    }

    /// Base URL of the API without a trailing slash.
    pub fn api_url(&self) -> Result<String> {
        let raw = self.api_url.as_deref().unwrap_or(DEFAULT_API_URL);
        if !(raw.starts_with("http://") || raw.starts_with("https://")) {
            return Err(anyhow!("{} must be an http(s) URL: '{}'", API_URL_VAR, raw));
        }
        Ok(raw.trim_end_matches('/').to_string())
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let home_dir = dirs::home_dir().ok_or_else(|| anyhow!("Could not determine home directory"))?;
    Ok(home_dir.join(".todos"))
}
