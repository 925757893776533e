//! Server configuration loaded from environment variables.

use std::path::PathBuf;

use anyhow::{Context, Result};

pub const DEFAULT_PORT: u16 = 3000;

#[derive(Clone, Debug)]
pub struct ServerConfig {
    /// SQLite file (from PLANTREE_DB_PATH). `None` uses the platform data directory.
    pub db_path: Option<PathBuf>,
    /// HTTP port (from PLANTREE_PORT)
    pub port: u16,
    /// Bearer token required on API requests (from PLANTREE_API_KEY)
    pub api_key: Option<String>,
    /// Allowed CORS origins (from PLANTREE_CORS_ORIGINS, comma-separated)
    pub cors_origins: Option<Vec<String>>,
}

impl ServerConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let port = match lookup("PLANTREE_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .with_context(|| format!("Invalid PLANTREE_PORT: {raw}"))?,
            None => DEFAULT_PORT,
        };

        let cors_origins = lookup("PLANTREE_CORS_ORIGINS").map(|s| {
            s.split(',')
                .map(|o| o.trim().to_string())
                .filter(|o| !o.is_empty())
                .collect()
        });

        Ok(Self {
            db_path: lookup("PLANTREE_DB_PATH").map(PathBuf::from),
            port,
            api_key: lookup("PLANTREE_API_KEY").filter(|k| !k.is_empty()),
            cors_origins,
        })
    }

    /// No auth, permissive CORS, default port (for local development/testing).
    pub fn local() -> Self {
        Self {
            db_path: None,
            port: DEFAULT_PORT,
            api_key: None,
            cors_origins: None,
        }
    }

    /// Create a config with authentication enabled (for testing).
    pub fn with_api_key(key: impl Into<String>) -> Self {
        Self {
            api_key: Some(key.into()),
            ..Self::local()
        }
    }
}
