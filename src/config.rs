//! Startup configuration.
//!
//! Built once in `main` from the environment (optionally seeded from a
//! `.env` file) and handed to the pieces that need it. Read-only afterwards.
//!
//! | Variable | Required | Default |
//! |---|---|---|
//! | `GITHUB_USERNAME` | yes | |
//! | `GITHUB_TOKEN` | no | unauthenticated |
//! | `PORT` | no | `3000` |
//! | `GITHUB_API_URL` | no | `https://api.github.com` |

use std::fmt;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Process-wide settings.
#[derive(Clone)]
pub struct Config {
    token: Option<String>,
    username: String,
    port: u16,
    api_url: String,
}

impl Config {
    /// Reads the process environment, after loading `.env` if one exists.
    pub fn from_env() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv() {
            if !e.not_found() {
                return Err(ConfigError::DotEnv(e.to_string()));
            }
        }
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads settings through `lookup`. Empty values count as unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let username = get("GITHUB_USERNAME").ok_or(ConfigError::Missing("GITHUB_USERNAME"))?;
        let port = match get("PORT") {
            Some(raw) => raw.trim().parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            token: get("GITHUB_TOKEN"),
            username,
            port,
            api_url: get("GITHUB_API_URL").unwrap_or_else(|| DEFAULT_API_URL.to_owned()),
        })
    }

    pub fn token(&self) -> Option<&str> { self.token.as_deref() }
    pub fn username(&self) -> &str { &self.username }
    pub fn port(&self) -> u16 { self.port }
    pub fn api_url(&self) -> &str { &self.api_url }
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .field("username", &self.username)
            .field("port", &self.port)
            .field("api_url", &self.api_url)
            .finish()
    }
}

// ── ConfigError ───────────────────────────────────────────────────────────────

/// Configuration that cannot be used to start the server.
#[derive(Debug, PartialEq)]
pub enum ConfigError {
    /// A required variable is unset or empty.
    Missing(&'static str),
    /// `PORT` is not a number in `0..=65535`.
    InvalidPort(String),
    /// The token cannot be sent as an HTTP header value.
    InvalidToken,
    /// `.env` exists but could not be read.
    DotEnv(String),
    /// `GITHUB_API_URL` is not an absolute URL with a path.
    InvalidApiUrl(String),
    /// The upstream HTTP client could not be constructed.
    HttpClient(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Missing(key) => write!(f, "{key} must be set"),
            Self::InvalidPort(raw) => write!(f, "PORT is not a valid port: {raw:?}"),
            Self::InvalidToken => f.write_str("GITHUB_TOKEN contains characters not allowed in a header"),
            Self::InvalidApiUrl(raw) => write!(f, "GITHUB_API_URL is not a valid base URL: {raw:?}"),
            Self::DotEnv(msg) => write!(f, "failed to load .env: {msg}"),
            Self::HttpClient(msg) => write!(f, "failed to build HTTP client: {msg}"),
        }
    }
}

impl std::error::Error for ConfigError {}
