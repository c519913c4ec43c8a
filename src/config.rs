// Process configuration
// Built once in main from the environment and passed down by value/reference

use crate::error::ApiError;
use std::env;
use std::str::FromStr;

/// Longest token lifetime accepted from configuration (ten years)
pub const MAX_LIFETIME_SECS: i64 = 10 * 365 * 86_400;

/// Where accounts are persisted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    Postgres,
    /// Process-local store, lost on restart
    Memory,
}

impl FromStr for StorageKind {
    type Err = ApiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "pg" => Ok(StorageKind::Postgres),
            "memory" | "mem" => Ok(StorageKind::Memory),
            other => Err(ApiError::Configuration(format!("Invalid STORAGE value: {}", other))),
        }
    }
}

/// Signing secrets and lifetimes for both token kinds
#[derive(Clone)]
pub struct AuthConfig {
    pub access_secret: String,
    /// in seconds
    pub access_lifetime: i64,
    pub refresh_secret: String,
    /// in seconds
    pub refresh_lifetime: i64,
}

// Secrets stay out of logs
impl std::fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthConfig")
            .field("access_secret", &"<redacted>")
            .field("access_lifetime", &self.access_lifetime)
            .field("refresh_secret", &"<redacted>")
            .field("refresh_lifetime", &self.refresh_lifetime)
            .finish()
    }
}

impl AuthConfig {
    /// Read the four mandatory token settings
    pub fn from_env() -> Result<Self, ApiError> {
        Ok(Self {
            access_secret: required("ACCESS_TOKEN_SECRET")?,
            access_lifetime: parse_lifetime(&required("ACCESS_TOKEN_LIFETIME")?)
                .map_err(|e| ApiError::Configuration(format!("ACCESS_TOKEN_LIFETIME: {}", e)))?,
            refresh_secret: required("REFRESH_TOKEN_SECRET")?,
            refresh_lifetime: parse_lifetime(&required("REFRESH_TOKEN_LIFETIME")?)
                .map_err(|e| ApiError::Configuration(format!("REFRESH_TOKEN_LIFETIME: {}", e)))?,
        })
    }
}

/// Top-level settings for the server binary
#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub storage: StorageKind,
    pub database_url: Option<String>,
    pub auth: AuthConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ApiError> {
        let host = env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string());
        let port = env::var("PORT")
            .unwrap_or_else(|_| "8080".to_string())
            .parse::<u16>()
            .map_err(|e| ApiError::Configuration(format!("Invalid PORT: {}", e)))?;
        let storage = env::var("STORAGE")
            .unwrap_or_else(|_| "postgres".to_string())
            .parse::<StorageKind>()?;

        let database_url = env::var("DATABASE_URL").ok().filter(|url| !url.is_empty());
        if storage == StorageKind::Postgres && database_url.is_none() {
            return Err(ApiError::Configuration(
                "DATABASE_URL must be set when STORAGE=postgres".to_string(),
            ));
        }

        Ok(Self {
            host,
            port,
            storage,
            database_url,
            auth: AuthConfig::from_env()?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(key: &str) -> Result<String, ApiError> {
    match env::var(key) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(ApiError::Configuration(format!("{} must be set", key))),
    }
}

/// Parse a token lifetime: bare seconds, or a number with an s/m/h/d suffix
///
/// `"900"`, `"15m"`, `"12h"` and `"7d"` are all accepted. Zero and values
/// above [`MAX_LIFETIME_SECS`] are rejected.
pub fn parse_lifetime(raw: &str) -> Result<i64, String> {
    let raw = raw.trim();
    let (digits, multiplier) = match raw.chars().last() {
        Some('s') => (&raw[..raw.len() - 1], 1),
        Some('m') => (&raw[..raw.len() - 1], 60),
        Some('h') => (&raw[..raw.len() - 1], 3_600),
        Some('d') => (&raw[..raw.len() - 1], 86_400),
        Some(c) if c.is_ascii_digit() => (raw, 1),
        _ => return Err(format!("unrecognised lifetime '{}'", raw)),
    };

    let value: i64 = digits
        .trim()
        .parse()
        .map_err(|_| format!("unrecognised lifetime '{}'", raw))?;
    if value <= 0 {
        return Err(format!("lifetime must be positive, got '{}'", raw));
    }
    value
        .checked_mul(multiplier)
        .filter(|secs| *secs <= MAX_LIFETIME_SECS)
        .ok_or_else(|| format!("lifetime '{}' is too large", raw))
}
