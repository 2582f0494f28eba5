use std::net::SocketAddr;
use std::path::PathBuf;

/// Placeholder JWT secrets that MUST NOT be used.
const PLACEHOLDER_SECRETS: &[&str] = &[
    "change-me-to-a-random-string",
    "dev-secret-change-me",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("MUSE_JWT_SECRET is unset or still a placeholder")]
    MissingSecret,
    #[error("invalid {key}: '{value}'")]
    Invalid { key: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    pub jwt_secret: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let jwt_secret = lookup("MUSE_JWT_SECRET").unwrap_or_default();
        if jwt_secret.is_empty() || PLACEHOLDER_SECRETS.contains(&jwt_secret.as_str()) {
            return Err(ConfigError::MissingSecret);
        }

        let db_path = lookup("MUSE_DB_PATH").unwrap_or_else(|| "muse.db".into()).into();
        let host = lookup("MUSE_HOST").unwrap_or_else(|| "0.0.0.0".into());
        let port = match lookup("MUSE_PORT") {
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                key: "MUSE_PORT",
                value: raw,
            })?,
            None => 3000,
        };

        Ok(Self {
            jwt_secret,
            db_path,
            host,
            port,
        })
    }

    pub fn addr(&self) -> Result<SocketAddr, ConfigError> {
        let raw = format!("{}:{}", self.host, self.port);
        raw.parse().map_err(|_| ConfigError::Invalid {
            key: "MUSE_HOST",
            value: self.host.clone(),
        })
    }
}
