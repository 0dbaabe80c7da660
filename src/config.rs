//! Environment-driven configuration.
//!
//! Only two knobs exist: the listen port and the directory the browser
//! client is served from. Both come from the environment, with `.env`
//! support via dotenvy in `main`.

use std::path::PathBuf;

/// Configuration errors surfaced at startup.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid PORT value {0:?}")]
    InvalidPort(String),
}

/// Server configuration resolved from the environment.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP port to listen on. `PORT`, default 3000.
    pub port: u16,
    /// Directory holding the static browser client. `STATIC_DIR`,
    /// default `<manifest dir>/static`.
    pub static_dir: PathBuf,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPort` if `PORT` is set but not a valid
    /// u16.
    pub fn from_env() -> Result<Self, ConfigError> {
        let port = match std::env::var("PORT") {
            Ok(raw) => raw.parse().map_err(|_| ConfigError::InvalidPort(raw))?,
            Err(_) => 3000,
        };

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static"));

        Ok(Self { port, static_dir })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_port_is_reported() {
        let err = "not-a-port".parse::<u16>().map_err(|_| ConfigError::InvalidPort("not-a-port".into()));
        assert!(matches!(err, Err(ConfigError::InvalidPort(raw)) if raw == "not-a-port"));
    }

    #[test]
    fn default_static_dir_points_at_manifest() {
        // Direct construction; from_env reads process-global state and
        // env-var tests race across threads.
        let config = Config { port: 3000, static_dir: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("static") };
        assert!(config.static_dir.ends_with("static"));
    }
}
