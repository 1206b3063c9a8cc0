use std::{env, path::PathBuf};

pub const DEFAULT_SOURCE: &str = "ventas_tienda.csv";
pub const DEFAULT_PORT: u16 = 8080;

/// Runtime settings, read from the environment once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    /// CSV file the dashboard reads (`SALES_CSV`).
    pub source: PathBuf,
    /// Listen port (`PORT`).
    pub port: u16,
    /// Fallback tracing directive when `RUST_LOG` is unset (`LOG_LEVEL`).
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            source: PathBuf::from(DEFAULT_SOURCE),
            port: DEFAULT_PORT,
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build settings from any key lookup; unset or unparsable values fall
    /// back to the defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let source = lookup("SALES_CSV")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from)
            .unwrap_or(defaults.source);
        let port = lookup("PORT")
            .and_then(|p| p.trim().parse().ok())
            .unwrap_or(defaults.port);
        let log_level = lookup("LOG_LEVEL")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(defaults.log_level);

        Self {
            source,
            port,
            log_level,
        }
    }
}
