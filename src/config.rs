use std::env;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:5278";
pub const DEFAULT_STATIC_DIR: &str = "static";

pub const BIND_ENV: &str = "GACHA_EV_BIND";
pub const TABLES_ENV: &str = "GACHA_EV_TABLES";
pub const STATIC_DIR_ENV: &str = "GACHA_EV_STATIC_DIR";

/// Process settings, read once at start-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub bind_addr: String,
    /// Reward-table file; built-in tables when `None`.
    pub tables_path: Option<PathBuf>,
    pub static_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            tables_path: None,
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build from an arbitrary key lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();
        Self {
            bind_addr: read(BIND_ENV).unwrap_or(defaults.bind_addr),
            tables_path: read(TABLES_ENV).map(PathBuf::from),
            static_dir: read(STATIC_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or(defaults.static_dir),
        }
    }
}
