//! Shared configuration paths.
//!
//! # Storage Structure
//!
//! ```text
//! ~/.restock-notifier/
//! └── config/
//!     ├── config.toml   # Settings
//!     └── .env.local    # Secrets (bot token)
//! ```
//!
//! # Environment Variables
//!
//! - `RESTOCK_STATE_DIR`: Override the base state directory
//! - `RESTOCK_CONFIG_DIR`: Override the config directory

use std::path::PathBuf;
use std::sync::OnceLock;

/// Environment variable for custom state directory.
pub const STATE_DIR_ENV: &str = "RESTOCK_STATE_DIR";

/// Environment variable for custom config directory.
pub const CONFIG_DIR_ENV: &str = "RESTOCK_CONFIG_DIR";

/// Default state directory name under home.
const DEFAULT_STATE_DIR: &str = ".restock-notifier";

const CONFIG_SUBDIR: &str = "config";

static STATE_DIR_CACHE: OnceLock<PathBuf> = OnceLock::new();

/// Get the state directory.
///
/// Determined by:
/// 1. `RESTOCK_STATE_DIR` environment variable if set
/// 2. `~/.restock-notifier` if home directory is available
/// 3. `.restock-notifier` in current directory as fallback
pub fn state_dir() -> PathBuf {
    STATE_DIR_CACHE
        .get_or_init(|| {
            std::env::var(STATE_DIR_ENV)
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    dirs::home_dir()
                        .map(|h| h.join(DEFAULT_STATE_DIR))
                        .unwrap_or_else(|| PathBuf::from(DEFAULT_STATE_DIR))
                })
        })
        .clone()
}

/// Get the config directory.
///
/// Defaults to `~/.restock-notifier/config/` or `RESTOCK_CONFIG_DIR` env var.
pub fn config_dir() -> PathBuf {
    std::env::var(CONFIG_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|_| state_dir().join(CONFIG_SUBDIR))
}

/// Get the main config file path.
pub fn config_file() -> PathBuf {
    config_dir().join("config.toml")
}

/// Get the .env.local file path.
pub fn env_file() -> PathBuf {
    config_dir().join(".env.local")
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(path: &str) -> PathBuf {
    PathBuf::from(shellexpand::full(path).map(|p| p.into_owned()).unwrap_or_else(|_| path.to_string()))
}
