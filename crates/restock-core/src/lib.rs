//! Restock Core - configuration shared by every restock notifier binary.
//!
//! - **config**: state directory layout and well-known file paths
//! - **settings**: the `config.toml` structure, environment overrides and
//!   startup validation
//! - **error**: configuration errors (always fatal at startup)

pub mod config;
pub mod error;
pub mod settings;

// Re-export commonly used items for convenience
pub use config::{config_dir, config_file, env_file, expand_path, state_dir};
pub use error::{ConfigError, Result};
pub use settings::{Credentials, LookupSettings, Settings};
