//! Bot settings loaded from `config.toml` and the environment.

use std::collections::HashSet;
use std::fmt;
use std::path::Path;
use std::time::Duration;

use restock_models::{Address, ItemId, StoreId, TrackedItem};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{ConfigError, Result};

/// Environment override for the store id.
pub const STORE_ID_ENV: &str = "RESTOCK_STORE_ID";
/// Environment override for the tracked items (comma-separated).
pub const ITEM_IDS_ENV: &str = "RESTOCK_ITEM_IDS";
/// Environment override for the recipients (comma-separated).
pub const RECIPIENTS_ENV: &str = "RESTOCK_RECIPIENTS";
/// Environment override for the poll interval in seconds.
pub const POLL_INTERVAL_ENV: &str = "RESTOCK_POLL_INTERVAL";
/// Telegram bot token.
pub const TELEGRAM_TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";

const DEFAULT_BOT_NAME: &str = "ikea";
const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
const DEFAULT_TIMEOUT_SECS: u64 = 10;

fn default_bot_name() -> String {
    DEFAULT_BOT_NAME.to_string()
}

fn default_poll_interval() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_timeout() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_command() -> Vec<String> {
    vec![
        "npx".to_string(),
        "ikea-availability-checker".to_string(),
        "stock".to_string(),
    ]
}

/// Which inventory backend to use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LookupSettings {
    /// Run a stock checker CLI per item.
    Command {
        #[serde(default = "default_command")]
        command: Vec<String>,
    },
    /// Fetch a JSON stock report over HTTP.
    Http { url_template: String },
}

impl Default for LookupSettings {
    fn default() -> Self {
        LookupSettings::Command {
            command: default_command(),
        }
    }
}

/// Chat credentials.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub telegram_bot_token: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field(
                "telegram_bot_token",
                &self.telegram_bot_token.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Complete bot configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    /// Name used to address this bot in chat (`<bot_name> status`).
    #[serde(default = "default_bot_name")]
    pub bot_name: String,
    #[serde(default)]
    pub store_id: String,
    #[serde(default)]
    pub item_ids: Vec<String>,
    #[serde(default)]
    pub recipients: Vec<String>,
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,
    #[serde(default = "default_timeout")]
    pub lookup_timeout_seconds: u64,
    #[serde(default = "default_timeout")]
    pub send_timeout_seconds: u64,
    #[serde(default)]
    pub lookup: LookupSettings,
    #[serde(default)]
    pub credentials: Credentials,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bot_name: default_bot_name(),
            store_id: String::new(),
            item_ids: Vec::new(),
            recipients: Vec::new(),
            poll_interval_seconds: default_poll_interval(),
            lookup_timeout_seconds: default_timeout(),
            send_timeout_seconds: default_timeout(),
            lookup: LookupSettings::default(),
            credentials: Credentials::default(),
        }
    }
}

/// Splits a comma-separated list, dropping empty segments.
fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

impl Settings {
    /// Parse settings from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load settings from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let settings = Self::from_toml_str(&content)?;
        info!(path = %path.display(), "Loaded settings");
        Ok(settings)
    }

    /// Load settings from an explicit path, or from the default config file
    /// when it exists, then apply environment overrides.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file just means "configure through the environment".
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let mut settings = match explicit {
            Some(path) => Self::from_file(path)?,
            None => {
                let default_path = crate::config::config_file();
                if default_path.exists() {
                    Self::from_file(&default_path)?
                } else {
                    debug!(path = %default_path.display(), "No config file, using environment only");
                    Self::default()
                }
            }
        };
        settings.apply_env_overrides_from(|var| std::env::var(var).ok())?;
        Ok(settings)
    }

    /// Apply overrides from an environment-like lookup.
    pub fn apply_env_overrides_from<F>(&mut self, get: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(store) = get(STORE_ID_ENV) {
            self.store_id = store.trim().to_string();
        }
        if let Some(items) = get(ITEM_IDS_ENV) {
            self.item_ids = split_list(&items);
        }
        if let Some(recipients) = get(RECIPIENTS_ENV) {
            self.recipients = split_list(&recipients);
        }
        if let Some(interval) = get(POLL_INTERVAL_ENV) {
            self.poll_interval_seconds =
                interval
                    .trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidEnv {
                        var: POLL_INTERVAL_ENV,
                        value: interval.clone(),
                    })?;
        }
        if let Some(token) = get(TELEGRAM_TOKEN_ENV) {
            if !token.trim().is_empty() {
                self.credentials.telegram_bot_token = Some(token.trim().to_string());
            }
        }
        Ok(())
    }

    /// Check that the settings describe a runnable bot.
    ///
    /// `require_credentials` is false for one-shot runs that never open a
    /// chat connection.
    pub fn validate(&self, require_credentials: bool) -> Result<()> {
        if StoreId::new(self.store_id.as_str()).is_blank() {
            return Err(ConfigError::MissingStore);
        }

        if self.item_ids.is_empty() {
            return Err(ConfigError::NoItems);
        }
        let mut seen = HashSet::new();
        for item in self.item_ids.iter().map(|i| ItemId::new(i.trim())) {
            if item.is_blank() {
                return Err(ConfigError::BlankItem);
            }
            if !seen.insert(item.clone()) {
                return Err(ConfigError::DuplicateItem(item.to_string()));
            }
        }

        let recipients = self.recipient_addresses();
        if recipients.is_empty() {
            return Err(ConfigError::NoRecipients);
        }
        let mut seen = HashSet::new();
        for recipient in recipients {
            if recipient.is_blank() {
                return Err(ConfigError::BlankRecipient);
            }
            if !seen.insert(recipient.clone()) {
                return Err(ConfigError::DuplicateRecipient(recipient.to_string()));
            }
        }

        if self.poll_interval_seconds == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        if self.lookup_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("lookup_timeout_seconds"));
        }
        if self.send_timeout_seconds == 0 {
            return Err(ConfigError::InvalidTimeout("send_timeout_seconds"));
        }

        match &self.lookup {
            LookupSettings::Command { command } => {
                if command.first().map_or(true, |c| c.trim().is_empty()) {
                    return Err(ConfigError::InvalidLookup("command is empty".to_string()));
                }
            }
            LookupSettings::Http { url_template } => {
                if !url_template.contains("{item}") {
                    return Err(ConfigError::InvalidLookup(
                        "url_template must contain {item}".to_string(),
                    ));
                }
            }
        }

        if require_credentials
            && self
                .credentials
                .telegram_bot_token
                .as_deref()
                .map_or(true, |t| t.trim().is_empty())
        {
            return Err(ConfigError::MissingToken);
        }

        Ok(())
    }

    /// Items to track, all in the unknown state.
    pub fn tracked_items(&self) -> Vec<TrackedItem> {
        let store = self.store_id.trim();
        self.item_ids
            .iter()
            .map(|item| TrackedItem::new(store, item.trim()))
            .collect()
    }

    /// Recipient addresses.
    pub fn recipient_addresses(&self) -> Vec<Address> {
        self.recipients
            .iter()
            .map(|r| Address::from(r.trim()))
            .collect()
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_seconds)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_secs(self.lookup_timeout_seconds)
    }

    pub fn send_timeout(&self) -> Duration {
        Duration::from_secs(self.send_timeout_seconds)
    }
}
