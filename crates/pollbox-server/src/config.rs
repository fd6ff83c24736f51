use anyhow::{bail, Context, Result};
use pollbox_core::validation::MIN_CHOICES;
use pollbox_core::PollSettings;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub store: StoreConfig,
    pub polls: PollSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind_address: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub acquire_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite://./data/pollbox.db?mode=rwc".to_string(),
            max_connections: 8,
            acquire_timeout_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Sqlite,
    Memory,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub operation_timeout_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            operation_timeout_ms: 5000,
        }
    }
}

impl Config {
    /// Load from `path`, falling back to defaults when the file is absent,
    /// then apply `POLLBOX_*` environment overrides.
    pub fn load(path: &str) -> Result<Self> {
        let mut config = if Path::new(path).exists() {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read config file {path}"))?;
            Self::from_toml_str(&raw).with_context(|| format!("invalid config file {path}"))?
        } else {
            tracing::info!("Config file {} not found, using defaults", path);
            Self::default()
        };
        config.apply_env(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(addr) = lookup("POLLBOX_BIND_ADDRESS") {
            self.server.bind_address = addr;
        }
        if let Some(url) = lookup("POLLBOX_DATABASE_URL") {
            self.database.url = url;
        }
    }

    fn validate(&self) -> Result<()> {
        if self.database.max_connections == 0 {
            bail!("database.max_connections must be at least 1");
        }
        if self.store.operation_timeout_ms == 0 {
            bail!("store.operation_timeout_ms must be positive");
        }
        if self.polls.max_choices < MIN_CHOICES {
            bail!("polls.max_choices must be at least {MIN_CHOICES}");
        }
        let limits = [
            self.polls.max_channel_name_len,
            self.polls.max_question_len,
            self.polls.max_choice_len,
        ];
        if limits.contains(&0) {
            bail!("polls text limits must be positive");
        }
        Ok(())
    }
}
