use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub telegram: TelegramConfig,
    #[serde(default = "default_server_config")]
    pub server: ServerConfig,
    #[serde(default = "default_storage_config")]
    pub storage: StorageConfig,
    #[serde(default)]
    pub pending: PendingConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    /// Bot username, only used for logging
    #[serde(default)]
    pub bot_name: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind_address")]
    pub bind_address: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_db_path")]
    pub database_path: PathBuf,
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct PendingConfig {
    /// Seconds after which an unanswered /addFilter or /removeFilter is forgotten.
    /// Absent means pending commands never expire.
    #[serde(default)]
    pub ttl_secs: Option<u64>,
}

fn default_bind_address() -> String {
    "0.0.0.0:8080".to_string()
}

fn default_db_path() -> PathBuf {
    PathBuf::from("quickalert.db")
}

fn default_server_config() -> ServerConfig {
    ServerConfig {
        bind_address: default_bind_address(),
    }
}

fn default_storage_config() -> StorageConfig {
    StorageConfig {
        database_path: default_db_path(),
    }
}

impl Config {
    /// Expiry applied to pending two-step commands, if any.
    pub fn pending_ttl(&self) -> Option<Duration> {
        self.pending.ttl_secs.map(Duration::from_secs)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        Self::parse(&content)
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content).context("Failed to parse config file")?;

        if config.telegram.bot_token.trim().is_empty() {
            bail!("telegram.bot_token must not be empty");
        }

        if config.pending.ttl_secs == Some(0) {
            bail!("pending.ttl_secs must be positive; omit it to keep pending commands forever");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::parse(
            r#"
[telegram]
bot_token = "123:abc"
"#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_token, "123:abc");
        assert!(config.telegram.bot_name.is_none());
        assert_eq!(config.server.bind_address, "0.0.0.0:8080");
        assert_eq!(config.storage.database_path, PathBuf::from("quickalert.db"));
        assert!(config.pending_ttl().is_none());
    }

    #[test]
    fn test_full_config() {
        let config = Config::parse(
            r#"
[telegram]
bot_token = "123:abc"
bot_name = "quickalert_bot"

[server]
bind_address = "127.0.0.1:9000"

[storage]
database_path = "/var/lib/quickalert/subscribers.db"

[pending]
ttl_secs = 600
"#,
        )
        .unwrap();

        assert_eq!(config.telegram.bot_name.as_deref(), Some("quickalert_bot"));
        assert_eq!(config.server.bind_address, "127.0.0.1:9000");
        assert_eq!(
            config.storage.database_path,
            PathBuf::from("/var/lib/quickalert/subscribers.db")
        );
        assert_eq!(config.pending_ttl(), Some(Duration::from_secs(600)));
    }

    #[test]
    fn test_empty_token_rejected() {
        let err = Config::parse(
            r#"
[telegram]
bot_token = "  "
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("bot_token"));
    }

    #[test]
    fn test_zero_pending_ttl_rejected() {
        let err = Config::parse(
            r#"
[telegram]
bot_token = "123:abc"

[pending]
ttl_secs = 0
"#,
        )
        .unwrap_err();
        assert!(err.to_string().contains("ttl_secs"));
    }

    #[test]
    fn test_missing_telegram_section_rejected() {
        assert!(Config::parse("[server]\nbind_address = \"0.0.0.0:1\"\n").is_err());
    }
}
