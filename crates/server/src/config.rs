use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub copilot: CopilotConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    pub jwt_secret: String,
    pub token_expiry_hours: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CopilotConfig {
    /// Allow copilot usage without logging in
    #[serde(default)]
    pub anonymous_access: bool,
    /// Action limit for users without a stored quota profile.
    /// Unset means unlimited.
    #[serde(default)]
    pub default_action_limit: Option<u64>,
    #[serde(default)]
    pub lock: LockConfig,
}

/// Session creation lock timings, in milliseconds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockConfig {
    /// How long an acquirer waits before giving up
    #[serde(default = "default_wait_timeout_ms")]
    pub wait_timeout_ms: u64,
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
    /// How long a held lock stays valid if its holder never releases it
    #[serde(default = "default_ttl_ms")]
    pub ttl_ms: u64,
}

fn default_wait_timeout_ms() -> u64 { 3_000 }
fn default_retry_interval_ms() -> u64 { 50 }
fn default_ttl_ms() -> u64 { 30_000 }

impl LockConfig {
    pub fn wait_timeout(&self) -> Duration {
        Duration::from_millis(self.wait_timeout_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }

    pub fn ttl(&self) -> Duration {
        Duration::from_millis(self.ttl_ms)
    }
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            wait_timeout_ms: default_wait_timeout_ms(),
            retry_interval_ms: default_retry_interval_ms(),
            ttl_ms: default_ttl_ms(),
        }
    }
}

impl Default for CopilotConfig {
    fn default() -> Self {
        Self {
            anonymous_access: false,
            default_action_limit: None,
            lock: LockConfig::default(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            database: DatabaseConfig {
                path: "./data/copilot.db".to_string(),
            },
            auth: AuthConfig {
                jwt_secret: "change-me-in-production".to_string(),
                token_expiry_hours: 24,
            },
            copilot: CopilotConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        // Try to load from environment variable
        if let Ok(path) = std::env::var("COPILOT_CONFIG") {
            return Self::load_from_path(&PathBuf::from(path));
        }

        // Try to load from default locations
        let default_paths = vec![
            PathBuf::from("copilot-server.toml"),
            PathBuf::from("config/copilot-server.toml"),
            PathBuf::from("/etc/copilot/server.toml"),
        ];

        for path in default_paths {
            if path.exists() {
                return Self::load_from_path(&path);
            }
        }

        // Return default config if no file found
        tracing::warn!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse(&content)
    }

    fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn copilot_section_is_optional() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            path = "/tmp/copilot.db"

            [auth]
            jwt_secret = "secret"
            token_expiry_hours = 1
            "#,
        )
        .unwrap();

        assert!(!config.copilot.anonymous_access);
        assert_eq!(config.copilot.default_action_limit, None);
        assert_eq!(config.copilot.lock.wait_timeout(), Duration::from_secs(3));
    }

    #[test]
    fn reads_copilot_overrides() {
        let config = Config::parse(
            r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [database]
            path = "/tmp/copilot.db"

            [auth]
            jwt_secret = "secret"
            token_expiry_hours = 1

            [copilot]
            anonymous_access = true
            default_action_limit = 25

            [copilot.lock]
            wait_timeout_ms = 100
            ttl_ms = 1000
            "#,
        )
        .unwrap();

        assert!(config.copilot.anonymous_access);
        assert_eq!(config.copilot.default_action_limit, Some(25));
        assert_eq!(config.copilot.lock.wait_timeout_ms, 100);
        assert_eq!(config.copilot.lock.retry_interval_ms, 50);
        assert_eq!(config.copilot.lock.ttl(), Duration::from_secs(1));
    }
}
