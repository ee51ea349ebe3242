use crate::models::whitelist::WhiteListClient;
use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::Path;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub tracker: TrackerConfig,
    #[serde(default)]
    pub store: StoreConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Clients seeded into the store at startup
    #[serde(default)]
    pub whitelist: Vec<WhiteListClient>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_listen")]
    pub listen: SocketAddr,
    #[serde(default = "default_num_threads")]
    pub num_threads: usize,
    /// Seconds before an in-flight request is aborted
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TrackerConfig {
    /// Public mode: skip passkey authentication entirely
    #[serde(default)]
    pub public: bool,
    /// Honor `ip`/`ipv4`/`ipv6` query overrides
    #[serde(default)]
    pub allow_client_ip: bool,
    /// Register unknown info hashes on first announce
    #[serde(default)]
    pub auto_register: bool,
    #[serde(default = "default_true")]
    pub enforce_whitelist: bool,
    #[serde(default = "default_announce_interval")]
    pub announce_interval: u32,
    #[serde(default = "default_min_announce_interval")]
    pub min_announce_interval: u32,
    #[serde(default = "default_peer_timeout")]
    pub peer_timeout: i64,
    #[serde(default = "default_cleanup_interval")]
    pub cleanup_interval: u64,
    /// Seconds between stats batch flushes
    #[serde(default = "default_sync_interval")]
    pub sync_interval: u64,
    #[serde(default = "default_max_numwant")]
    pub max_numwant: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    #[serde(default = "default_driver")]
    pub driver: String,
    /// Driver specific connection string
    #[serde(default)]
    pub dsn: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdminConfig {
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
    #[serde(default)]
    pub console: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            num_threads: default_num_threads(),
            request_timeout: default_request_timeout(),
        }
    }
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            public: false,
            allow_client_ip: false,
            auto_register: false,
            enforce_whitelist: true,
            announce_interval: default_announce_interval(),
            min_announce_interval: default_min_announce_interval(),
            peer_timeout: default_peer_timeout(),
            cleanup_interval: default_cleanup_interval(),
            sync_interval: default_sync_interval(),
            max_numwant: default_max_numwant(),
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            driver: default_driver(),
            dsn: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
            console: false,
        }
    }
}

// Default value functions
fn default_listen() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 34000))
}

fn default_num_threads() -> usize {
    num_cpus::get()
}

fn default_request_timeout() -> u64 {
    10
}

fn default_true() -> bool {
    true
}

fn default_announce_interval() -> u32 {
    1800 // 30 minutes
}

fn default_min_announce_interval() -> u32 {
    900 // 15 minutes
}

fn default_peer_timeout() -> i64 {
    3600 // 1 hour
}

fn default_cleanup_interval() -> u64 {
    300 // 5 minutes
}

fn default_sync_interval() -> u64 {
    60
}

fn default_max_numwant() -> usize {
    200
}

fn default_driver() -> String {
    "memory".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "json".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;

        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.server.num_threads == 0 {
            bail!("num_threads must be greater than 0");
        }

        if self.server.request_timeout == 0 {
            bail!("request_timeout must be greater than 0");
        }

        let tracker = &self.tracker;
        if tracker.min_announce_interval > tracker.announce_interval {
            bail!(
                "min_announce_interval ({}) must not exceed announce_interval ({})",
                tracker.min_announce_interval,
                tracker.announce_interval
            );
        }

        if tracker.cleanup_interval == 0 || tracker.sync_interval == 0 {
            bail!("cleanup_interval and sync_interval must be greater than 0");
        }

        if tracker.peer_timeout <= tracker.cleanup_interval as i64 {
            bail!(
                "peer_timeout ({}) must be greater than cleanup_interval ({})",
                tracker.peer_timeout,
                tracker.cleanup_interval
            );
        }

        if tracker.max_numwant == 0 {
            bail!("max_numwant must be greater than 0");
        }

        if self.store.driver.is_empty() {
            bail!("store driver must not be empty");
        }

        if self.admin.api_key.is_empty() {
            bail!("admin api_key must not be empty");
        }

        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.logging.level.as_str()) {
            bail!(
                "Invalid log level '{}'. Must be one of: trace, debug, info, warn, error",
                self.logging.level
            );
        }

        let valid_formats = ["json", "console"];
        if !valid_formats.contains(&self.logging.format.as_str()) {
            bail!(
                "Invalid log format '{}'. Must be one of: json, console",
                self.logging.format
            );
        }

        for client in &self.whitelist {
            if client.client_prefix.is_empty() {
                bail!("whitelist prefix must not be empty (client '{}')", client.client_name);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"
        [admin]
        api_key = "secret"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.listen, "0.0.0.0:34000".parse().unwrap());
        assert_eq!(config.server.request_timeout, 10);
        assert!(!config.tracker.public);
        assert!(!config.tracker.auto_register);
        assert!(config.tracker.enforce_whitelist);
        assert_eq!(config.tracker.announce_interval, 1800);
        assert_eq!(config.tracker.max_numwant, 200);
        assert_eq!(config.store.driver, "memory");
        assert_eq!(config.logging.level, "info");
        assert!(config.whitelist.is_empty());
    }

    #[test]
    fn test_full_config() {
        let config: Config = toml::from_str(
            r#"
            [server]
            listen = "127.0.0.1:6969"
            num_threads = 2

            [tracker]
            public = true
            allow_client_ip = true
            sync_interval = 5

            [store]
            driver = "memory"

            [admin]
            api_key = "secret"

            [logging]
            level = "debug"
            format = "console"

            [[whitelist]]
            prefix = "-qB"
            name = "qBittorrent"

            [[whitelist]]
            prefix = "-TR"
            name = "Transmission"
            "#,
        )
        .unwrap();
        config.validate().unwrap();

        assert_eq!(config.server.num_threads, 2);
        assert!(config.tracker.public);
        assert!(config.tracker.allow_client_ip);
        assert_eq!(config.tracker.sync_interval, 5);
        assert_eq!(config.whitelist.len(), 2);
        assert_eq!(config.whitelist[0], WhiteListClient::new("-qB", "qBittorrent"));
    }

    #[test]
    fn test_missing_admin_section_fails_to_parse() {
        assert!(toml::from_str::<Config>("[server]\nnum_threads = 1").is_err());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.admin.api_key.clear();
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.tracker.peer_timeout = 10;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.tracker.min_announce_interval = 5000;
        assert!(config.validate().is_err());

        let mut config: Config = toml::from_str(MINIMAL).unwrap();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let config = Config::from_file(file.path()).unwrap();
        assert_eq!(config.admin.api_key, "secret");
    }

    #[test]
    fn test_from_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::from_file(&dir.path().join("nope.toml")).is_err());
    }
}
