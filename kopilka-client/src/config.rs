use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const API_URL_ENV: &str = "KOPILKA_API_URL";
pub const USER_ID_ENV: &str = "KOPILKA_USER_ID";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ClientConfig {
    pub api: Option<ApiSettings>,
    pub sync: Option<SyncSettings>,
    pub storage: Option<StorageSettings>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api: Some(ApiSettings::default()),
            sync: Some(SyncSettings::default()),
            storage: None,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ApiSettings {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    pub user_id: Option<i64>,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            user_id: None,
            request_timeout_secs: default_request_timeout(),
        }
    }
}

fn default_base_url() -> String {
    "http://127.0.0.1:5000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SyncSettings {
    #[serde(default = "default_interval")]
    pub interval_secs: u64,
    #[serde(default = "default_max_backoff")]
    pub max_backoff_secs: u64,
    #[serde(default = "default_backoff_enabled")]
    pub backoff_enabled: bool,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            interval_secs: default_interval(),
            max_backoff_secs: default_max_backoff(),
            backoff_enabled: default_backoff_enabled(),
        }
    }
}

fn default_interval() -> u64 {
    30
}

fn default_max_backoff() -> u64 {
    300
}

fn default_backoff_enabled() -> bool {
    true
}

impl SyncSettings {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs.max(1))
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_secs(self.max_backoff_secs.max(self.interval_secs.max(1)))
    }
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageSettings {
    pub path: Option<String>,
}

const DEFAULT_CONFIG: &str = r#"
[api]
base_url = "http://127.0.0.1:5000"
# user_id = 123456789
request_timeout_secs = 10

[sync]
interval_secs = 30
max_backoff_secs = 300
backoff_enabled = true

[storage]
# path = "/home/me/.local/share/kopilka/storage.json"
"#;

impl ClientConfig {
    pub fn load() -> Result<(Self, PathBuf), ConfigError> {
        let config_path = get_config_path();

        // Create config directory if it doesn't exist
        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                ConfigError::Message(format!("Failed to create config directory: {e}"))
            })?;
        }

        if !config_path.exists() {
            std::fs::write(&config_path, DEFAULT_CONFIG).map_err(|e| {
                ConfigError::Message(format!("Failed to write default config: {e}"))
            })?;
        }

        let config = Self::load_from(&config_path)?;
        Ok((config, config_path))
    }

    /// Reads the TOML file, then applies environment overrides.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let user_id = match std::env::var(USER_ID_ENV) {
            Ok(raw) => Some(raw.trim().parse::<i64>().map_err(|e| {
                ConfigError::Message(format!("{USER_ID_ENV} must be numeric: {e}"))
            })?),
            Err(_) => None,
        };

        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_override_option("api.base_url", std::env::var(API_URL_ENV).ok())?
            .set_override_option("api.user_id", user_id)?
            .build()?;

        let mut config: ClientConfig = builder.try_deserialize()?;
        if config.api.is_none() {
            config.api = Some(ApiSettings::default());
        }
        Ok(config)
    }

    pub fn api_settings(&self) -> ApiSettings {
        self.api.clone().unwrap_or_default()
    }

    pub fn sync_settings(&self) -> SyncSettings {
        self.sync.clone().unwrap_or_default()
    }

    pub fn storage_path(&self) -> PathBuf {
        self.storage
            .as_ref()
            .and_then(|s| s.path.as_ref())
            .map(PathBuf::from)
            .unwrap_or_else(get_default_storage_path)
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("kopilka").join("client.toml")
    } else {
        PathBuf::from("client.toml")
    }
}

pub fn get_default_storage_path() -> PathBuf {
    if let Some(data_dir) = dirs::data_dir() {
        data_dir.join("kopilka").join("storage.json")
    } else {
        PathBuf::from("kopilka-storage.json")
    }
}
