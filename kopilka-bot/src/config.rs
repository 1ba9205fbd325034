use config::{Config, ConfigError, File};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const TOKEN_ENV: &str = "TELEGRAM_BOT_TOKEN";
pub const PORT_ENV: &str = "PORT";
pub const WEB_APP_URL_ENV: &str = "WEB_APP_URL";
pub const HOSTING_ENV: &str = "HOSTING";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BotConfig {
    pub telegram: Option<TelegramConfig>,
    pub server: Option<ServerConfig>,
    pub web_app: Option<WebAppConfig>,
    pub cors: Option<CorsConfig>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TelegramConfig {
    pub bot_token: Option<String>,
    #[serde(default = "default_bot_username")]
    pub bot_username: String,
    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,
    #[serde(default = "default_send_timeout")]
    pub send_timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: None,
            bot_username: default_bot_username(),
            api_base_url: default_api_base_url(),
            send_timeout_secs: default_send_timeout(),
        }
    }
}

fn default_bot_username() -> String {
    "FamilyFinancee_bot".to_string()
}

fn default_api_base_url() -> String {
    "https://api.telegram.org".to_string()
}

fn default_send_timeout() -> u64 {
    10
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_hosting")]
    pub hosting: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            hosting: default_hosting(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    3000
}

fn default_hosting() -> String {
    "Render.com".to_string()
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct WebAppConfig {
    pub url: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct CorsConfig {
    pub allowed_origins: Vec<String>,
}

const DEFAULT_CONFIG: &str = r#"
[telegram]
# bot_token = "123456:ABC..."
bot_username = "FamilyFinancee_bot"

[server]
host = "0.0.0.0"
port = 3000
hosting = "Render.com"

[web_app]
# url = "https://kopilka.example.com"
"#;

impl BotConfig {
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
        Self::load_with_env(path, |name| std::env::var(name).ok())
    }

    pub fn load_with_env(
        path: &Path,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let var = |name: &str| env(name).filter(|v| !v.trim().is_empty());

        let port = match var(PORT_ENV) {
            Some(raw) => Some(raw.trim().parse::<u16>().map_err(|e| {
                ConfigError::Message(format!("{PORT_ENV} must be a port number: {e}"))
            })?),
            None => None,
        };

        let builder = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .set_override_option("telegram.bot_token", var(TOKEN_ENV))?
            .set_override_option("server.port", port.map(i64::from))?
            .set_override_option("server.hosting", var(HOSTING_ENV))?
            .set_override_option("web_app.url", var(WEB_APP_URL_ENV))?
            .build()?;

        builder.try_deserialize()
    }

    /// The configured token, if any non-blank one is set.
    pub fn bot_token(&self) -> Option<&str> {
        self.telegram
            .as_ref()
            .and_then(|t| t.bot_token.as_deref())
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn telegram(&self) -> TelegramConfig {
        self.telegram.clone().unwrap_or_default()
    }

    pub fn server(&self) -> ServerConfig {
        self.server.clone().unwrap_or_default()
    }

    pub fn web_app_url(&self) -> Option<&str> {
        self.web_app
            .as_ref()
            .and_then(|w| w.url.as_deref())
            .filter(|u| !u.trim().is_empty())
    }
}

pub fn get_config_path() -> PathBuf {
    if let Some(config_dir) = dirs::config_dir() {
        config_dir.join("kopilka").join("bot.toml")
    } else {
        PathBuf::from("bot.toml")
    }
}
