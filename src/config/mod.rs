use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub notifications: NotificationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Comma-separated list of allowed CORS origins, or "*"
    #[serde(default = "default_cors_origins")]
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            data_dir: default_data_dir(),
            cors_origins: default_cors_origins(),
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    4000
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("./data")
}

fn default_cors_origins() -> String {
    "*".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    /// Static bearer token accepted on admin routes
    #[serde(default = "default_admin_token")]
    pub admin_token: String,
    /// Admin account created at startup when both fields are set
    pub admin_email: Option<String>,
    pub admin_password: Option<String>,
    /// Lifetime of login sessions in hours
    #[serde(default = "default_session_hours")]
    pub session_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            admin_token: default_admin_token(),
            admin_email: None,
            admin_password: None,
            session_hours: default_session_hours(),
        }
    }
}

fn default_admin_token() -> String {
    // Generate a random token if not provided
    uuid::Uuid::new_v4().to_string()
}

/// Longest accepted session lifetime (one year)
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

fn default_session_hours() -> i64 {
    8
}

#[derive(Debug, Clone, Deserialize)]
pub struct NotificationConfig {
    /// Phone number that receives administrator SMS alerts
    pub admin_phone: Option<String>,
    /// HTTP endpoint of the SMS gateway. Messages are only logged when unset.
    pub gateway_url: Option<String>,
    pub gateway_api_key: Option<String>,
    pub gateway_username: Option<String>,
    /// Sender id shown to recipients
    pub sender_id: Option<String>,
    /// Upper bound for a single delivery attempt in seconds (default: 10)
    #[serde(default = "default_notification_timeout")]
    pub timeout_secs: u64,
}

impl NotificationConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            admin_phone: None,
            gateway_url: None,
            gateway_api_key: None,
            gateway_username: None,
            sender_id: None,
            timeout_secs: default_notification_timeout(),
        }
    }
}

fn default_notification_timeout() -> u64 {
    10
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    pub fn load(path: &Path) -> Result<Self> {
        if path.exists() {
            info!("Loading configuration from {}", path.display());
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            Self::parse(&content)
        } else {
            info!("No config file found, using defaults");
            Ok(Config::default())
        }
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config =
            toml::from_str(content).with_context(|| "Failed to parse configuration file")?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the server cannot run with
    pub fn validate(&self) -> Result<()> {
        let hours = self.auth.session_hours;
        if !(1..=MAX_SESSION_HOURS).contains(&hours) {
            anyhow::bail!(
                "auth.session_hours must be between 1 and {}, got {}",
                MAX_SESSION_HOURS,
                hours
            );
        }
        Ok(())
    }
}
