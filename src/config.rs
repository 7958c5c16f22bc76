use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::env;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{error, info};
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_NOTIFIER_ENDPOINT: &str = "https://api.brevo.com/v3/smtp/email";
const DEFAULT_NOTIFIER_TIMEOUT_SECS: u64 = 30;
const DEFAULT_OTP_TTL_MINUTES: i64 = 10;

/// Outbound email (Brevo-style transactional API) settings.
///
/// Injected into the notifier explicitly instead of being read from ambient
/// environment lookups at call sites.
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct NotifierConfig {
    /// API key for the transactional email provider. Empty disables delivery.
    #[serde(default)]
    pub api_key: String,

    /// Sender address used for all outbound mail
    #[serde(default = "default_sender_email")]
    #[validate(email)]
    pub sender_email: String,

    /// Sender display name
    #[serde(default = "default_sender_name")]
    pub sender_name: String,

    /// Provider endpoint URL
    #[serde(default = "default_notifier_endpoint")]
    pub endpoint: String,

    /// Request timeout in seconds for the delivery attempt
    #[serde(default = "default_notifier_timeout_secs")]
    pub timeout_secs: u64,

    /// Log delivery to the console instead of calling the provider
    #[serde(default)]
    pub console_only: bool,
}

impl Default for NotifierConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            sender_email: default_sender_email(),
            sender_name: default_sender_name(),
            endpoint: default_notifier_endpoint(),
            timeout_secs: default_notifier_timeout_secs(),
            console_only: false,
        }
    }
}

impl NotifierConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Application configuration with validation
#[derive(Clone, Debug, Deserialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT signing secret for OTP login session tokens
    #[validate(length(min = 32))]
    pub jwt_secret: String,

    /// JWT expiration time in seconds
    #[serde(default = "default_jwt_expiration")]
    pub jwt_expiration: u64,

    /// Server host address
    #[serde(default = "default_host")]
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment (development/test/production)
    #[serde(default = "default_environment")]
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB connect timeout (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,

    /// OTP code lifetime in minutes
    #[serde(default = "default_otp_ttl_minutes")]
    pub otp_ttl_minutes: i64,

    /// Loyalty points granted per currency unit of paid order total
    #[serde(default = "default_points_per_currency_unit")]
    pub points_per_currency_unit: u32,

    /// Outbound email settings
    #[serde(default)]
    #[validate]
    pub notifier: NotifierConfig,
}

impl AppConfig {
    pub fn is_development(&self) -> bool {
        self.environment == "development" || self.environment == "test"
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    /// Minimal constructor used by tests.
    pub fn new(database_url: String, jwt_secret: String, environment: String) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration: default_jwt_expiration(),
            host: default_host(),
            port: default_port(),
            environment,
            log_level: default_log_level(),
            auto_migrate: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            otp_ttl_minutes: default_otp_ttl_minutes(),
            points_per_currency_unit: default_points_per_currency_unit(),
            notifier: NotifierConfig::default(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error("Configuration validation failed: {0}")]
    Validation(#[from] validator::ValidationErrors),
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_environment() -> String {
    DEFAULT_ENV.to_string()
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_jwt_expiration() -> u64 {
    3600
}

fn default_db_max_connections() -> u32 {
    10
}

fn default_db_min_connections() -> u32 {
    1
}

fn default_db_connect_timeout_secs() -> u64 {
    30
}

fn default_otp_ttl_minutes() -> i64 {
    DEFAULT_OTP_TTL_MINUTES
}

fn default_points_per_currency_unit() -> u32 {
    1
}

fn default_sender_email() -> String {
    "noreply@retailcrm.example".to_string()
}

fn default_sender_name() -> String {
    "Retail CRM".to_string()
}

fn default_notifier_endpoint() -> String {
    DEFAULT_NOTIFIER_ENDPOINT.to_string()
}

fn default_notifier_timeout_secs() -> u64 {
    DEFAULT_NOTIFIER_TIMEOUT_SECS
}

/// Initializes the tracing subscriber with an env-filter.
pub fn init_tracing(level: &str) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let default_directive = format!("retail_crm_api={},tower_http=debug", level);
    let filter = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let _ = tracing_subscriber::registry()
        .with(EnvFilter::new(filter))
        .with(fmt::layer())
        .try_init();
}

/// Loads configuration from `config/default`, `config/{RUN_ENV}` and `APP__*`
/// environment variables, in that order of precedence.
pub fn load_config() -> Result<AppConfig, AppConfigError> {
    let run_env = env::var("RUN_ENV")
        .or_else(|_| env::var("APP_ENV"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());
    info!("Loading configuration for environment: {}", run_env);

    if !Path::new(CONFIG_DIR).exists() {
        info!(
            "Config directory '{}' not found; relying on built-in defaults and environment variables",
            CONFIG_DIR
        );
    }

    // jwt_secret has no default; it must come from a config file or APP__JWT_SECRET.
    let config = Config::builder()
        .set_default("database_url", "sqlite://retail_crm.db?mode=rwc")?
        .set_default("environment", DEFAULT_ENV)?
        .set_default("log_level", DEFAULT_LOG_LEVEL)?
        .add_source(File::with_name(&format!("{}/default", CONFIG_DIR)).required(false))
        .add_source(File::with_name(&format!("{}/{}", CONFIG_DIR, run_env)).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"))
        .build()?;

    if config.get_string("jwt_secret").is_err() {
        error!("JWT secret is not configured. Set APP__JWT_SECRET (minimum 32 characters).");
        return Err(AppConfigError::Load(ConfigError::NotFound(
            "jwt_secret is required but not configured".into(),
        )));
    }

    let app_config: AppConfig = config.try_deserialize()?;

    app_config.validate().map_err(|e| {
        error!("Configuration validation failed: {:?}", e);
        AppConfigError::Validation(e)
    })?;

    info!("Configuration loaded successfully");
    Ok(app_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_jwt_secret_fails_validation() {
        let cfg = AppConfig::new(
            "sqlite://test.db?mode=memory".into(),
            "too_short".into(),
            "test".into(),
        );
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_are_usable() {
        let cfg = AppConfig::new(
            "sqlite://test.db?mode=memory".into(),
            "test_secret_key_for_testing_purposes_only_32chars".into(),
            "test".into(),
        );
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.points_per_currency_unit, 1);
        assert_eq!(cfg.otp_ttl_minutes, 10);
        assert!(cfg.is_development());
    }
}
