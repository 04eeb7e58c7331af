use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;
use tracing::info;
use validator::Validate;

const DEFAULT_LOG_LEVEL: &str = "info";
const DEFAULT_ENV: &str = "development";
const DEFAULT_PORT: u16 = 8080;
const CONFIG_DIR: &str = "config";
const DEFAULT_CURRENCY: &str = "INR";
const DEFAULT_RAZORPAY_BASE_URL: &str = "https://api.razorpay.com/v1";

/// Application configuration with validation.
///
/// Values are layered: `config/default.toml`, then `config/{environment}.toml`,
/// then `APP__`-prefixed environment variables, each overriding the previous.
#[derive(Clone, Debug, Deserialize, Validate)]
pub struct AppConfig {
    /// Database connection URL
    pub database_url: String,

    /// JWT signing secret
    #[validate(length(min = 32, message = "jwt_secret must be at least 32 characters"))]
    pub jwt_secret: String,

    /// Access token lifetime in seconds
    pub jwt_expiration: usize,

    /// Refresh token lifetime in seconds
    pub refresh_token_expiration: usize,

    /// Token issuer claim
    #[serde(default = "default_auth_issuer")]
    pub auth_issuer: String,

    /// Token audience claim
    #[serde(default = "default_auth_audience")]
    pub auth_audience: String,

    /// Server host address
    pub host: String,

    /// Server port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Application environment
    pub environment: String,

    /// Logging level
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Log in JSON format (structured logging)
    #[serde(default)]
    pub log_json: bool,

    /// Whether to run database migrations on startup
    #[serde(default)]
    pub auto_migrate: bool,

    /// Payment provider key id (public half, handed to the checkout widget)
    #[serde(default)]
    pub razorpay_key_id: String,

    /// Payment provider secret; signs orders and verifies checkout callbacks
    #[serde(default)]
    pub razorpay_key_secret: String,

    /// Payment provider API base URL
    #[serde(default = "default_razorpay_base_url")]
    pub razorpay_base_url: String,

    /// Currency carts are priced and charged in
    #[serde(default = "default_currency")]
    pub currency: String,

    /// Google OAuth client id (OAuth login disabled when absent)
    #[serde(default)]
    pub google_client_id: Option<String>,

    /// Google OAuth client secret
    #[serde(default)]
    pub google_client_secret: Option<String>,

    /// Redirect URL registered with the OAuth provider
    #[serde(default)]
    pub google_redirect_url: Option<String>,

    /// External email-ownership verification endpoint; check skipped when absent
    #[serde(default)]
    pub email_verification_url: Option<String>,

    /// CORS: comma-separated list of allowed origins
    #[serde(default)]
    pub cors_allowed_origins: Option<String>,

    /// CORS: allow credentials
    #[serde(default)]
    pub cors_allow_credentials: bool,

    /// DB pool: max connections
    #[serde(default = "default_db_max_connections")]
    pub db_max_connections: u32,

    /// DB pool: min connections
    #[serde(default = "default_db_min_connections")]
    pub db_min_connections: u32,

    /// DB timeouts (seconds)
    #[serde(default = "default_db_connect_timeout_secs")]
    pub db_connect_timeout_secs: u64,
    #[serde(default = "default_db_idle_timeout_secs")]
    pub db_idle_timeout_secs: u64,
    #[serde(default = "default_db_acquire_timeout_secs")]
    pub db_acquire_timeout_secs: u64,
}

fn default_auth_issuer() -> String {
    "peakform-auth".to_string()
}

fn default_auth_audience() -> String {
    "peakform-api".to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_log_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

fn default_razorpay_base_url() -> String {
    DEFAULT_RAZORPAY_BASE_URL.to_string()
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
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

fn default_db_idle_timeout_secs() -> u64 {
    600
}

fn default_db_acquire_timeout_secs() -> u64 {
    8
}

impl AppConfig {
    /// Construct a minimal configuration programmatically (used by tests).
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        database_url: String,
        jwt_secret: String,
        jwt_expiration: usize,
        refresh_token_expiration: usize,
        host: String,
        port: u16,
        environment: String,
    ) -> Self {
        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            refresh_token_expiration,
            auth_issuer: default_auth_issuer(),
            auth_audience: default_auth_audience(),
            host,
            port,
            environment,
            log_level: default_log_level(),
            log_json: false,
            auto_migrate: false,
            razorpay_key_id: String::new(),
            razorpay_key_secret: String::new(),
            razorpay_base_url: default_razorpay_base_url(),
            currency: default_currency(),
            google_client_id: None,
            google_client_secret: None,
            google_redirect_url: None,
            email_verification_url: None,
            cors_allowed_origins: None,
            cors_allow_credentials: false,
            db_max_connections: default_db_max_connections(),
            db_min_connections: default_db_min_connections(),
            db_connect_timeout_secs: default_db_connect_timeout_secs(),
            db_idle_timeout_secs: default_db_idle_timeout_secs(),
            db_acquire_timeout_secs: default_db_acquire_timeout_secs(),
        }
    }

    pub fn log_level(&self) -> &str {
        &self.log_level
    }

    pub fn is_development(&self) -> bool {
        self.environment == DEFAULT_ENV || self.environment == "dev" || self.environment == "test"
    }

    pub fn oauth_enabled(&self) -> bool {
        self.google_client_id.is_some()
            && self.google_client_secret.is_some()
            && self.google_redirect_url.is_some()
    }
}

/// Load and validate configuration from files and environment.
pub fn load_config() -> Result<AppConfig, ConfigError> {
    let environment = std::env::var("APP__ENVIRONMENT")
        .or_else(|_| std::env::var("ENVIRONMENT"))
        .unwrap_or_else(|_| DEFAULT_ENV.to_string());

    let mut builder = Config::builder()
        .set_default("environment", environment.clone())?
        .add_source(File::from(Path::new(CONFIG_DIR).join("default")).required(false));

    let env_file = Path::new(CONFIG_DIR).join(&environment);
    builder = builder
        .add_source(File::from(env_file).required(false))
        .add_source(Environment::with_prefix("APP").separator("__"));

    let config: AppConfig = builder.build()?.try_deserialize()?;

    config
        .validate()
        .map_err(|e| ConfigError::Message(format!("invalid configuration: {e}")))?;

    info!(environment = %config.environment, "Configuration loaded");
    Ok(config)
}

/// Install the global tracing subscriber.
pub fn init_tracing(level: &str, json: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    if json {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .try_init();
    } else {
        let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AppConfig {
        AppConfig::new(
            "sqlite::memory:".to_string(),
            "a_secret_key_that_is_long_enough_for_validation".to_string(),
            3600,
            86_400,
            "127.0.0.1".to_string(),
            8080,
            "test".to_string(),
        )
    }

    #[test]
    fn short_jwt_secret_fails_validation() {
        let mut cfg = test_config();
        cfg.jwt_secret = "short".to_string();
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn defaults_are_applied() {
        let cfg = test_config();
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.currency, "INR");
        assert_eq!(cfg.razorpay_base_url, DEFAULT_RAZORPAY_BASE_URL);
        assert!(cfg.is_development());
        assert!(!cfg.oauth_enabled());
    }
}
