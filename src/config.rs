use std::env;
use std::str::FromStr;

/// Where hierarchy and forecast data come from while serving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageMode {
    /// Run the initializer into SQLite, then serve drill-down queries from it.
    Database,
    /// Serve directly from live JMA fetches; nothing is persisted.
    Memory,
}

impl StorageMode {
    #[must_use]
    pub fn from_str(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "memory" | "mem" | "in-memory" => Self::Memory,
            _ => Self::Database,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub storage_mode: StorageMode,

    // Database
    pub database_url: String,

    // JMA endpoints
    pub jma_area_url: String,
    pub jma_forecast_base_url: String,
    pub jma_icon_base_url: String,
    pub jma_timeout_seconds: u64,

    // Initializer
    pub sync_on_startup: bool,
    pub sync_forecast_days: usize,
    pub sync_retry_max: u32,
    pub sync_retry_delay_seconds: u64,

    // API settings
    pub api_host: String,
    pub api_port: u16,

    // Rate limiting (routes that reach JMA)
    pub disable_rate_limiting: bool,
    pub rate_limit_upstream_per_second: u64,
    pub rate_limit_upstream_burst: u32,

    // Caching
    pub cache_ttl_seconds: u64,
    pub cache_max_bytes: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage_mode: StorageMode::Database,
            database_url: "sqlite://weather_forecast.db?mode=rwc".to_string(),
            jma_area_url: "https://www.jma.go.jp/bosai/common/const/area.json".to_string(),
            jma_forecast_base_url: "https://www.jma.go.jp/bosai/forecast/data/forecast"
                .to_string(),
            jma_icon_base_url: "https://www.jma.go.jp/bosai/forecast/img".to_string(),
            jma_timeout_seconds: 10,
            sync_on_startup: true,
            sync_forecast_days: 3,
            sync_retry_max: 3,
            sync_retry_delay_seconds: 5,
            api_host: "127.0.0.1".to_string(),
            api_port: 3000,
            disable_rate_limiting: false,
            rate_limit_upstream_per_second: 1,
            rate_limit_upstream_burst: 30,
            cache_ttl_seconds: 600,
            cache_max_bytes: 32 * 1024 * 1024,
        }
    }
}

/// Read `key` and parse it, keeping `default` when unset or unparsable.
fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

impl Config {
    /// Load configuration from environment variables (and `.env` if present).
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` if a value is present but unusable.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();

        let config = Self {
            storage_mode: env::var("STORAGE_MODE")
                .map(|s| StorageMode::from_str(&s))
                .unwrap_or(defaults.storage_mode),

            // Database
            database_url: env::var("DATABASE_URL").unwrap_or(defaults.database_url),

            // JMA endpoints
            jma_area_url: env::var("JMA_AREA_URL").unwrap_or(defaults.jma_area_url),
            jma_forecast_base_url: env::var("JMA_FORECAST_BASE_URL")
                .unwrap_or(defaults.jma_forecast_base_url),
            jma_icon_base_url: env::var("JMA_ICON_BASE_URL").unwrap_or(defaults.jma_icon_base_url),
            jma_timeout_seconds: env_or("JMA_TIMEOUT_SECONDS", defaults.jma_timeout_seconds),

            // Initializer
            sync_on_startup: env_or("SYNC_ON_STARTUP", defaults.sync_on_startup),
            sync_forecast_days: env_or("SYNC_FORECAST_DAYS", defaults.sync_forecast_days),
            sync_retry_max: env_or("SYNC_RETRY_MAX", defaults.sync_retry_max),
            sync_retry_delay_seconds: env_or(
                "SYNC_RETRY_DELAY_SECONDS",
                defaults.sync_retry_delay_seconds,
            ),

            // API settings
            api_host: env::var("API_HOST").unwrap_or(defaults.api_host),
            api_port: env_or("API_PORT", defaults.api_port),

            // Rate limiting
            disable_rate_limiting: env_or("DISABLE_RATE_LIMITING", defaults.disable_rate_limiting),
            rate_limit_upstream_per_second: env_or(
                "RATE_LIMIT_UPSTREAM_PER_SECOND",
                defaults.rate_limit_upstream_per_second,
            ),
            rate_limit_upstream_burst: env_or(
                "RATE_LIMIT_UPSTREAM_BURST",
                defaults.rate_limit_upstream_burst,
            ),

            // Caching
            cache_ttl_seconds: env_or("CACHE_TTL_SECONDS", defaults.cache_ttl_seconds),
            cache_max_bytes: env_or("CACHE_MAX_BYTES", defaults.cache_max_bytes),
        };

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.jma_timeout_seconds == 0 {
            return Err(ConfigError::Invalid(
                "JMA_TIMEOUT_SECONDS",
                "must be greater than zero".to_string(),
            ));
        }
        if self.sync_forecast_days == 0 {
            return Err(ConfigError::Invalid(
                "SYNC_FORECAST_DAYS",
                "must be greater than zero".to_string(),
            ));
        }
        if self.storage_mode == StorageMode::Database && self.database_url.is_empty() {
            return Err(ConfigError::Missing("DATABASE_URL"));
        }
        Ok(())
    }

    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api_host, self.api_port)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {0}: {1}")]
    Invalid(&'static str, String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn storage_mode_defaults_to_database() {
        assert_eq!(StorageMode::from_str("memory"), StorageMode::Memory);
        assert_eq!(StorageMode::from_str("In-Memory"), StorageMode::Memory);
        assert_eq!(StorageMode::from_str("database"), StorageMode::Database);
        assert_eq!(StorageMode::from_str("anything"), StorageMode::Database);
    }

    #[test]
    fn defaults_point_at_jma() {
        let config = Config::default();
        assert!(config.jma_area_url.ends_with("/common/const/area.json"));
        assert_eq!(config.sync_forecast_days, 3);
        assert!(config.validate().is_ok());
        assert_eq!(config.bind_address(), "127.0.0.1:3000");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let config = Config {
            jma_timeout_seconds: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid("JMA_TIMEOUT_SECONDS", _))
        ));
    }
}
