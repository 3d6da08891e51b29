use seatline_shared::Masked;
use serde::Deserialize;
use std::env;
use std::path::PathBuf;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub api: ApiConfig,
    pub storage: StorageConfig,
    pub business_rules: BusinessRules,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Passed through as a bearer token when set.
    #[serde(default)]
    pub token: Option<Masked<String>>,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    File,
    Redis,
    Memory,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Directory of the file backend.
    pub path: PathBuf,
    pub redis_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct BusinessRules {
    pub reservation_hold_seconds: u64,
    pub tick_interval_ms: u64,
    pub expiry_refresh_delay_ms: u64,
    pub confirm_refresh_delay_ms: u64,
    pub resume_delay_ms: u64,
}

/// Longest hold the client will count down, one day.
pub const MAX_HOLD_SECONDS: u64 = 86_400;

impl BusinessRules {
    /// Rejects values the countdown cannot run with.
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.reservation_hold_seconds == 0 || self.reservation_hold_seconds > MAX_HOLD_SECONDS {
            return Err(config::ConfigError::Message(format!(
                "business_rules.reservation_hold_seconds must be between 1 and {}, got {}",
                MAX_HOLD_SECONDS, self.reservation_hold_seconds
            )));
        }
        if self.tick_interval_ms == 0 {
            return Err(config::ConfigError::Message(
                "business_rules.tick_interval_ms must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for BusinessRules {
    fn default() -> Self {
        Self {
            reservation_hold_seconds: 600,
            tick_interval_ms: 1000,
            expiry_refresh_delay_ms: 2000,
            confirm_refresh_delay_ms: 1000,
            resume_delay_ms: 500,
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from("config")
    }

    /// Layers `{dir}/default`, `{dir}/{RUN_MODE}`, `{dir}/local` and `SEATLINE__*`
    /// environment variables over built-in defaults. All files are optional.
    pub fn load_from(dir: &str) -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());
        let rules = BusinessRules::default();

        let s = config::Config::builder()
            .set_default("api.base_url", "http://localhost:8081")?
            .set_default("storage.backend", "file")?
            .set_default("storage.path", ".seatline")?
            .set_default("business_rules.reservation_hold_seconds", rules.reservation_hold_seconds)?
            .set_default("business_rules.tick_interval_ms", rules.tick_interval_ms)?
            .set_default("business_rules.expiry_refresh_delay_ms", rules.expiry_refresh_delay_ms)?
            .set_default("business_rules.confirm_refresh_delay_ms", rules.confirm_refresh_delay_ms)?
            .set_default("business_rules.resume_delay_ms", rules.resume_delay_ms)?
            .add_source(config::File::with_name(&format!("{}/default", dir)).required(false))
            .add_source(config::File::with_name(&format!("{}/{}", dir, run_mode)).required(false))
            // Not checked in
            .add_source(config::File::with_name(&format!("{}/local", dir)).required(false))
            // Eg. `SEATLINE__API__BASE_URL=http://booking:8081`
            .add_source(config::Environment::with_prefix("SEATLINE").prefix_separator("__").separator("__"))
            .build()?;

        let config: Self = s.try_deserialize()?;
        config.business_rules.validate()?;
        Ok(config)
    }
}
