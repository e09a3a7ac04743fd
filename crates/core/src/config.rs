use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub budget: BudgetConfig,
    pub sync: SyncConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug)]
pub struct StoreConfig {
    pub endpoint_url: String,
    pub timeout_secs: u64,
}

#[derive(Clone, Debug)]
pub struct BudgetConfig {
    pub monthly_hours: Decimal,
}

#[derive(Clone, Debug)]
pub struct SyncConfig {
    pub poll_interval_secs: u64,
    pub rollover_check_secs: u64,
}

#[derive(Clone, Debug)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub endpoint_url: Option<String>,
    pub monthly_hours: Option<Decimal>,
    pub log_level: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            store: StoreConfig { endpoint_url: String::new(), timeout_secs: 30 },
            budget: BudgetConfig { monthly_hours: Decimal::new(12, 0) },
            sync: SyncConfig { poll_interval_secs: 60, rollover_check_secs: 3600 },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch)?;
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("ciboard.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) -> Result<(), ConfigError> {
        if let Some(store) = patch.store {
            if let Some(endpoint_url) = store.endpoint_url {
                self.store.endpoint_url = endpoint_url;
            }
            if let Some(timeout_secs) = store.timeout_secs {
                self.store.timeout_secs = timeout_secs;
            }
        }

        if let Some(budget) = patch.budget {
            if let Some(monthly_hours) = budget.monthly_hours {
                self.budget.monthly_hours = decimal_hours("budget.monthly_hours", monthly_hours)?;
            }
        }

        if let Some(sync) = patch.sync {
            if let Some(poll_interval_secs) = sync.poll_interval_secs {
                self.sync.poll_interval_secs = poll_interval_secs;
            }
            if let Some(rollover_check_secs) = sync.rollover_check_secs {
                self.sync.rollover_check_secs = rollover_check_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }

        Ok(())
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("CIBOARD_STORE_ENDPOINT_URL") {
            self.store.endpoint_url = value;
        }
        if let Some(value) = read_env("CIBOARD_STORE_TIMEOUT_SECS") {
            self.store.timeout_secs = parse_u64("CIBOARD_STORE_TIMEOUT_SECS", &value)?;
        }

        if let Some(value) = read_env("CIBOARD_BUDGET_MONTHLY_HOURS") {
            let hours = parse_f64("CIBOARD_BUDGET_MONTHLY_HOURS", &value)?;
            self.budget.monthly_hours = decimal_hours("CIBOARD_BUDGET_MONTHLY_HOURS", hours)?;
        }

        if let Some(value) = read_env("CIBOARD_SYNC_POLL_INTERVAL_SECS") {
            self.sync.poll_interval_secs = parse_u64("CIBOARD_SYNC_POLL_INTERVAL_SECS", &value)?;
        }
        if let Some(value) = read_env("CIBOARD_SYNC_ROLLOVER_CHECK_SECS") {
            self.sync.rollover_check_secs = parse_u64("CIBOARD_SYNC_ROLLOVER_CHECK_SECS", &value)?;
        }

        if let Some(value) = read_env("CIBOARD_LOG_LEVEL") {
            self.logging.level = value;
        }
        if let Some(value) = read_env("CIBOARD_LOG_FORMAT") {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(endpoint_url) = overrides.endpoint_url {
            self.store.endpoint_url = endpoint_url;
        }
        if let Some(monthly_hours) = overrides.monthly_hours {
            self.budget.monthly_hours = monthly_hours;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_store(&self.store)?;
        validate_budget(&self.budget)?;
        validate_sync(&self.sync)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then(|| path.to_path_buf());
    }

    [PathBuf::from("ciboard.toml"), PathBuf::from("config/ciboard.toml")]
        .into_iter()
        .find(|path| path.exists())
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    toml::from_str::<ConfigPatch>(&raw)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn validate_store(store: &StoreConfig) -> Result<(), ConfigError> {
    let url = store.endpoint_url.trim();
    if url.is_empty() {
        return Err(ConfigError::Validation(
            "store.endpoint_url is required (the deployed sheet web-app URL)".to_string(),
        ));
    }
    if !url.starts_with("http://") && !url.starts_with("https://") {
        return Err(ConfigError::Validation(
            "store.endpoint_url must start with http:// or https://".to_string(),
        ));
    }

    if store.timeout_secs == 0 || store.timeout_secs > 300 {
        return Err(ConfigError::Validation(
            "store.timeout_secs must be in range 1..=300".to_string(),
        ));
    }

    Ok(())
}

fn validate_budget(budget: &BudgetConfig) -> Result<(), ConfigError> {
    if budget.monthly_hours <= Decimal::ZERO {
        return Err(ConfigError::Validation(
            "budget.monthly_hours must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_sync(sync: &SyncConfig) -> Result<(), ConfigError> {
    if sync.poll_interval_secs == 0 {
        return Err(ConfigError::Validation(
            "sync.poll_interval_secs must be greater than zero".to_string(),
        ));
    }
    if sync.rollover_check_secs == 0 {
        return Err(ConfigError::Validation(
            "sync.rollover_check_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.parse::<u64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.parse::<f64>().map_err(|_| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn decimal_hours(key: &str, value: f64) -> Result<Decimal, ConfigError> {
    Decimal::from_f64(value).ok_or_else(|| ConfigError::InvalidEnvOverride {
        key: key.to_string(),
        value: value.to_string(),
    })
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    store: Option<StorePatch>,
    budget: Option<BudgetPatch>,
    sync: Option<SyncPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct StorePatch {
    endpoint_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct BudgetPatch {
    monthly_hours: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
struct SyncPatch {
    poll_interval_secs: Option<u64>,
    rollover_check_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
