use crate::models::{EventConfig, PairingFormat, RepeatPolicy};
use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub registry: RegistrySettings,
    #[serde(default)]
    pub event: EventSettings,
    #[serde(default)]
    pub timer: TimerSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegistrySettings {
    pub endpoint: String,
    pub api_key: String,
}

/// Fallback event configuration for registries that carry no per-event
/// settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventSettings {
    #[serde(default = "default_table_count")]
    pub table_count: u16,
    #[serde(default = "default_round_duration_secs")]
    pub round_duration_secs: u32,
    #[serde(default = "default_round_budget")]
    pub round_budget: u32,
    #[serde(default)]
    pub format: PairingFormat,
    #[serde(default)]
    pub repeat_policy: RepeatPolicy,
}

impl Default for EventSettings {
    fn default() -> Self {
        Self {
            table_count: default_table_count(),
            round_duration_secs: default_round_duration_secs(),
            round_budget: default_round_budget(),
            format: PairingFormat::default(),
            repeat_policy: RepeatPolicy::default(),
        }
    }
}

impl EventSettings {
    pub fn as_event_config(&self) -> EventConfig {
        EventConfig {
            table_count: self.table_count,
            round_duration_seconds: self.round_duration_secs,
            round_budget: self.round_budget,
            format: self.format,
            repeat_policy: self.repeat_policy,
        }
    }
}

fn default_table_count() -> u16 { 10 }
fn default_round_duration_secs() -> u32 { 240 }
fn default_round_budget() -> u32 { 12 }

#[derive(Debug, Clone, Deserialize)]
pub struct TimerSettings {
    /// Per-event broadcast buffer; subscribers further behind than this skip
    #[serde(default = "default_broadcast_capacity")]
    pub broadcast_capacity: usize,
}

impl Default for TimerSettings {
    fn default() -> Self {
        Self {
            broadcast_capacity: default_broadcast_capacity(),
        }
    }
}

fn default_broadcast_capacity() -> usize { 256 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "json".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Environment variables (prefixed with RONDO_)
    pub fn load() -> Result<Self, ConfigError> {
        let mut settings = Config::builder()
            // Add default config file
            .add_source(File::with_name("config/default").required(false))
            // Add local config file (for development overrides)
            .add_source(File::with_name("config/local").required(false))
            // Add environment variables (prefixed with RONDO_)
            // e.g., RONDO_SERVER__PORT -> server.port
            .add_source(
                Environment::with_prefix("RONDO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings = substitute_env_vars(settings)?;

        settings.try_deserialize()
    }

    /// Load configuration from a custom path
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(
                Environment::with_prefix("RONDO")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        settings.try_deserialize()
    }
}

/// Allow the registry connection to come from bare environment variables
/// as deployed containers usually set them
fn substitute_env_vars(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let registry_endpoint = env::var("REGISTRY_URL")
        .or_else(|_| env::var("RONDO_REGISTRY__ENDPOINT"))
        .ok();
    let registry_api_key = env::var("REGISTRY_API_KEY")
        .or_else(|_| env::var("RONDO_REGISTRY__API_KEY"))
        .ok();

    let mut builder = Config::builder().add_source(settings);

    if let Some(endpoint) = registry_endpoint {
        builder = builder.set_override("registry.endpoint", endpoint)?;
    }
    if let Some(api_key) = registry_api_key {
        builder = builder.set_override("registry.api_key", api_key)?;
    }

    builder.build()
}
