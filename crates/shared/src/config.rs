//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
///
/// Every section has defaults, so an empty configuration is valid.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Ledger engine behaviour.
    #[serde(default)]
    pub engine: EngineConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Demo data seeding configuration.
    #[serde(default)]
    pub seed: SeedConfig,
}

/// Ledger engine configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// How long to wait for a tenant's store transaction before giving up.
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,
    /// Whether rejecting a voucher requires a non-blank reason.
    #[serde(default = "default_require_rejection_reason")]
    pub require_rejection_reason: bool,
    /// Upper bound on the number of entry lines in one voucher.
    #[serde(default = "default_max_entries_per_voucher")]
    pub max_entries_per_voucher: usize,
}

fn default_lock_timeout_ms() -> u64 {
    5_000
}

fn default_require_rejection_reason() -> bool {
    true
}

fn default_max_entries_per_voucher() -> usize {
    500
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            lock_timeout_ms: default_lock_timeout_ms(),
            require_rejection_reason: default_require_rejection_reason(),
            max_entries_per_voucher: default_max_entries_per_voucher(),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable output.
    #[default]
    Pretty,
    /// One JSON object per event.
    Json,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Default `EnvFilter` directive, used when `RUST_LOG` is unset.
    #[serde(default = "default_log_filter")]
    pub filter: String,
    /// Output format.
    #[serde(default)]
    pub format: LogFormat,
}

fn default_log_filter() -> String {
    "ledgerline=info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            format: LogFormat::default(),
        }
    }
}

/// Demo data seeding configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct SeedConfig {
    /// Display name of the seeded tenant.
    #[serde(default = "default_tenant_name")]
    pub tenant_name: String,
    /// Fiscal year whose periods are created.
    #[serde(default = "default_fiscal_year")]
    pub fiscal_year: i32,
}

fn default_tenant_name() -> String {
    "Demo Trading Co.".to_string()
}

fn default_fiscal_year() -> i32 {
    2026
}

impl Default for SeedConfig {
    fn default() -> Self {
        Self {
            tenant_name: default_tenant_name(),
            fiscal_year: default_fiscal_year(),
        }
    }
}

impl AppConfig {
    /// Loads configuration from config files and the environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// `config/default.toml`, `config/{RUN_MODE}.toml`, `LEDGERLINE__*` variables.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("LEDGERLINE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}
