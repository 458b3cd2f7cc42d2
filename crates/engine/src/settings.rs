//! Engine settings derived from application configuration.

use std::time::Duration;

use ledgerline_core::voucher::VoucherRules;
use ledgerline_shared::EngineConfig;

/// Settings the engine services run with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineSettings {
    /// How long `begin` waits for a tenant's unit of work.
    pub lock_timeout: Duration,
    /// Voucher edit and transition limits.
    pub rules: VoucherRules,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self::from(&EngineConfig::default())
    }
}

impl From<&EngineConfig> for EngineSettings {
    fn from(config: &EngineConfig) -> Self {
        Self {
            lock_timeout: Duration::from_millis(config.lock_timeout_ms),
            rules: VoucherRules {
                max_entries: config.max_entries_per_voucher,
                require_rejection_reason: config.require_rejection_reason,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_follow_engine_config() {
        let settings = EngineSettings::default();
        assert_eq!(settings.lock_timeout, Duration::from_secs(5));
        assert_eq!(settings.rules, VoucherRules::default());
    }

    #[test]
    fn test_config_overrides_rules() {
        let config = EngineConfig {
            lock_timeout_ms: 250,
            require_rejection_reason: false,
            max_entries_per_voucher: 10,
        };
        let settings = EngineSettings::from(&config);
        assert_eq!(settings.lock_timeout, Duration::from_millis(250));
        assert_eq!(settings.rules.max_entries, 10);
        assert!(!settings.rules.require_rejection_reason);
    }
}
