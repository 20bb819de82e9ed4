use shared_types::{AppConfig, CommissionPolicy, FeatureFlags, SlaPolicy};
use std::sync::OnceLock;

static CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// Path to the config file, relative to the working directory.
const CONFIG_PATH: &str = "config.toml";

/// Read `config.toml` and store it in the global `OnceLock`. Safe to call
/// multiple times; only the first call has effect.
///
/// A missing or unparseable file yields defaults: every integration off,
/// commission 50/70, SLA hours 24/48/72/120.
pub fn load_config() -> &'static AppConfig {
    CONFIG.get_or_init(|| match std::fs::read_to_string(CONFIG_PATH) {
        Ok(contents) => {
            let config: AppConfig = toml::from_str(&contents).unwrap_or_else(|e| {
                tracing::warn!("Failed to parse {CONFIG_PATH}: {e}; using defaults");
                AppConfig::default()
            });
            tracing::info!(features = ?config.features, commission = ?config.commission, "Config loaded");
            config
        }
        Err(e) => {
            tracing::warn!("{CONFIG_PATH} not found ({e}); using defaults");
            AppConfig::default()
        }
    })
}

/// The loaded config, or defaults if `load_config()` hasn't run.
pub fn app_config() -> &'static AppConfig {
    static DEFAULT: OnceLock<AppConfig> = OnceLock::new();
    CONFIG
        .get()
        .unwrap_or_else(|| DEFAULT.get_or_init(AppConfig::default))
}

pub fn feature_flags() -> &'static FeatureFlags {
    &app_config().features
}

pub fn commission_policy() -> CommissionPolicy {
    app_config().commission
}

pub fn sla_policy() -> SlaPolicy {
    app_config().sla
}
