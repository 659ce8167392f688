//! # Engine Configuration
//!
//! Configuration management for the booking engine.
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     RENTDESK_GRACE_MINUTES=45                                          │
//! │     RENTDESK_NOTIFICATIONS=off                                         │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/rentdesk/engine.toml (Linux)                             │
//! │     ~/Library/Application Support/com.rentdesk.desk/engine.toml (mac)  │
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! │     House rates: 30 min grace, ₹100/h late, ₹500/day late,             │
//! │     ₹300/day extension                                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Configuration File Format
//! ```toml
//! # engine.toml
//! [fees]
//! grace_period_minutes = 30
//! late_fee_per_hour_paise = 10000      # ₹100/hour
//! late_fee_per_day_paise = 50000       # ₹500/day
//! extension_fee_per_day_paise = 30000  # ₹300/day
//!
//! [notifications]
//! enabled = true
//! channel_capacity = 64
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::{EngineError, EngineResult};
use rentdesk_core::FeePolicy;

// =============================================================================
// Notification Settings
// =============================================================================

/// Notification dispatch settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifySettings {
    /// Whether notification dispatch is enabled at all.
    /// Disabled = mutations succeed silently (useful for imports/tests).
    #[serde(default = "default_notifications_enabled")]
    pub enabled: bool,

    /// Buffer size for a channel notifier built via
    /// `ChannelNotifier::from_settings`.
    ///
    /// When the delivery glue falls this many messages behind, dispatch
    /// awaits instead of dropping - messages are cheap, bookings are not.
    #[serde(default = "default_channel_capacity")]
    pub channel_capacity: usize,
}

fn default_notifications_enabled() -> bool {
    true
}

fn default_channel_capacity() -> usize {
    64
}

impl Default for NotifySettings {
    fn default() -> Self {
        NotifySettings {
            enabled: default_notifications_enabled(),
            channel_capacity: default_channel_capacity(),
        }
    }
}

// =============================================================================
// Main Engine Configuration
// =============================================================================

/// Complete engine configuration.
///
/// ## Example Config File
/// ```toml
/// [fees]
/// grace_period_minutes = 30
/// late_fee_per_hour_paise = 10000
/// late_fee_per_day_paise = 50000
/// extension_fee_per_day_paise = 30000
///
/// [notifications]
/// enabled = true
/// channel_capacity = 64
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Return-fee rates and grace window.
    #[serde(default)]
    pub fees: FeePolicy,

    /// Notification dispatch settings.
    #[serde(default)]
    pub notifications: NotifySettings,
}

impl EngineConfig {
    /// Creates a new config with house-rate defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (engine.toml)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> EngineResult<Self> {
        let mut config = Self::default();

        // Try to load from config file
        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading engine config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        // Override with environment variables
        config.apply_env_overrides();

        // Validate the configuration
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load engine config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> EngineResult<()> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| EngineError::ConfigSaveFailed("No config path available".into()))?;

        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents)?;

        info!(?path, "Engine config saved");
        Ok(())
    }

    /// Validates the configuration.
    pub fn validate(&self) -> EngineResult<()> {
        self.fees
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;

        if self.notifications.channel_capacity == 0 {
            return Err(EngineError::InvalidConfig(
                "channel_capacity must be greater than 0".into(),
            ));
        }

        Ok(())
    }

    /// Applies environment variable overrides.
    fn apply_env_overrides(&mut self) {
        // Grace window
        if let Ok(minutes) = std::env::var("RENTDESK_GRACE_MINUTES") {
            if let Ok(m) = minutes.parse::<i64>() {
                debug!(grace_minutes = m, "Overriding grace window from environment");
                self.fees.grace_period_minutes = m;
            }
        }

        // Fee rates (paise)
        if let Ok(rate) = std::env::var("RENTDESK_LATE_FEE_PER_HOUR") {
            if let Ok(r) = rate.parse::<i64>() {
                self.fees.late_fee_per_hour_paise = r;
            }
        }
        if let Ok(rate) = std::env::var("RENTDESK_LATE_FEE_PER_DAY") {
            if let Ok(r) = rate.parse::<i64>() {
                self.fees.late_fee_per_day_paise = r;
            }
        }
        if let Ok(rate) = std::env::var("RENTDESK_EXTENSION_FEE_PER_DAY") {
            if let Ok(r) = rate.parse::<i64>() {
                self.fees.extension_fee_per_day_paise = r;
            }
        }

        // Notification kill switch
        if let Ok(enabled) = std::env::var("RENTDESK_NOTIFICATIONS") {
            match enabled.to_lowercase().as_str() {
                "on" | "true" | "1" => self.notifications.enabled = true,
                "off" | "false" | "0" => self.notifications.enabled = false,
                other => warn!(value = %other, "Unknown RENTDESK_NOTIFICATIONS value"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "rentdesk", "desk").map(|dirs| {
            let config_dir = dirs.config_dir();
            config_dir.join("engine.toml")
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EngineConfig::default();
        assert_eq!(config.fees.grace_period_minutes, 30);
        assert_eq!(config.fees.late_fee_per_hour_paise, 10_000);
        assert_eq!(config.fees.late_fee_per_day_paise, 50_000);
        assert_eq!(config.fees.extension_fee_per_day_paise, 30_000);
        assert!(config.notifications.enabled);
        assert_eq!(config.notifications.channel_capacity, 64);
    }

    #[test]
    fn test_config_validation() {
        let mut config = EngineConfig::default();
        assert!(config.validate().is_ok());

        // Negative rate should fail
        config.fees.late_fee_per_day_paise = -1;
        assert!(config.validate().is_err());

        // Zero channel capacity should fail
        config.fees.late_fee_per_day_paise = 50_000;
        config.notifications.channel_capacity = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_toml_serialization() {
        let config = EngineConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[fees]"));
        assert!(toml_str.contains("[notifications]"));
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        // A file that only overrides the grace window keeps house rates
        let config: EngineConfig = toml::from_str(
            r#"
            [fees]
            grace_period_minutes = 45
            "#,
        )
        .unwrap();

        assert_eq!(config.fees.grace_period_minutes, 45);
        assert_eq!(config.fees.late_fee_per_hour_paise, 10_000);
        assert!(config.notifications.enabled);
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let config: EngineConfig = toml::from_str("").unwrap();
        assert_eq!(config.fees.grace_period_minutes, 30);
        assert_eq!(config.notifications.channel_capacity, 64);
    }
}
