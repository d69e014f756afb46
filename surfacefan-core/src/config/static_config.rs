//! Static configuration loaded once at startup
//!
//! This configuration is read-only after the daemon starts.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::paths::DEFAULT_DEVICE_PATH;
use crate::error::ConfigError;
use crate::profile::{CapabilityProfile, HardwareVariant};

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address
    pub hostname: String,
    /// Server port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            hostname: "127.0.0.1".to_string(),
            port: 3300,
        }
    }
}

/// Fan device selection
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Hardware variant, selecting the capability profile
    pub variant: HardwareVariant,
    /// Path of the SAM character device
    pub path: PathBuf,
    /// Profile for `variant = "custom"`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile: Option<CapabilityProfile>,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            variant: HardwareVariant::AcpiCooling,
            path: PathBuf::from(DEFAULT_DEVICE_PATH),
            profile: None,
        }
    }
}

impl DeviceConfig {
    /// Resolve the effective capability profile
    pub fn resolve_profile(&self) -> Result<CapabilityProfile, ConfigError> {
        self.variant.resolve(self.profile.as_ref())
    }
}

/// Re-probe schedule for a deferred bind
///
/// The controller never retries on its own; the daemon re-invokes bind on
/// this schedule while the remote controller reports "not yet enumerated".
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeConfig {
    /// Maximum bind attempts (0 = unlimited)
    pub max_attempts: u32,
    /// Delay before the first re-probe, in milliseconds
    pub initial_delay_ms: u64,
    /// Upper bound for the delay between re-probes, in milliseconds
    pub max_delay_ms: u64,
    /// Factor applied to the delay after each deferred attempt
    pub backoff_multiplier: f64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            max_attempts: 0,
            initial_delay_ms: 500,
            max_delay_ms: 30_000,
            backoff_multiplier: 2.0,
        }
    }
}

/// Static configuration for the surfacefand daemon.
///
/// Located at `~/.config/surfacefan/config.toml` by default. Every table and
/// field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticConfig {
    /// Server configuration (bind address, port)
    pub server: ServerConfig,

    /// Device selection (variant, device path)
    pub device: DeviceConfig,

    /// Deferred-bind retry schedule
    pub probe: ProbeConfig,
}

impl StaticConfig {
    /// Parse StaticConfig from TOML string.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize StaticConfig to TOML string.
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check cross-field constraints
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.device.resolve_profile()?;

        if !self.probe.backoff_multiplier.is_finite() || self.probe.backoff_multiplier < 1.0 {
            return Err(ConfigError::Invalid(format!(
                "probe.backoff_multiplier must be a finite value >= 1.0, got {}",
                self.probe.backoff_multiplier
            )));
        }
        if self.probe.initial_delay_ms == 0 {
            return Err(ConfigError::Invalid(
                "probe.initial_delay_ms must be at least 1".to_string(),
            ));
        }
        if self.probe.initial_delay_ms > self.probe.max_delay_ms {
            return Err(ConfigError::Invalid(format!(
                "probe.initial_delay_ms ({}) exceeds probe.max_delay_ms ({})",
                self.probe.initial_delay_ms, self.probe.max_delay_ms
            )));
        }
        Ok(())
    }
}
