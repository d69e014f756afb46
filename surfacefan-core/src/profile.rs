//! Hardware variants and their capability profiles
//!
//! Every known Surface fan variant is described by plain data: a
//! [`CapabilityProfile`] (speed bounds, writability, presence-probe policy)
//! and the [`EndpointId`] of the SAM fan subsystem. A single controller
//! implementation is parameterized by this data instead of carrying one code
//! path per variant.
//!
//! Note: Actual request I/O lives in the `surfacefan-hardware` crate. This
//! module only contains the variant specifications.

use crate::error::ConfigError;
use crate::types::SpeedValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// SAM target category of the fan subsystem
pub const TARGET_CATEGORY_FAN: u8 = 0x05;

/// SAM target id of the aggregator module itself
pub const TARGET_ID_SAM: u8 = 0x01;

/// Command id reading the current fan speed
pub const COMMAND_GET_SPEED: u8 = 0x01;

/// Command id writing the fan speed setpoint
pub const COMMAND_SET_SPEED: u8 = 0x0b;

/// Logical address of a remote endpoint (category / id / instance)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EndpointId {
    /// Target category (subsystem)
    pub target_category: u8,
    /// Target id (which controller on the bus)
    pub target_id: u8,
    /// Instance of the subsystem
    pub instance_id: u8,
}

impl EndpointId {
    /// The fan endpoint shared by every known variant
    pub const SURFACE_FAN: EndpointId = EndpointId {
        target_category: TARGET_CATEGORY_FAN,
        target_id: TARGET_ID_SAM,
        instance_id: 0x01,
    };
}

impl fmt::Display for EndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "tc=0x{:02x} tid=0x{:02x} iid=0x{:02x}",
            self.target_category, self.target_id, self.instance_id
        )
    }
}

/// Per-variant capabilities of a fan
///
/// Immutable for the lifetime of a bound controller. The bounds are advisory
/// values for presentation; they are not enforced on writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilityProfile {
    /// Minimum speed reported to consumers
    pub min_speed: SpeedValue,
    /// Maximum speed reported to consumers
    pub max_speed: SpeedValue,
    /// Whether a speed setpoint can be written
    pub writable: bool,
    /// Whether binding must confirm the fan with a read first
    pub presence_probe_required: bool,
}

impl CapabilityProfile {
    /// Check internal consistency of a profile
    ///
    /// # Errors
    ///
    /// Returns an error if `min_speed` exceeds `max_speed`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.min_speed > self.max_speed {
            return Err(ConfigError::Invalid(format!(
                "min_speed ({}) must not exceed max_speed ({})",
                self.min_speed, self.max_speed
            )));
        }
        Ok(())
    }
}

/// Known hardware variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HardwareVariant {
    /// SSAM client device exposing a read-only hwmon fan
    #[serde(rename = "ssam-hwmon")]
    SsamHwmon,
    /// ACPI `PNP0C0B` platform fan with cooling-device control
    #[serde(rename = "acpi-cooling")]
    AcpiCooling,
    /// ACPI platform fan reporting an 8000 rpm ceiling
    #[serde(rename = "acpi-cooling-8k")]
    AcpiCooling8k,
    /// Early prototype with an unverified placeholder maximum
    #[serde(rename = "prototype")]
    Prototype,
    /// Profile supplied by configuration
    #[serde(rename = "custom")]
    Custom,
}

impl HardwareVariant {
    /// All variants with a built-in profile
    pub const BUILTIN: [HardwareVariant; 4] = [
        HardwareVariant::SsamHwmon,
        HardwareVariant::AcpiCooling,
        HardwareVariant::AcpiCooling8k,
        HardwareVariant::Prototype,
    ];

    /// Get the configuration name of this variant
    pub fn as_str(&self) -> &'static str {
        match self {
            HardwareVariant::SsamHwmon => "ssam-hwmon",
            HardwareVariant::AcpiCooling => "acpi-cooling",
            HardwareVariant::AcpiCooling8k => "acpi-cooling-8k",
            HardwareVariant::Prototype => "prototype",
            HardwareVariant::Custom => "custom",
        }
    }

    /// Get a human-readable name
    pub fn name(&self) -> &'static str {
        match self {
            HardwareVariant::SsamHwmon => "Surface SSAM hwmon fan",
            HardwareVariant::AcpiCooling => "Surface ACPI cooling fan",
            HardwareVariant::AcpiCooling8k => "Surface ACPI cooling fan (8000 rpm)",
            HardwareVariant::Prototype => "Surface fan prototype",
            HardwareVariant::Custom => "Custom fan profile",
        }
    }

    /// Built-in capability profile, `None` for [`HardwareVariant::Custom`]
    pub fn profile(&self) -> Option<CapabilityProfile> {
        let profile = match self {
            // The controller spins up at 3000; 7500 is the observed top speed
            // rounded up to a multiple of 500.
            HardwareVariant::SsamHwmon => CapabilityProfile {
                min_speed: 3000,
                max_speed: 7500,
                writable: false,
                presence_probe_required: false,
            },
            HardwareVariant::AcpiCooling => CapabilityProfile {
                min_speed: 2000,
                max_speed: 7200,
                writable: true,
                presence_probe_required: true,
            },
            HardwareVariant::AcpiCooling8k => CapabilityProfile {
                min_speed: 2000,
                max_speed: 8000,
                writable: true,
                presence_probe_required: true,
            },
            // 13370 is a placeholder that was never measured.
            HardwareVariant::Prototype => CapabilityProfile {
                min_speed: 2000,
                max_speed: 13370,
                writable: true,
                presence_probe_required: true,
            },
            HardwareVariant::Custom => return None,
        };
        Some(profile)
    }

    /// Endpoint addressed by this variant
    pub fn endpoint(&self) -> EndpointId {
        EndpointId::SURFACE_FAN
    }

    /// Resolve the effective profile, using `custom` for [`HardwareVariant::Custom`]
    ///
    /// # Errors
    ///
    /// Returns an error if a custom variant has no profile, or the profile is
    /// inconsistent.
    pub fn resolve(
        &self,
        custom: Option<&CapabilityProfile>,
    ) -> Result<CapabilityProfile, ConfigError> {
        let profile = match (self.profile(), custom) {
            (Some(builtin), _) => builtin,
            (None, Some(custom)) => *custom,
            (None, None) => {
                return Err(ConfigError::Invalid(
                    "variant 'custom' requires a [device.profile] table".to_string(),
                ))
            }
        };
        profile.validate()?;
        Ok(profile)
    }
}

impl fmt::Display for HardwareVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for HardwareVariant {
    type Err = ConfigError;

    /// Parse a variant from string (for the CLI `--variant` flag)
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// use surfacefan_core::profile::HardwareVariant;
    ///
    /// assert!(HardwareVariant::from_str("ssam-hwmon").is_ok());
    /// assert!(HardwareVariant::from_str("ACPI-Cooling").is_ok());
    /// assert!(HardwareVariant::from_str("unknown").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "ssam-hwmon" | "hwmon" => Ok(HardwareVariant::SsamHwmon),
            "acpi-cooling" | "acpi" => Ok(HardwareVariant::AcpiCooling),
            "acpi-cooling-8k" => Ok(HardwareVariant::AcpiCooling8k),
            "prototype" => Ok(HardwareVariant::Prototype),
            "custom" => Ok(HardwareVariant::Custom),
            _ => Err(ConfigError::Invalid(format!(
                "Unknown hardware variant: '{}'. Valid options: ssam-hwmon, acpi-cooling, acpi-cooling-8k, prototype, custom",
                s
            ))),
        }
    }
}

/// Runtime description of the selected variant, for API responses
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantInfo {
    /// Variant identifier
    pub variant: HardwareVariant,
    /// Human-readable name
    pub name: String,
    /// Endpoint addressed by the channel
    pub endpoint: EndpointId,
    /// Effective capability profile
    pub profile: CapabilityProfile,
}

impl VariantInfo {
    /// Build the description for a variant and its resolved profile
    pub fn new(variant: HardwareVariant, profile: CapabilityProfile) -> Self {
        Self {
            variant,
            name: variant.name().to_string(),
            endpoint: variant.endpoint(),
            profile,
        }
    }
}
