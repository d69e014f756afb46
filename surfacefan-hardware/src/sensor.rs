//! Read-only sensor view of a fan controller
//!
//! Mirrors an hwmon fan channel: `input`, `min` and `max`. Which attributes
//! exist is decided once, from the capability profile, when the adapter is
//! attached.

use crate::channel::Transport;
use crate::fan_controller::{FanController, SharedController};
use std::fmt;
use std::str::FromStr;
use std::sync::Weak;
use surfacefan_core::{BindState, CapabilityProfile, Fault, Result, SpeedValue};
use tokio::sync::RwLock;

/// Permission bits of a visible read-only attribute
pub const MODE_READ_ONLY: u16 = 0o444;

/// Attributes of the sensor view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorAttribute {
    /// Live fan speed
    Input,
    /// Advisory minimum
    Min,
    /// Advisory maximum
    Max,
}

impl SensorAttribute {
    /// All attributes, in presentation order
    pub const ALL: [SensorAttribute; 3] = [
        SensorAttribute::Input,
        SensorAttribute::Min,
        SensorAttribute::Max,
    ];

    /// Attribute name
    pub fn as_str(&self) -> &'static str {
        match self {
            SensorAttribute::Input => "input",
            SensorAttribute::Min => "min",
            SensorAttribute::Max => "max",
        }
    }
}

impl fmt::Display for SensorAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorAttribute {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "input" | "fan1_input" => Ok(SensorAttribute::Input),
            "min" | "fan1_min" => Ok(SensorAttribute::Min),
            "max" | "fan1_max" => Ok(SensorAttribute::Max),
            _ => Err(format!("Unknown sensor attribute: '{}'", s)),
        }
    }
}

/// Static attribute visibility derived from a profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorVisibility {
    input: bool,
    min: bool,
    max: bool,
}

impl SensorVisibility {
    /// Decide visibility for `profile`
    ///
    /// `input` is always present; a bound of zero means the variant reports
    /// none, so the attribute is hidden.
    pub fn from_profile(profile: &CapabilityProfile) -> Self {
        Self {
            input: true,
            min: profile.min_speed > 0,
            max: profile.max_speed > 0,
        }
    }

    /// Permission bits for `attribute`, 0 when hidden
    pub fn mode(&self, attribute: SensorAttribute) -> u16 {
        let visible = match attribute {
            SensorAttribute::Input => self.input,
            SensorAttribute::Min => self.min,
            SensorAttribute::Max => self.max,
        };
        if visible {
            MODE_READ_ONLY
        } else {
            0
        }
    }

    /// Whether `attribute` is exposed
    pub fn is_visible(&self, attribute: SensorAttribute) -> bool {
        self.mode(attribute) != 0
    }
}

/// Sensor adapter
///
/// Holds a non-owning reference: once the owner drops the controller, every
/// read fails with `Fault::Removed`.
pub struct SensorAdapter<T: Transport + ?Sized = dyn Transport> {
    controller: Weak<RwLock<FanController<T>>>,
    visibility: SensorVisibility,
}

impl<T: Transport + ?Sized> Clone for SensorAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
            visibility: self.visibility,
        }
    }
}

impl<T: Transport + ?Sized> SensorAdapter<T> {
    /// Attach a sensor view to `controller`
    pub async fn attach(controller: &SharedController<T>) -> Self {
        let visibility = SensorVisibility::from_profile(controller.read().await.profile());
        Self {
            controller: std::sync::Arc::downgrade(controller),
            visibility,
        }
    }

    /// Attribute visibility fixed at attach time
    pub fn visibility(&self) -> SensorVisibility {
        self.visibility
    }

    /// Read one attribute
    ///
    /// Hidden attributes fail with `Fault::Unsupported` without a round trip.
    pub async fn read(&self, attribute: SensorAttribute) -> Result<SpeedValue> {
        let controller = self.controller.upgrade().ok_or(Fault::Removed)?;
        let controller = controller.read().await;

        if !self.visibility.is_visible(attribute) {
            return match controller.state() {
                BindState::Removed => Err(Fault::Removed),
                _ => Err(Fault::Unsupported("hidden sensor attribute")),
            };
        }

        match attribute {
            SensorAttribute::Input => controller.read_rpm().await,
            SensorAttribute::Min => controller.read_min(),
            SensorAttribute::Max => controller.read_max(),
        }
    }

    /// `input`: live fan speed
    pub async fn input(&self) -> Result<SpeedValue> {
        self.read(SensorAttribute::Input).await
    }

    /// `min`: advisory minimum
    pub async fn min(&self) -> Result<SpeedValue> {
        self.read(SensorAttribute::Min).await
    }

    /// `max`: advisory maximum
    pub async fn max(&self) -> Result<SpeedValue> {
        self.read(SensorAttribute::Max).await
    }
}
