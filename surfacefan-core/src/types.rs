//! Core types and data structures for the fan shim

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fan speed in rotations per minute, or a dimensionless setpoint
///
/// Transported as a fixed-width 16-bit little-endian value.
pub type SpeedValue = u16;

/// Size of a speed value on the wire
pub const SPEED_WIRE_LEN: usize = 2;

/// Encode a speed value for the wire (little-endian)
#[inline]
pub fn speed_to_wire(value: SpeedValue) -> [u8; SPEED_WIRE_LEN] {
    value.to_le_bytes()
}

/// Decode a speed value from the wire (little-endian)
///
/// Returns `None` unless `bytes` is exactly two bytes long.
#[inline]
pub fn speed_from_wire(bytes: &[u8]) -> Option<SpeedValue> {
    let raw: [u8; SPEED_WIRE_LEN] = bytes.try_into().ok()?;
    Some(SpeedValue::from_le_bytes(raw))
}

/// Conversion of wider integers into a `SpeedValue` by saturation
///
/// Values below zero become 0, values above 65535 become 65535. Wrapping
/// (`as u16`) is never used.
pub trait ToSpeedValue {
    /// Saturate `self` into `[0, 65535]`
    fn to_speed_value(self) -> SpeedValue;
}

macro_rules! impl_unsigned_speed {
    ($($t:ty),*) => {
        $(
            impl ToSpeedValue for $t {
                #[inline]
                fn to_speed_value(self) -> SpeedValue {
                    SpeedValue::try_from(self).unwrap_or(SpeedValue::MAX)
                }
            }
        )*
    };
}

macro_rules! impl_signed_speed {
    ($($t:ty),*) => {
        $(
            impl ToSpeedValue for $t {
                #[inline]
                fn to_speed_value(self) -> SpeedValue {
                    if self < 0 {
                        0
                    } else {
                        SpeedValue::try_from(self).unwrap_or(SpeedValue::MAX)
                    }
                }
            }
        )*
    };
}

impl ToSpeedValue for u16 {
    #[inline]
    fn to_speed_value(self) -> SpeedValue {
        self
    }
}

impl ToSpeedValue for u8 {
    #[inline]
    fn to_speed_value(self) -> SpeedValue {
        SpeedValue::from(self)
    }
}

impl_unsigned_speed!(u32, u64, u128, usize);
impl_signed_speed!(i8, i16, i32, i64, i128, isize);

/// A single live fan reading
///
/// Never cached: every reading is the result of one round trip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reading {
    /// Measured fan speed
    pub rpm: SpeedValue,
}

/// Why a binding was permanently refused
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BindFailure {
    /// The presence probe showed there is no fan behind this endpoint
    Absent,
}

/// Initialization state of a fan controller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "reason", rename_all = "lowercase")]
pub enum BindState {
    /// No remote endpoint association yet
    Unbound,
    /// A presence probe is in flight
    Probing,
    /// Fully operational
    Bound,
    /// The remote controller is not ready; bind must be re-invoked later
    Deferred,
    /// Binding permanently refused for this device instance
    Failed(BindFailure),
    /// Torn down; every call fails with `Fault::Removed`
    Removed,
}

impl BindState {
    /// Get a string representation for API responses and logs
    pub fn as_str(&self) -> &'static str {
        match self {
            BindState::Unbound => "unbound",
            BindState::Probing => "probing",
            BindState::Bound => "bound",
            BindState::Deferred => "deferred",
            BindState::Failed(BindFailure::Absent) => "failed(absent)",
            BindState::Removed => "removed",
        }
    }

    /// Whether no further bind attempt can change this state
    pub fn is_terminal(&self) -> bool {
        matches!(self, BindState::Failed(_) | BindState::Removed)
    }
}

impl fmt::Display for BindState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
