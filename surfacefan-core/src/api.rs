//! API models for the surfacefand REST API
//!
//! This module contains the response models shared by the daemon and any
//! client talking to it.

use crate::profile::VariantInfo;
use crate::types::{BindState, SpeedValue};
use serde::{Deserialize, Serialize};

/// Generic API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum ApiResponse<T> {
    #[serde(rename = "success")]
    Success { data: T },
    #[serde(rename = "error")]
    Error { error: String },
}

impl<T> ApiResponse<T> {
    /// Create a successful response
    pub fn success(data: T) -> Self {
        Self::Success { data }
    }

    /// Create an error response
    pub fn error(error: String) -> Self {
        Self::Error { error }
    }
}

/// Server information response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfoResponse {
    /// Server version
    pub version: String,
    /// Selected hardware variant and its profile
    pub variant: VariantInfo,
    /// Current initialization state of the controller
    pub bind_state: BindState,
    /// Whether the daemon runs against the simulated transport
    pub mock: bool,
    /// Server uptime in seconds
    pub uptime: u64,
}

/// Sensor readout
///
/// Attributes hidden for the selected profile are omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorResponse {
    /// Live fan speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<SpeedValue>,
    /// Advisory minimum speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<SpeedValue>,
    /// Advisory maximum speed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<SpeedValue>,
}

/// Single sensor attribute
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SensorAttributeResponse {
    /// Attribute name (`input`, `min`, `max`)
    pub attribute: String,
    /// Attribute value
    pub value: SpeedValue,
}

/// Cooling-device readout
///
/// States are raw rpm values, not normalized cooling levels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoolingResponse {
    /// Highest state (the profile maximum)
    pub max_state: u64,
    /// Current state (the live fan speed)
    pub cur_state: u64,
}

/// Result of a cooling state write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetStateResponse {
    /// State requested by the caller, before saturation
    pub requested: i64,
    /// Setpoint actually transmitted after saturation
    pub applied: SpeedValue,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_response_envelope() {
        let ok = ApiResponse::success(42u16);
        let json = serde_json::to_value(&ok).unwrap();
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"], 42);

        let err: ApiResponse<()> = ApiResponse::error("boom".to_string());
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["status"], "error");
        assert_eq!(json["error"], "boom");
    }

    #[test]
    fn test_sensor_response_omits_hidden() {
        let response = SensorResponse {
            input: Some(4500),
            min: None,
            max: Some(7200),
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"input":4500,"max":7200}"#);

        let parsed: SensorResponse = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, response);
    }
}
