//! Sensor handlers exposing the hwmon-style fan view

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::{api_fail, api_ok};
use axum::{
    extract::{Path, State},
    Json,
};
use surfacefan_core::api::{ApiResponse, SensorAttributeResponse, SensorResponse};
use surfacefan_hardware::SensorAttribute;
use tracing::debug;

/// Read every visible sensor attribute.
///
/// Attributes hidden by the capability profile are omitted from the
/// response. Any failing read fails the whole request.
///
/// # Endpoint
///
/// `GET /api/v0/hwmon`
pub(crate) async fn get_sensor(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<SensorResponse>>, ApiError> {
    debug!("Request: GET /api/v0/hwmon");

    let mut response = SensorResponse {
        input: None,
        min: None,
        max: None,
    };

    let visibility = state.sensor.visibility();
    for attribute in SensorAttribute::ALL {
        if !visibility.is_visible(attribute) {
            continue;
        }
        let value = Some(state.sensor.read(attribute).await?);
        match attribute {
            SensorAttribute::Input => response.input = value,
            SensorAttribute::Min => response.min = value,
            SensorAttribute::Max => response.max = value,
        }
    }

    api_ok!(response)
}

/// Read a single sensor attribute.
///
/// # Endpoint
///
/// `GET /api/v0/hwmon/:attr`
///
/// # Path Parameters
///
/// - `attr` - `input`, `min` or `max` (`fan1_*` aliases accepted)
pub(crate) async fn get_attribute(
    State(state): State<AppState>,
    Path(attr): Path<String>,
) -> Result<Json<ApiResponse<SensorAttributeResponse>>, ApiError> {
    debug!("Request: GET /api/v0/hwmon/{}", attr);

    let attribute = match attr.parse::<SensorAttribute>() {
        Ok(attribute) => attribute,
        Err(e) => return api_fail!(e),
    };

    let value = state.sensor.read(attribute).await?;

    api_ok!(SensorAttributeResponse {
        attribute: attribute.to_string(),
        value,
    })
}
