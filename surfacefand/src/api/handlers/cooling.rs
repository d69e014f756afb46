//! Cooling-device handlers

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::{api_fail, api_ok};
use axum::{
    extract::{Query, State},
    Json,
};
use serde::Deserialize;
use surfacefan_core::api::{ApiResponse, CoolingResponse, SetStateResponse};
use surfacefan_core::ToSpeedValue;
use tracing::debug;

/// Query parameters for the set endpoint.
#[derive(Deserialize)]
pub(crate) struct SetStateQuery {
    /// Requested cooling state (raw rpm); saturates into 0..=65535
    pub value: Option<i64>,
}

/// Read the cooling-device states.
///
/// # Endpoint
///
/// `GET /api/v0/cooling`
pub(crate) async fn get_cooling(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<CoolingResponse>>, ApiError> {
    debug!("Request: GET /api/v0/cooling");

    let max_state = state.cooling.get_max_state().await?;
    let cur_state = state.cooling.get_cur_state().await?;

    api_ok!(CoolingResponse {
        max_state,
        cur_state,
    })
}

/// Request a cooling state.
///
/// Fails with 501 on read-only variants.
///
/// # Endpoint
///
/// `GET /api/v0/cooling/set`
///
/// # Query Parameters
///
/// - `value` - Requested state
pub(crate) async fn set_state(
    State(state): State<AppState>,
    Query(params): Query<SetStateQuery>,
) -> Result<Json<ApiResponse<SetStateResponse>>, ApiError> {
    debug!("Request: GET /api/v0/cooling/set");

    let Some(requested) = params.value else {
        return api_fail!("Missing 'value' parameter");
    };

    let applied = requested.to_speed_value();
    state.cooling.set_cur_state(u64::from(applied)).await?;

    debug!("Cooling state {} applied as setpoint {}", requested, applied);

    api_ok!(SetStateResponse { requested, applied })
}
