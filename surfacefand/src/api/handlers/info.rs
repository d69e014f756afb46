//! Info handlers for service information and root endpoint

use crate::api::error::ApiError;
use crate::api::AppState;
use crate::api_ok;

use axum::{extract::State, Json};
use serde_json::{json, Value};
use surfacefan_core::api::{ApiResponse, InfoResponse};
use tracing::debug;

/// Handle the root endpoint.
///
/// Provide basic service identification. Useful for health checks.
///
/// # Endpoint
///
/// `GET /`
pub(crate) async fn root() -> Result<Json<ApiResponse<Value>>, ApiError> {
    debug!("Request: GET /");

    let data = json!({
        "service": "Surface fan API Server",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "ok"
    });

    api_ok!(data)
}

/// Retrieve service and controller information.
///
/// # Endpoint
///
/// `GET /api/v0/info`
///
/// # Returns
///
/// - `version` - Server version
/// - `variant` - Selected hardware variant, endpoint and capability profile
/// - `bind_state` - Current controller state
/// - `mock` - Whether the simulated fan is in use
/// - `uptime` - Server uptime in seconds
pub(crate) async fn get_info(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<InfoResponse>>, ApiError> {
    debug!("Request: GET /api/v0/info");

    let bind_state = state.controller.read().await.state();

    let info_response = InfoResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        variant: (*state.variant).clone(),
        bind_state,
        mock: state.mock,
        uptime: state.start_time.elapsed().as_secs(),
    };

    api_ok!(info_response)
}

#[cfg(test)]
mod tests {
    use crate::api::test_support::{body_json, create_test_app};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use surfacefan_core::HardwareVariant;
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_root() {
        let (app, _sim) = create_test_app(HardwareVariant::AcpiCooling, 2000).await;

        let response = app
            .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        assert_eq!(json["status"], "success");
        assert_eq!(json["data"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_get_info() {
        let (app, _sim) = create_test_app(HardwareVariant::SsamHwmon, 2000).await;

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v0/info")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response.into_body()).await;
        let data = &json["data"];
        assert_eq!(data["variant"]["variant"], "ssam-hwmon");
        assert_eq!(data["variant"]["profile"]["min_speed"], 3000);
        assert_eq!(data["variant"]["profile"]["writable"], false);
        assert_eq!(data["bind_state"]["state"], "bound");
        assert_eq!(data["mock"], true);
    }
}
