//! API module for the surfacefand server
//!
//! Hosts the sensor and cooling adapters behind an Axum REST router.

pub(crate) mod handlers;

use axum::{
    http::{HeaderValue, Method},
    routing::get,
    Router,
};
use std::sync::Arc;
use std::time::Instant;
use surfacefan_core::VariantInfo;
use surfacefan_hardware::{CoolingAdapter, SensorAdapter, SharedController};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

/// Application state shared across all handlers
#[derive(Clone)]
pub(crate) struct AppState {
    /// The bound fan controller
    pub controller: SharedController,
    /// Sensor view of the controller
    pub sensor: SensorAdapter,
    /// Cooling-device view of the controller
    pub cooling: CoolingAdapter,
    /// Selected variant and its profile
    pub variant: Arc<VariantInfo>,
    /// Whether the controller runs on the simulated transport
    pub mock: bool,
    /// Server start time for uptime calculation
    pub start_time: Instant,
}

impl AppState {
    /// Create application state, attaching both adapters to `controller`
    pub async fn new(controller: SharedController, variant: VariantInfo, mock: bool) -> Self {
        let sensor = SensorAdapter::attach(&controller).await;
        let cooling = CoolingAdapter::attach(&controller);
        Self {
            controller,
            sensor,
            cooling,
            variant: Arc::new(variant),
            mock,
            start_time: Instant::now(),
        }
    }
}

/// Create the main API router with all endpoints
pub(crate) fn create_router(state: AppState) -> Router {
    info!("Setting up API router...");

    let cors = CorsLayer::new()
        .allow_origin(HeaderValue::from_static("*"))
        .allow_methods([Method::GET])
        .allow_headers(tower_http::cors::Any);

    let middleware_stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    Router::new()
        // Sensor endpoints
        .route("/api/v0/hwmon", get(handlers::hwmon::get_sensor))
        .route("/api/v0/hwmon/:attr", get(handlers::hwmon::get_attribute))
        // Cooling device endpoints
        .route("/api/v0/cooling", get(handlers::cooling::get_cooling))
        .route("/api/v0/cooling/set", get(handlers::cooling::set_state))
        // System info endpoint
        .route("/api/v0/info", get(handlers::info::get_info))
        // Root endpoint
        .route("/", get(handlers::info::root))
        .layer(middleware_stack)
        .with_state(state)
}

/// Error handling utilities
pub(crate) mod error {
    use axum::{
        http::StatusCode,
        response::{IntoResponse, Response},
        Json,
    };
    use surfacefan_core::api::ApiResponse;
    use surfacefan_core::Fault;

    use tracing::error;

    /// Custom error type for API responses
    #[derive(Debug)]
    pub struct ApiError {
        pub status_code: StatusCode,
        pub message: String,
    }

    impl ApiError {
        /// Create a new API error
        pub fn new(status_code: StatusCode, message: impl Into<String>) -> Self {
            Self {
                status_code,
                message: message.into(),
            }
        }

        /// Create a bad request error
        pub fn bad_request(message: impl Into<String>) -> Self {
            Self::new(StatusCode::BAD_REQUEST, message)
        }

        /// Create a not implemented error (operation unsupported by the hardware)
        pub fn not_implemented(message: impl Into<String>) -> Self {
            Self::new(StatusCode::NOT_IMPLEMENTED, message)
        }

        /// Create a service unavailable error (for hardware issues)
        pub fn service_unavailable(message: impl Into<String>) -> Self {
            Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
        }
    }

    impl IntoResponse for ApiError {
        fn into_response(self) -> Response {
            error!("API Error {}: {}", self.status_code, self.message);

            let response: ApiResponse<()> = ApiResponse::error(self.message);

            (self.status_code, Json(response)).into_response()
        }
    }

    /// Convert a controller fault to ApiError
    impl From<Fault> for ApiError {
        fn from(fault: Fault) -> Self {
            match fault {
                Fault::Unsupported(_) => Self::not_implemented(fault.to_string()),
                Fault::Transport(_) | Fault::Removed | Fault::NotReady(_) => {
                    Self::service_unavailable(fault.to_string())
                }
            }
        }
    }
}

/// Helper macros for common responses
#[macro_export]
macro_rules! api_ok {
    ($data:expr) => {
        Ok(axum::Json(surfacefan_core::api::ApiResponse::success($data)))
    };
}

#[macro_export]
macro_rules! api_fail {
    ($message:expr) => {
        Err($crate::api::error::ApiError::bad_request($message))
    };
}
