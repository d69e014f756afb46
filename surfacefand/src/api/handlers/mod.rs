//! API request handlers for the surfacefand REST API.
//!
//! # Handler Modules
//!
//! - [`info`] - Service information and root endpoint
//! - [`hwmon`] - Sensor view (`input`, `min`, `max`)
//! - [`cooling`] - Cooling-device view (`max_state`, `cur_state`, set)
//!
//! All handlers accept `State<AppState>` and return
//! `Result<Json<ApiResponse<T>>, ApiError>`. Controller faults convert into
//! `ApiError` with `?`.

pub mod cooling;
pub mod hwmon;
pub mod info;
