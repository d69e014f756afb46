//! Configuration types for the Surface fan shim
//!
//! The daemon reads a single [`StaticConfig`] TOML file at startup. It is
//! split into:
//! - [`ServerConfig`] - REST listener settings
//! - [`DeviceConfig`] - hardware variant and device node
//! - [`ProbeConfig`] - re-probe schedule for a deferred bind

mod paths;
mod static_config;

pub use paths::{default_config_path, DEFAULT_DEVICE_PATH};
pub use static_config::{DeviceConfig, ProbeConfig, ServerConfig, StaticConfig};
