//! Surface fan core library
//!
//! Shared types, capability profiles, faults, and configuration for the
//! Surface fan shim. This crate is used by both the hardware crate and the
//! daemon.

pub mod api;
pub mod config;
pub mod error;
pub mod profile;
pub mod types;

// Re-export commonly used types
pub use config::{
    default_config_path, DeviceConfig, ProbeConfig, ServerConfig, StaticConfig,
    DEFAULT_DEVICE_PATH,
};
pub use error::*;
pub use profile::{CapabilityProfile, EndpointId, HardwareVariant, VariantInfo};
pub use types::*;
