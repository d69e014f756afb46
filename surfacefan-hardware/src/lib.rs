//! surfacefan-hardware
//!
//! Fan control logic for the Surface fan: the speed channel, the
//! capability-aware controller with its bind state machine, and the sensor
//! and cooling views built on top of it.
//
//! Public API:
//! - `channel::Channel` / `channel::Transport`: request plumbing to the remote endpoint
//! - `fan_controller::FanController`: bind state machine and gated operations
//! - `sensor::SensorAdapter`, `cooling::CoolingAdapter`: presentation views
//! - `sim::SimulatedTransport`: in-memory fan for mock mode and tests
//! - `cdev::CdevTransport`: SAM character device transport (Linux only)

pub mod channel;
pub mod cooling;
pub mod fan_controller;
pub mod sensor;
pub mod sim;

#[cfg(target_os = "linux")]
pub mod cdev;

pub use channel::{Channel, Request, Transport};
pub use cooling::CoolingAdapter;
pub use fan_controller::{FanController, SharedController};
pub use sensor::{SensorAdapter, SensorAttribute, SensorVisibility};
pub use sim::SimulatedTransport;

#[cfg(target_os = "linux")]
pub use cdev::CdevTransport;
