//! Fan Controller - capability-aware control surface for one fan
//!
//! Gates every operation through the [`CapabilityProfile`] of the bound
//! hardware variant and owns the initialization state machine:
//!
//! ```text
//! Unbound ──bind──► Probing ──ok──────────────► Bound ──remove──► Removed
//!    │                 ├──not yet enumerated──► Deferred (bind again later)
//!    │                 └──other failure───────► Failed(Absent)
//!    └──bind (no presence probe)──────────────► Bound
//! ```
//!
//! Faults are returned to the caller as-is; nothing here retries, sleeps, or
//! logs above `debug`.

use crate::channel::{Channel, Transport};
use std::sync::Arc;
use surfacefan_core::{
    BindFailure, BindState, CapabilityProfile, EndpointId, Fault, Reading, Result, SpeedValue,
    ToSpeedValue,
};
use tokio::sync::RwLock;
use tracing::debug;

/// Controller shared between its owner and the presentation adapters
pub type SharedController<T = dyn Transport> = Arc<RwLock<FanController<T>>>;

/// Fan controller interface
///
/// Generic over the transport type, allowing the character device, the
/// simulated fan, or mock transports for testing.
pub struct FanController<T: Transport + ?Sized = dyn Transport> {
    channel: Channel<T>,
    profile: CapabilityProfile,
    state: BindState,
}

impl<T: Transport + ?Sized> FanController<T> {
    /// Create an unbound controller talking to `endpoint` through `transport`
    ///
    /// The channel's writability is taken from the profile.
    pub fn new(transport: Box<T>, endpoint: EndpointId, profile: CapabilityProfile) -> Self {
        Self {
            channel: Channel::new(transport, endpoint, profile.writable),
            profile,
            state: BindState::Unbound,
        }
    }

    /// Wrap the controller for sharing with presentation adapters
    pub fn into_shared(self) -> SharedController<T> {
        Arc::new(RwLock::new(self))
    }

    /// Current initialization state
    pub fn state(&self) -> BindState {
        self.state
    }

    /// Capability profile of the bound variant
    pub fn profile(&self) -> &CapabilityProfile {
        &self.profile
    }

    /// Endpoint addressed by this controller
    pub fn endpoint(&self) -> EndpointId {
        self.channel.endpoint()
    }

    fn transition(&mut self, next: BindState) {
        debug!(
            "Fan controller {}: {} -> {}",
            self.channel.endpoint(),
            self.state,
            next
        );
        self.state = next;
    }

    /// Run one bind attempt
    ///
    /// From `Unbound`, `Deferred` or an interrupted `Probing`: variants
    /// without a presence probe become `Bound` directly; otherwise one speed
    /// read decides between `Bound`, `Deferred` (remote controller not yet
    /// enumerated) and `Failed(Absent)`. `Bound` and terminal states are
    /// returned unchanged.
    ///
    /// A `Deferred` result is final for this attempt: the caller decides when
    /// to invoke `bind` again.
    pub async fn bind(&mut self) -> BindState {
        // Probing only survives here if an earlier bind future was dropped
        if self.state == BindState::Bound || self.state.is_terminal() {
            return self.state;
        }

        if !self.profile.presence_probe_required {
            self.transition(BindState::Bound);
            return self.state;
        }

        self.transition(BindState::Probing);

        let next = match self.channel.get_speed().await {
            Ok(rpm) => {
                debug!("Presence probe read {} rpm", rpm);
                BindState::Bound
            }
            Err(e) if e.is_not_yet_enumerated() => {
                debug!("Presence probe deferred: {}", e);
                BindState::Deferred
            }
            Err(e) => {
                debug!("Presence probe failed: {}", e);
                BindState::Failed(BindFailure::Absent)
            }
        };

        self.transition(next);
        self.state
    }

    /// Tear the controller down
    ///
    /// Every later call fails with `Fault::Removed` without touching the
    /// transport.
    pub fn remove(&mut self) {
        if self.state != BindState::Removed {
            self.transition(BindState::Removed);
        }
    }

    fn ensure_bound(&self) -> Result<()> {
        match self.state {
            BindState::Bound => Ok(()),
            BindState::Removed => Err(Fault::Removed),
            other => Err(Fault::NotReady(other)),
        }
    }

    /// Read the live fan speed
    ///
    /// The device is trusted to report any value; no clamping is applied.
    pub async fn read_rpm(&self) -> Result<SpeedValue> {
        self.ensure_bound()?;
        self.channel.get_speed().await
    }

    /// Take a live reading
    pub async fn read(&self) -> Result<Reading> {
        Ok(Reading {
            rpm: self.read_rpm().await?,
        })
    }

    /// Advisory minimum speed of the profile
    pub fn read_min(&self) -> Result<SpeedValue> {
        self.ensure_bound()?;
        Ok(self.profile.min_speed)
    }

    /// Advisory maximum speed of the profile
    pub fn read_max(&self) -> Result<SpeedValue> {
        self.ensure_bound()?;
        Ok(self.profile.max_speed)
    }

    /// Write a speed setpoint
    ///
    /// Wider values saturate into `[0, 65535]`. The profile bounds are not
    /// enforced: the remote controller applies its own spin-up minimum.
    /// Firmware may override the setpoint under thermal load, so a write is
    /// not durable.
    pub async fn write_target<V: ToSpeedValue>(&self, requested: V) -> Result<()> {
        self.ensure_bound()?;

        if !self.channel.is_writable() {
            return Err(Fault::Unsupported("write_target on a read-only fan"));
        }

        self.channel.set_speed(requested.to_speed_value()).await
    }

    /// Read back the last setpoint
    ///
    /// No variant can report the commanded setpoint, so this always fails
    /// with `Fault::Unsupported` (or `Fault::Removed` after teardown).
    pub fn read_target(&self) -> Result<SpeedValue> {
        if self.state == BindState::Removed {
            return Err(Fault::Removed);
        }
        Err(Fault::Unsupported("read_target"))
    }
}
