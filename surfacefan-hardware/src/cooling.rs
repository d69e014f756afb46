//! Cooling-device view of a fan controller
//!
//! Mirrors a thermal cooling device. States are raw rpm values: the maximum
//! state is the profile maximum and the current state is the live fan speed.
//!
//! Writing a state on a read-only variant fails with `Fault::Unsupported`,
//! the same contract as [`FanController::write_target`].

use crate::channel::Transport;
use crate::fan_controller::{FanController, SharedController};
use std::sync::{Arc, Weak};
use surfacefan_core::{Fault, Result};
use tokio::sync::RwLock;

/// Cooling-control adapter
pub struct CoolingAdapter<T: Transport + ?Sized = dyn Transport> {
    controller: Weak<RwLock<FanController<T>>>,
}

impl<T: Transport + ?Sized> Clone for CoolingAdapter<T> {
    fn clone(&self) -> Self {
        Self {
            controller: self.controller.clone(),
        }
    }
}

impl<T: Transport + ?Sized> CoolingAdapter<T> {
    /// Attach a cooling view to `controller`
    pub fn attach(controller: &SharedController<T>) -> Self {
        Self {
            controller: Arc::downgrade(controller),
        }
    }

    fn controller(&self) -> Result<SharedController<T>> {
        self.controller.upgrade().ok_or(Fault::Removed)
    }

    /// Highest cooling state
    pub async fn get_max_state(&self) -> Result<u64> {
        let controller = self.controller()?;
        let max = controller.read().await.read_max()?;
        Ok(u64::from(max))
    }

    /// Current cooling state (live rpm)
    pub async fn get_cur_state(&self) -> Result<u64> {
        let controller = self.controller()?;
        let rpm = controller.read().await.read_rpm().await?;
        Ok(u64::from(rpm))
    }

    /// Request a cooling state
    ///
    /// The state saturates into the 16-bit setpoint range. Firmware may
    /// override it under thermal load, in which case the write appears to
    /// have no effect.
    pub async fn set_cur_state(&self, state: u64) -> Result<()> {
        let controller = self.controller()?;
        let controller = controller.read().await;
        controller.write_target(state).await
    }
}
