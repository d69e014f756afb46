//! Bind orchestration with re-probe backoff
//!
//! The controller reports `Deferred` when the remote controller is not yet
//! enumerated and leaves rescheduling to its host. The [`Binder`] is that
//! host: it opens the transport, runs the bind attempt, and on deferral waits
//! with exponential backoff before trying again.

use std::time::Duration;

use surfacefan_core::{
    BindState, CapabilityProfile, EndpointId, ProbeConfig, TransportError,
};
use surfacefan_hardware::{FanController, Transport};
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, error, info, warn};

/// Floor for the re-probe delay
const MIN_RETRY_DELAY: Duration = Duration::from_millis(1);

/// Reasons the daemon could not bind the fan
#[derive(Error, Debug)]
pub(crate) enum BindError {
    /// The presence probe failed: no fan behind the endpoint
    #[error("Fan not present (probe failed after {attempts} attempt(s))")]
    Absent { attempts: u32 },

    /// Still deferred when the attempt budget ran out
    #[error("Fan still not enumerated after {attempts} attempt(s), giving up")]
    GaveUp { attempts: u32 },

    /// The transport could not be opened for a reason other than enumeration
    #[error("Failed to open transport: {0}")]
    Open(TransportError),

    /// The controller ended a bind attempt in a state bind never produces
    #[error("Unexpected bind state: {0}")]
    Unexpected(BindState),
}

/// Drives a fan controller to `Bound`
pub(crate) struct Binder {
    endpoint: EndpointId,
    profile: CapabilityProfile,
    config: ProbeConfig,
}

impl Binder {
    /// Create a binder for `endpoint` with the selected `profile`
    pub fn new(endpoint: EndpointId, profile: CapabilityProfile, config: ProbeConfig) -> Self {
        Self {
            endpoint,
            profile,
            config,
        }
    }

    /// Bind the fan, re-probing on deferral
    ///
    /// `open` is called whenever no controller exists yet. An open failure
    /// flagged "not yet enumerated" counts as a deferred attempt; any other
    /// open failure stops immediately.
    pub async fn bind<F>(&self, mut open: F) -> Result<FanController, BindError>
    where
        F: FnMut() -> Result<Box<dyn Transport>, TransportError>,
    {
        let mut controller: Option<FanController> = None;
        let mut attempt = 0u32;
        let mut delay = Duration::from_millis(self.config.initial_delay_ms)
            .clamp(MIN_RETRY_DELAY, self.max_delay());

        loop {
            attempt += 1;

            info!(
                "Bind attempt {}/{} for {}",
                attempt,
                if self.config.max_attempts == 0 {
                    "unlimited".to_string()
                } else {
                    self.config.max_attempts.to_string()
                },
                self.endpoint
            );

            if controller.is_none() {
                match open() {
                    Ok(transport) => {
                        debug!("Opened transport {}", transport.describe());
                        controller =
                            Some(FanController::new(transport, self.endpoint, self.profile));
                    }
                    Err(e) if e.is_not_yet_enumerated() => {
                        debug!("Transport not available yet: {}", e);
                    }
                    Err(e) => {
                        error!("Failed to open transport: {}", e);
                        return Err(BindError::Open(e));
                    }
                }
            }

            if let Some(mut fan) = controller.take() {
                match fan.bind().await {
                    BindState::Bound => {
                        info!("Fan bound after {} attempt(s)", attempt);
                        return Ok(fan);
                    }
                    BindState::Deferred => {
                        debug!("Bind deferred, keeping controller for re-probe");
                        controller = Some(fan);
                    }
                    BindState::Failed(reason) => {
                        error!("Fan bind failed: {:?}", reason);
                        return Err(BindError::Absent { attempts: attempt });
                    }
                    other => return Err(BindError::Unexpected(other)),
                }
            }

            if self.config.max_attempts > 0 && attempt >= self.config.max_attempts {
                warn!("Fan still deferred after {} attempts, giving up", attempt);
                return Err(BindError::GaveUp { attempts: attempt });
            }

            sleep(delay).await;
            delay = self.next_delay(delay);
        }
    }

    fn max_delay(&self) -> Duration {
        Duration::from_millis(self.config.max_delay_ms).max(MIN_RETRY_DELAY)
    }

    /// Grow `delay` by the backoff multiplier, kept within `[1 ms, max_delay]`
    fn next_delay(&self, delay: Duration) -> Duration {
        let max_delay = self.max_delay();
        Duration::try_from_secs_f64(delay.as_secs_f64() * self.config.backoff_multiplier)
            .unwrap_or(max_delay)
            .clamp(MIN_RETRY_DELAY, max_delay)
    }
}
