//! Simulated fan
//!
//! An in-memory transport answering the two fan commands. Used by the daemon
//! in `--mock` mode and by tests. Clones share state, so a test can keep a
//! handle while the controller owns the transport.

use crate::channel::{Request, Transport};
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard};
use surfacefan_core::profile::{COMMAND_GET_SPEED, COMMAND_SET_SPEED};
use surfacefan_core::{speed_from_wire, speed_to_wire, SpeedValue, TransportError};

#[derive(Debug)]
struct SimState {
    rpm: SpeedValue,
    setpoint: Option<SpeedValue>,
    deferred_requests: u32,
    failure: Option<TransportError>,
    requests: u32,
}

/// In-memory fan answering speed requests
#[derive(Debug, Clone)]
pub struct SimulatedTransport {
    state: Arc<Mutex<SimState>>,
}

impl SimulatedTransport {
    /// Simulated fan spinning at `rpm`
    pub fn new(rpm: SpeedValue) -> Self {
        Self {
            state: Arc::new(Mutex::new(SimState {
                rpm,
                setpoint: None,
                deferred_requests: 0,
                failure: None,
                requests: 0,
            })),
        }
    }

    /// Answer the first `count` requests with "not yet enumerated"
    pub fn with_deferred_requests(self, count: u32) -> Self {
        self.lock().deferred_requests = count;
        self
    }

    /// Fail every request with `error` until cleared
    pub fn fail_with(&self, error: Option<TransportError>) {
        self.lock().failure = error;
    }

    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Change the reported speed
    pub fn set_rpm(&self, rpm: SpeedValue) {
        self.lock().rpm = rpm;
    }

    /// Reported speed
    pub fn rpm(&self) -> SpeedValue {
        self.lock().rpm
    }

    /// Last setpoint written, if any
    pub fn setpoint(&self) -> Option<SpeedValue> {
        self.lock().setpoint
    }

    /// Number of requests received, including failed ones
    pub fn request_count(&self) -> u32 {
        self.lock().requests
    }
}

#[async_trait]
impl Transport for SimulatedTransport {
    async fn request(&mut self, request: &Request) -> Result<Vec<u8>, TransportError> {
        let mut state = self.lock();
        state.requests += 1;

        if state.deferred_requests > 0 {
            state.deferred_requests -= 1;
            return Err(TransportError::NotYetEnumerated(
                "simulated controller not ready".to_string(),
            ));
        }

        if let Some(error) = &state.failure {
            return Err(error.clone());
        }

        match request.command_id {
            COMMAND_GET_SPEED => Ok(speed_to_wire(state.rpm).to_vec()),
            COMMAND_SET_SPEED => {
                let value = speed_from_wire(&request.payload).ok_or_else(|| {
                    TransportError::Protocol(format!(
                        "bad setpoint payload length {}",
                        request.payload.len()
                    ))
                })?;
                // The simulated fan reaches its setpoint immediately
                state.setpoint = Some(value);
                state.rpm = value;
                Ok(Vec::new())
            }
            other => Err(TransportError::Protocol(format!(
                "unknown command 0x{:02x}",
                other
            ))),
        }
    }

    fn describe(&self) -> String {
        "simulated".to_string()
    }
}
