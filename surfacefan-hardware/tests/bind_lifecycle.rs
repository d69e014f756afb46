//! Integration tests for the fan controller lifecycle
//!
//! Drive the public controller and adapter API through a recording transport
//! and the simulated fan, without hardware.

use anyhow::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use surfacefan_core::{
    BindFailure, BindState, CapabilityProfile, EndpointId, Fault, HardwareVariant,
    TransportError,
};
use surfacefan_hardware::{
    CoolingAdapter, FanController, Request, SensorAdapter, SimulatedTransport, Transport,
};

/// Transport answering every request the same way and recording payloads
#[derive(Clone)]
struct Recorder {
    answer: std::result::Result<Vec<u8>, TransportError>,
    sent: Arc<Mutex<Vec<Request>>>,
}

impl Recorder {
    fn answering(answer: std::result::Result<Vec<u8>, TransportError>) -> Self {
        Self {
            answer,
            sent: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn calls(&self) -> usize {
        self.sent.lock().unwrap().len()
    }

    fn last_payload(&self) -> Option<Vec<u8>> {
        self.sent.lock().unwrap().last().map(|r| r.payload.clone())
    }
}

#[async_trait]
impl Transport for Recorder {
    async fn request(
        &mut self,
        request: &Request,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        self.sent.lock().unwrap().push(request.clone());
        if request.expects_response {
            self.answer.clone()
        } else {
            self.answer.clone().map(|_| Vec::new())
        }
    }

    fn describe(&self) -> String {
        "recorder".to_string()
    }
}

fn profile(writable: bool) -> CapabilityProfile {
    CapabilityProfile {
        min_speed: 2000,
        max_speed: 8000,
        writable,
        presence_probe_required: true,
    }
}

fn controller(recorder: &Recorder, profile: CapabilityProfile) -> FanController<Recorder> {
    FanController::new(
        Box::new(recorder.clone()),
        EndpointId::SURFACE_FAN,
        profile,
    )
}

#[tokio::test]
async fn test_probe_success_binds() -> Result<()> {
    let recorder = Recorder::answering(Ok(vec![0x94, 0x11]));
    let mut fan = controller(&recorder, profile(true));

    assert_eq!(fan.bind().await, BindState::Bound);
    assert_eq!(fan.read_min()?, 2000);
    assert_eq!(fan.read_max()?, 8000);
    assert_eq!(fan.read_rpm().await?, 4500);
    Ok(())
}

#[tokio::test]
async fn test_read_only_fan_rejects_writes_but_reads() -> Result<()> {
    let recorder = Recorder::answering(Ok(vec![0x10, 0x27]));
    let mut fan = controller(&recorder, profile(false));
    fan.bind().await;
    let calls_after_bind = recorder.calls();

    assert!(matches!(
        fan.write_target(1000u32).await,
        Err(Fault::Unsupported(_))
    ));
    assert_eq!(recorder.calls(), calls_after_bind);

    assert_eq!(fan.read_rpm().await?, 10000);
    Ok(())
}

#[tokio::test]
async fn test_oversized_write_saturates() -> Result<()> {
    let recorder = Recorder::answering(Ok(vec![0x00, 0x00]));
    let mut fan = controller(&recorder, profile(true));
    fan.bind().await;

    fan.write_target(70000u32).await?;
    assert_eq!(recorder.last_payload(), Some(vec![0xFF, 0xFF]));

    fan.write_target(-5i32).await?;
    assert_eq!(recorder.last_payload(), Some(vec![0x00, 0x00]));

    fan.write_target(1234u16).await?;
    assert_eq!(recorder.last_payload(), Some(vec![0xD2, 0x04]));
    Ok(())
}

#[tokio::test]
async fn test_read_target_never_touches_transport() {
    for writable in [true, false] {
        let recorder = Recorder::answering(Ok(vec![0x00, 0x00]));
        let mut fan = controller(&recorder, profile(writable));
        fan.bind().await;
        let calls = recorder.calls();

        assert!(matches!(fan.read_target(), Err(Fault::Unsupported(_))));
        assert_eq!(recorder.calls(), calls);
    }
}

#[tokio::test]
async fn test_not_yet_enumerated_defers() {
    let recorder = Recorder::answering(Err(TransportError::NotYetEnumerated(
        "aggregator".into(),
    )));
    let mut fan = controller(&recorder, profile(true));

    assert_eq!(fan.bind().await, BindState::Deferred);
    assert_eq!(fan.read_rpm().await, Err(Fault::NotReady(BindState::Deferred)));
}

#[tokio::test]
async fn test_generic_failure_is_absent() {
    let recorder = Recorder::answering(Err(TransportError::Timeout("probe".into())));
    let mut fan = controller(&recorder, profile(true));

    assert_eq!(
        fan.bind().await,
        BindState::Failed(BindFailure::Absent)
    );

    // Absent is final: binding again does not probe
    let calls = recorder.calls();
    assert_eq!(
        fan.bind().await,
        BindState::Failed(BindFailure::Absent)
    );
    assert_eq!(recorder.calls(), calls);
}

#[tokio::test]
async fn test_deferred_then_bound_on_rebind() -> Result<()> {
    let sim = SimulatedTransport::new(3300).with_deferred_requests(2);
    let mut fan = FanController::new(
        Box::new(sim.clone()),
        EndpointId::SURFACE_FAN,
        HardwareVariant::AcpiCooling.profile().unwrap(),
    );

    assert_eq!(fan.bind().await, BindState::Deferred);
    assert_eq!(fan.bind().await, BindState::Deferred);
    assert_eq!(fan.bind().await, BindState::Bound);
    assert_eq!(fan.read_rpm().await?, 3300);
    assert_eq!(sim.request_count(), 4);
    Ok(())
}

#[tokio::test]
async fn test_removed_is_silent() {
    let recorder = Recorder::answering(Ok(vec![0x00, 0x10]));
    let mut fan = controller(&recorder, profile(true));
    fan.bind().await;
    fan.remove();
    let calls = recorder.calls();

    assert_eq!(fan.read_rpm().await, Err(Fault::Removed));
    assert_eq!(fan.write_target(3000u16).await, Err(Fault::Removed));
    assert_eq!(fan.read_min(), Err(Fault::Removed));
    assert_eq!(fan.read_max(), Err(Fault::Removed));
    assert_eq!(fan.read_target(), Err(Fault::Removed));
    assert_eq!(fan.bind().await, BindState::Removed);
    assert_eq!(recorder.calls(), calls);
}

#[tokio::test]
async fn test_adapters_over_simulated_fan() -> Result<()> {
    let sim = SimulatedTransport::new(2400);
    let mut fan = FanController::new(
        Box::new(sim.clone()),
        EndpointId::SURFACE_FAN,
        HardwareVariant::AcpiCooling.profile().unwrap(),
    );
    fan.bind().await;
    let fan = fan.into_shared();

    let sensor = SensorAdapter::attach(&fan).await;
    let cooling = CoolingAdapter::attach(&fan);

    assert_eq!(sensor.input().await?, 2400);
    assert_eq!(cooling.get_max_state().await?, 7200);

    cooling.set_cur_state(6000).await?;
    assert_eq!(sim.setpoint(), Some(6000));
    assert_eq!(sensor.input().await?, 6000);
    assert_eq!(cooling.get_cur_state().await?, 6000);

    fan.write().await.remove();
    assert_eq!(sensor.input().await, Err(Fault::Removed));
    assert_eq!(cooling.set_cur_state(1).await, Err(Fault::Removed));
    Ok(())
}

#[tokio::test]
async fn test_concurrent_writes_all_reach_fan() -> Result<()> {
    let sim = SimulatedTransport::new(1000);
    let mut fan = FanController::new(
        Box::new(sim.clone()),
        EndpointId::SURFACE_FAN,
        HardwareVariant::AcpiCooling.profile().unwrap(),
    );
    fan.bind().await;
    let fan = fan.into_shared();
    let cooling = CoolingAdapter::attach(&fan);

    let mut tasks = Vec::new();
    for i in 0..16u64 {
        let cooling = cooling.clone();
        tasks.push(tokio::spawn(async move {
            cooling.set_cur_state(2000 + i).await
        }));
    }
    for task in tasks {
        task.await??;
    }

    // One probe plus one transaction per write
    assert_eq!(sim.request_count(), 17);
    let setpoint = sim.setpoint().unwrap();
    assert!((2000..2016).contains(&setpoint));
    Ok(())
}

/// Transport that holds every request open for a while and counts how many
/// requests were ever inside it at the same time
#[derive(Clone, Default)]
struct SlowFan {
    active: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl Transport for SlowFan {
    async fn request(
        &mut self,
        request: &Request,
    ) -> std::result::Result<Vec<u8>, TransportError> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(2)).await;
        self.active.fetch_sub(1, Ordering::SeqCst);
        self.calls.fetch_add(1, Ordering::SeqCst);

        if request.expects_response {
            Ok(vec![0xB8, 0x0B])
        } else {
            Ok(Vec::new())
        }
    }

    fn describe(&self) -> String {
        "slow".to_string()
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_callers_never_overlap_on_the_wire() -> Result<()> {
    let slow = SlowFan::default();
    let mut fan = FanController::new(
        Box::new(slow.clone()),
        EndpointId::SURFACE_FAN,
        HardwareVariant::AcpiCooling.profile().unwrap(),
    );
    fan.bind().await;
    let fan = fan.into_shared();
    let sensor = SensorAdapter::attach(&fan).await;
    let cooling = CoolingAdapter::attach(&fan);

    let mut tasks = Vec::new();
    for i in 0..12u64 {
        let sensor = sensor.clone();
        let cooling = cooling.clone();
        tasks.push(tokio::spawn(async move {
            if i % 3 == 0 {
                sensor.input().await.map(|_| ())
            } else {
                cooling.set_cur_state(2000 + i).await
            }
        }));
    }
    for task in tasks {
        task.await??;
    }

    // One bind read plus one transaction per caller
    assert_eq!(slow.calls.load(Ordering::SeqCst), 13);
    assert_eq!(slow.peak.load(Ordering::SeqCst), 1);
    Ok(())
}
