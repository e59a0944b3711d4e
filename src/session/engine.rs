use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tracing::{debug, info};

use crate::events::{AppEvent, EventSender};
use crate::gesture::source::RandomGestureSource;
use crate::gesture::GestureLabel;
use crate::media::{MediaConstraints, MediaDevice, MediaError, MediaStream};
use crate::models::SessionSnapshot;
use crate::services::notifications::{BusNotifier, Notifier};

use super::controller::CallSession;
use super::{SessionCommand, SessionConfig};

/// Answer from the media device, routed back into the engine loop.
enum AcquireOutcome {
    Probe(Result<MediaStream, MediaError>),
    Start(Result<MediaStream, MediaError>),
}

/// Run the session engine event loop.
///
/// Owns the `CallSession`; commands, device answers and gesture ticks are
/// all handled on this one task, one at a time. Acquisition runs in a
/// spawned task so the loop keeps serving commands while the device
/// decides. The loop exits on `Shutdown` or when every handle is dropped,
/// tearing the session down on the way out.
pub async fn run_session_engine(
    mut cmd_rx: mpsc::Receiver<SessionCommand>,
    device: Arc<dyn MediaDevice>,
    event_tx: EventSender,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    config: SessionConfig,
) {
    info!(
        "Session engine started (gesture interval {:?}, simulated gestures: {})",
        config.gesture_interval, config.simulate_gestures
    );

    let notifier: Arc<dyn Notifier> = Arc::new(BusNotifier::new(event_tx.clone()));
    let source = Box::new(RandomGestureSource::new(config.seed));
    let mut session = CallSession::new(config, notifier, source);

    let (outcome_tx, mut outcome_rx) = mpsc::channel::<AcquireOutcome>(4);

    // Permission probe, once at startup.
    if let Some(constraints) = session.begin_probe() {
        spawn_acquire(&device, constraints, &outcome_tx, AcquireOutcome::Probe);
    }
    publish(&session, &snapshot_tx, &event_tx);

    loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                let Some(cmd) = cmd else {
                    debug!("All session handles dropped");
                    break;
                };
                match cmd {
                    SessionCommand::StartCall => {
                        if let Some(constraints) = session.begin_start() {
                            info!("Starting call");
                            spawn_acquire(&device, constraints, &outcome_tx, AcquireOutcome::Start);
                        }
                    }
                    SessionCommand::EndCall => {
                        session.end_call();
                    }
                    SessionCommand::ToggleAudio => {
                        session.toggle_audio();
                    }
                    SessionCommand::ToggleVideo => {
                        session.toggle_video();
                    }
                    SessionCommand::RetryPermission => {
                        if let Some(constraints) = session.begin_probe() {
                            info!("Retrying camera permission");
                            spawn_acquire(&device, constraints, &outcome_tx, AcquireOutcome::Probe);
                        }
                    }
                    SessionCommand::ReportGesture(label) => {
                        if session.report_gesture(label) {
                            emit_gesture(&event_tx, label);
                        }
                    }
                    SessionCommand::Shutdown => {
                        info!("Session shutdown requested");
                        break;
                    }
                }
            }

            Some(outcome) = outcome_rx.recv() => {
                match outcome {
                    AcquireOutcome::Probe(result) => session.finish_probe(result),
                    AcquireOutcome::Start(result) => session.finish_start(result),
                }
            }

            _ = session.next_tick() => {
                if let Some(label) = session.on_tick() {
                    emit_gesture(&event_tx, label);
                }
            }
        }

        publish(&session, &snapshot_tx, &event_tx);
    }

    session.teardown();
    publish(&session, &snapshot_tx, &event_tx);
    info!("Session engine stopped");
}

fn spawn_acquire(
    device: &Arc<dyn MediaDevice>,
    constraints: MediaConstraints,
    outcome_tx: &mpsc::Sender<AcquireOutcome>,
    wrap: fn(Result<MediaStream, MediaError>) -> AcquireOutcome,
) {
    let device = device.clone();
    let outcome_tx = outcome_tx.clone();
    tokio::spawn(async move {
        let result = device.acquire(constraints).await;
        // If the engine is gone the outcome is dropped here, stream included.
        let _ = outcome_tx.send(wrap(result)).await;
    });
}

fn emit_gesture(event_tx: &EventSender, label: GestureLabel) {
    let _ = event_tx.send(AppEvent::GestureDetected {
        label,
        translation: label.translation(),
    });
}

/// Push the snapshot to watchers, and onto the event bus when it changed.
fn publish(
    session: &CallSession,
    snapshot_tx: &watch::Sender<SessionSnapshot>,
    event_tx: &EventSender,
) {
    let snapshot = session.snapshot();
    let changed = snapshot_tx.send_if_modified(|current| {
        if *current == snapshot {
            false
        } else {
            *current = snapshot.clone();
            true
        }
    });
    if changed {
        let _ = event_tx.send(AppEvent::SessionChanged(snapshot));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::create_event_bus;
    use crate::media::device::{DeviceBehavior, SimulatedDevice};
    use crate::models::PermissionState;
    use crate::session::SessionHandle;
    use std::time::Duration;
    use tokio::task::JoinHandle;

    struct Harness {
        handle: SessionHandle,
        device: Arc<SimulatedDevice>,
        snapshot_rx: watch::Receiver<SessionSnapshot>,
        event_tx: EventSender,
        engine: JoinHandle<()>,
    }

    fn spawn_engine(device: SimulatedDevice) -> Harness {
        let device = Arc::new(device);
        let (command_tx, command_rx) = mpsc::channel(16);
        let (event_tx, _) = create_event_bus();
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        let config = SessionConfig {
            seed: Some(3),
            ..SessionConfig::default()
        };
        let engine = tokio::spawn(run_session_engine(
            command_rx,
            device.clone(),
            event_tx.clone(),
            snapshot_tx,
            config,
        ));
        Harness {
            handle: SessionHandle::new(command_tx),
            device,
            snapshot_rx,
            event_tx,
            engine,
        }
    }

    async fn wait_for(
        rx: &mut watch::Receiver<SessionSnapshot>,
        f: impl FnMut(&SessionSnapshot) -> bool,
    ) -> SessionSnapshot {
        let snapshot = tokio::time::timeout(Duration::from_secs(30), rx.wait_for(f))
            .await
            .expect("timed out waiting for session state")
            .expect("engine dropped snapshot sender")
            .clone();
        snapshot
    }

    #[tokio::test(start_paused = true)]
    async fn test_probe_then_call_lifecycle() {
        let mut h = spawn_engine(SimulatedDevice::new(DeviceBehavior::Allow));
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Granted).await;

        h.handle.start_call().await.unwrap();
        let active = wait_for(&mut h.snapshot_rx, |s| s.call_active).await;
        assert!(active.video_enabled);
        assert_eq!(h.device.live_streams(), 1);

        let with_gesture = wait_for(&mut h.snapshot_rx, |s| s.current_gesture.is_some()).await;
        assert!(GestureLabel::ALL.contains(&with_gesture.current_gesture.unwrap()));

        h.handle.end_call().await.unwrap();
        let ended = wait_for(&mut h.snapshot_rx, |s| !s.call_active).await;
        assert!(ended.current_gesture.is_none());
        assert_eq!(h.device.live_streams(), 0);

        // No ticks land after the call ended.
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert!(h.snapshot_rx.borrow().current_gesture.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_denied_probe_ignores_start() {
        let mut h = spawn_engine(SimulatedDevice::new(DeviceBehavior::Deny));
        let mut events = h.event_tx.subscribe();
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Denied).await;

        h.handle.start_call().await.unwrap();
        tokio::time::sleep(Duration::from_secs(1)).await;

        let snapshot = h.snapshot_rx.borrow().clone();
        assert!(!snapshot.call_active);
        assert_eq!(snapshot.permission_state, PermissionState::Denied);
        assert_eq!(h.device.issued_streams(), 0);

        let mut saw_notification = false;
        while let Ok(event) = events.try_recv() {
            if let AppEvent::Notification { title, .. } = event {
                assert_eq!(title, "Camera access required");
                saw_notification = true;
            }
        }
        assert!(saw_notification);
    }

    #[tokio::test(start_paused = true)]
    async fn test_duplicate_start_while_pending() {
        let device = SimulatedDevice::new(DeviceBehavior::Allow)
            .with_latency(Duration::from_millis(200));
        let mut h = spawn_engine(device);
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Granted).await;

        h.handle.start_call().await.unwrap();
        h.handle.start_call().await.unwrap();
        h.handle.start_call().await.unwrap();
        wait_for(&mut h.snapshot_rx, |s| s.call_active).await;
        tokio::time::sleep(Duration::from_secs(1)).await;

        // One probe stream plus one call stream.
        assert_eq!(h.device.issued_streams(), 2);
        assert_eq!(h.device.live_streams(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_gesture_events_carry_translation() {
        let mut h = spawn_engine(SimulatedDevice::new(DeviceBehavior::Allow));
        let mut events = h.event_tx.subscribe();
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Granted).await;
        h.handle.start_call().await.unwrap();
        wait_for(&mut h.snapshot_rx, |s| s.call_active).await;

        h.handle.report_gesture(GestureLabel::OpenPalm).await.unwrap();
        loop {
            match events.recv().await.unwrap() {
                AppEvent::GestureDetected { label, translation } => {
                    assert_eq!(translation, label.translation());
                    break;
                }
                _ => continue,
            }
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_tears_down_active_call() {
        let mut h = spawn_engine(SimulatedDevice::new(DeviceBehavior::Allow));
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Granted).await;
        h.handle.start_call().await.unwrap();
        wait_for(&mut h.snapshot_rx, |s| s.call_active).await;

        h.handle.shutdown().await.unwrap();
        h.engine.await.unwrap();

        assert_eq!(h.device.live_streams(), 0);
        assert!(!h.snapshot_rx.borrow().call_active);
        assert!(h.handle.start_call().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_retry_permission_recovers() {
        let mut h = spawn_engine(SimulatedDevice::new(DeviceBehavior::Deny));
        wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Denied).await;

        h.device.set_behavior(DeviceBehavior::Allow);
        h.handle.retry_permission().await.unwrap();
        let granted = wait_for(&mut h.snapshot_rx, |s| s.permission_state == PermissionState::Granted).await;
        assert!(granted.can_start());
    }
}
