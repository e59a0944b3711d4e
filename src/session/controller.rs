use std::sync::Arc;
use tokio::time::{self, Instant, Interval, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::gesture::source::GestureSource;
use crate::gesture::GestureLabel;
use crate::media::{MediaConstraints, MediaError, MediaStream};
use crate::models::{PermissionState, SessionSnapshot, Severity};
use crate::services::notifications::Notifier;

use super::SessionConfig;

/// The call session state machine.
///
/// Permission state and call state are tracked separately. Media
/// acquisition is split into `begin_*` (decides whether a request may go
/// out and marks it pending) and `finish_*` (applies the device's answer),
/// so the caller controls where the await happens.
///
/// Owns the media stream and the gesture timer. Both are released on
/// `end_call`, `teardown`, or drop.
pub struct CallSession {
    config: SessionConfig,
    notifier: Arc<dyn Notifier>,
    source: Box<dyn GestureSource>,

    permission: PermissionState,
    call_active: bool,
    video_enabled: bool,
    audio_enabled: bool,
    current_gesture: Option<GestureLabel>,

    stream: Option<MediaStream>,
    gesture_timer: Option<Interval>,
    probe_pending: bool,
    start_pending: bool,
}

impl CallSession {
    pub fn new(
        config: SessionConfig,
        notifier: Arc<dyn Notifier>,
        source: Box<dyn GestureSource>,
    ) -> Self {
        let audio_enabled = config.initial_audio_enabled;
        Self {
            config,
            notifier,
            source,
            permission: PermissionState::Unknown,
            call_active: false,
            video_enabled: false,
            audio_enabled,
            current_gesture: None,
            stream: None,
            gesture_timer: None,
            probe_pending: false,
            start_pending: false,
        }
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            permission_state: self.permission,
            call_active: self.call_active,
            video_enabled: self.video_enabled,
            audio_enabled: self.audio_enabled,
            current_gesture: self.current_gesture,
            probe_pending: self.probe_pending,
            start_pending: self.start_pending,
        }
    }

    pub fn permission(&self) -> PermissionState {
        self.permission
    }

    pub fn is_call_active(&self) -> bool {
        self.call_active
    }

    pub fn holds_stream(&self) -> bool {
        self.stream.is_some()
    }

    pub fn timer_armed(&self) -> bool {
        self.gesture_timer.is_some()
    }

    pub fn is_start_pending(&self) -> bool {
        self.start_pending
    }

    // --- Permission ---

    /// Returns the constraints to probe with, or `None` if a probe is not
    /// allowed right now. Probing is allowed until permission is granted,
    /// and never while a call or another request is in flight.
    pub fn begin_probe(&mut self) -> Option<MediaConstraints> {
        if self.permission == PermissionState::Granted
            || self.probe_pending
            || self.start_pending
            || self.stream.is_some()
        {
            debug!("Permission probe ignored (state={:?})", self.permission);
            return None;
        }
        self.probe_pending = true;
        Some(MediaConstraints::VIDEO)
    }

    /// The probe stream is released immediately; only the outcome matters.
    pub fn finish_probe(&mut self, result: Result<MediaStream, MediaError>) {
        if !self.probe_pending {
            debug!("Discarding stale permission probe result");
            return;
        }
        self.probe_pending = false;

        match result {
            Ok(stream) => {
                stream.stop();
                self.permission = PermissionState::Granted;
                info!("Camera permission granted");
            }
            Err(e) => {
                self.permission = PermissionState::Denied;
                warn!("Camera permission probe failed: {}", e);
                let body = match e {
                    MediaError::PermissionDenied => {
                        "Please enable camera access to use video calls".to_string()
                    }
                    MediaError::DeviceUnavailable(reason) => {
                        format!("No usable camera was found ({})", reason)
                    }
                };
                self.notifier
                    .notify("Camera access required", &body, Severity::Error);
            }
        }
    }

    // --- Call lifecycle ---

    /// Returns the constraints to acquire with, or `None` when starting is
    /// not allowed (permission not granted, call running, request pending).
    pub fn begin_start(&mut self) -> Option<MediaConstraints> {
        if self.permission != PermissionState::Granted {
            debug!("Start call ignored: permission is {:?}", self.permission);
            return None;
        }
        if self.start_pending || self.probe_pending || self.stream.is_some() || self.call_active {
            debug!("Start call ignored: call already starting or active");
            return None;
        }
        self.start_pending = true;
        Some(MediaConstraints::AUDIO_VIDEO)
    }

    pub fn finish_start(&mut self, result: Result<MediaStream, MediaError>) {
        if !self.start_pending {
            // Dropping the stream stops its tracks.
            debug!("Discarding stale start call result");
            return;
        }
        self.start_pending = false;

        let stream = match result {
            Ok(stream) => stream,
            Err(e) => {
                warn!("Failed to start call: {}", e);
                self.permission = PermissionState::Denied;
                let body = match e {
                    MediaError::PermissionDenied => {
                        "Camera or microphone access was denied".to_string()
                    }
                    MediaError::DeviceUnavailable(reason) => {
                        format!("Media device unavailable: {}", reason)
                    }
                };
                self.notifier
                    .notify("Could not start call", &body, Severity::Error);
                return;
            }
        };

        for track in stream.audio_tracks() {
            track.set_enabled(self.audio_enabled);
        }
        for track in stream.tracks() {
            debug!("Holding {:?} track {:?}", track.kind(), track.label());
        }
        info!(
            "Call started (stream {}, audio {})",
            stream.id(),
            if self.audio_enabled { "on" } else { "muted" }
        );
        self.stream = Some(stream);
        self.video_enabled = true;
        self.call_active = true;
        self.current_gesture = None;

        if self.config.simulate_gestures {
            self.arm_gesture_timer();
        }
        self.notifier.notify(
            "Call started",
            "Gesture recognition is now active",
            Severity::Info,
        );
    }

    /// Stops the stream and timer. Returns false (and does nothing) when no
    /// stream is held.
    pub fn end_call(&mut self) -> bool {
        if !self.release() {
            debug!("End call ignored: no active stream");
            return false;
        }
        info!("Call ended");
        self.notifier.notify(
            "Call ended",
            "Your camera and microphone have been released",
            Severity::Info,
        );
        true
    }

    /// Forced release when the host goes away. Same sequence as `end_call`
    /// without notifying, and any in-flight request is abandoned.
    pub fn teardown(&mut self) {
        self.probe_pending = false;
        self.start_pending = false;
        if self.release() {
            info!("Session torn down with an active call");
        }
    }

    fn release(&mut self) -> bool {
        let Some(stream) = self.stream.take() else {
            self.cancel_gesture_timer();
            return false;
        };
        stream.stop();
        drop(stream);
        self.cancel_gesture_timer();
        self.call_active = false;
        self.current_gesture = None;
        true
    }

    // --- Toggles ---

    pub fn toggle_audio(&mut self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };
        let enabled = !self.audio_enabled;
        for track in stream.audio_tracks() {
            track.set_enabled(enabled);
        }
        self.audio_enabled = enabled;

        let (title, body) = if enabled {
            ("Microphone unmuted", "Others can hear you")
        } else {
            ("Microphone muted", "Your microphone is off")
        };
        self.notifier.notify(title, body, Severity::Info);
        true
    }

    /// Disables the video track without stopping capture, so the camera
    /// stays reserved for re-enabling.
    pub fn toggle_video(&mut self) -> bool {
        let Some(stream) = self.stream.as_ref() else {
            return false;
        };
        let enabled = !self.video_enabled;
        for track in stream.video_tracks() {
            track.set_enabled(enabled);
        }
        self.video_enabled = enabled;

        let (title, body) = if enabled {
            ("Camera on", "Your camera is visible")
        } else {
            ("Camera off", "Your camera is hidden")
        };
        self.notifier.notify(title, body, Severity::Info);
        true
    }

    // --- Gestures ---

    fn arm_gesture_timer(&mut self) {
        self.cancel_gesture_timer();
        let period = self.config.gesture_interval;
        let mut timer = time::interval_at(Instant::now() + period, period);
        timer.set_missed_tick_behavior(MissedTickBehavior::Skip);
        self.gesture_timer = Some(timer);
        debug!("Gesture timer armed ({:?})", period);
    }

    fn cancel_gesture_timer(&mut self) {
        if self.gesture_timer.take().is_some() {
            debug!("Gesture timer cancelled");
        }
    }

    /// Resolves on the next timer tick; never resolves when no timer is armed.
    pub async fn next_tick(&mut self) {
        match self.gesture_timer.as_mut() {
            Some(timer) => {
                timer.tick().await;
            }
            None => std::future::pending().await,
        }
    }

    /// Handle a timer tick. A tick that finds the call over cancels the
    /// timer and leaves the gesture alone.
    pub fn on_tick(&mut self) -> Option<GestureLabel> {
        if !self.call_active {
            self.cancel_gesture_timer();
            return None;
        }
        let label = self.source.next_gesture();
        self.current_gesture = Some(label);
        debug!("Simulated gesture: {}", label);
        Some(label)
    }

    /// Gesture pushed by an external detector. Ignored unless a call is active.
    pub fn report_gesture(&mut self, label: GestureLabel) -> bool {
        if !self.call_active {
            debug!("Gesture {} ignored: no active call", label);
            return false;
        }
        self.current_gesture = Some(label);
        true
    }
}

impl Drop for CallSession {
    fn drop(&mut self) {
        self.teardown();
    }
}
