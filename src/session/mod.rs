pub mod controller;
pub mod engine;

use std::time::Duration;
use tokio::sync::mpsc;

use crate::gesture::GestureLabel;

/// Period of the simulated gesture detector.
pub const DEFAULT_GESTURE_INTERVAL: Duration = Duration::from_millis(3000);

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub gesture_interval: Duration,
    /// Arm the random gesture timer on call start. When off, gestures only
    /// arrive through [`SessionCommand::ReportGesture`].
    pub simulate_gestures: bool,
    /// Microphone intent before the first toggle.
    pub initial_audio_enabled: bool,
    pub seed: Option<u64>,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            gesture_interval: DEFAULT_GESTURE_INTERVAL,
            simulate_gestures: true,
            initial_audio_enabled: false,
            seed: None,
        }
    }
}

/// Commands sent to the session engine from API routes.
#[derive(Debug)]
pub enum SessionCommand {
    StartCall,
    EndCall,
    ToggleAudio,
    ToggleVideo,
    RetryPermission,
    ReportGesture(GestureLabel),
    Shutdown,
}

/// Handle for sending commands to the session engine.
#[derive(Clone)]
pub struct SessionHandle {
    pub command_tx: mpsc::Sender<SessionCommand>,
}

impl SessionHandle {
    pub fn new(command_tx: mpsc::Sender<SessionCommand>) -> Self {
        Self { command_tx }
    }

    async fn send(&self, cmd: SessionCommand, what: &str) -> Result<(), String> {
        self.command_tx
            .send(cmd)
            .await
            .map_err(|e| format!("Failed to {}: {}", what, e))
    }

    pub async fn start_call(&self) -> Result<(), String> {
        self.send(SessionCommand::StartCall, "start call").await
    }

    pub async fn end_call(&self) -> Result<(), String> {
        self.send(SessionCommand::EndCall, "end call").await
    }

    pub async fn toggle_audio(&self) -> Result<(), String> {
        self.send(SessionCommand::ToggleAudio, "toggle audio").await
    }

    pub async fn toggle_video(&self) -> Result<(), String> {
        self.send(SessionCommand::ToggleVideo, "toggle video").await
    }

    pub async fn retry_permission(&self) -> Result<(), String> {
        self.send(SessionCommand::RetryPermission, "retry permission").await
    }

    pub async fn report_gesture(&self, label: GestureLabel) -> Result<(), String> {
        self.send(SessionCommand::ReportGesture(label), "report gesture").await
    }

    pub async fn shutdown(&self) -> Result<(), String> {
        self.send(SessionCommand::Shutdown, "shut down session").await
    }
}
