use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{MediaConstraints, MediaDevice, MediaError, MediaStream, MediaTrack, TrackKind};

/// How the simulated device answers acquisition requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DeviceBehavior {
    /// Grant every request.
    Allow,
    /// Refuse as if the user blocked camera access.
    Deny,
    /// Fail as if another application holds the camera.
    Busy,
}

/// In-process media device. Hands out tracks with no real capture behind
/// them and keeps the tracks of outstanding streams so callers can check
/// that nothing is left running. Fully stopped streams are forgotten on
/// the next acquisition.
pub struct SimulatedDevice {
    behavior: Mutex<DeviceBehavior>,
    latency: Duration,
    outstanding: Mutex<Vec<Vec<MediaTrack>>>,
    issued_count: AtomicUsize,
}

impl SimulatedDevice {
    pub fn new(behavior: DeviceBehavior) -> Self {
        Self {
            behavior: Mutex::new(behavior),
            latency: Duration::ZERO,
            outstanding: Mutex::new(Vec::new()),
            issued_count: AtomicUsize::new(0),
        }
    }

    /// Delay every acquisition, like a permission prompt would.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    pub fn behavior(&self) -> DeviceBehavior {
        *self.behavior.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn set_behavior(&self, behavior: DeviceBehavior) {
        *self.behavior.lock().unwrap_or_else(|e| e.into_inner()) = behavior;
    }

    /// Number of issued streams that still have a live track.
    pub fn live_streams(&self) -> usize {
        self.outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .filter(|tracks| tracks.iter().any(MediaTrack::is_live))
            .count()
    }

    /// Number of streams issued so far, live or not.
    pub fn issued_streams(&self) -> usize {
        self.issued_count.load(Ordering::Relaxed)
    }

    /// Tracks the device still remembers, oldest first. Includes streams
    /// stopped since the last acquisition.
    pub fn issued_tracks(&self) -> Vec<MediaTrack> {
        self.outstanding
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .flat_map(|tracks| tracks.iter().cloned())
            .collect()
    }
}

#[async_trait]
impl MediaDevice for SimulatedDevice {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        match self.behavior() {
            DeviceBehavior::Deny => {
                warn!("Simulated device: access denied");
                return Err(MediaError::PermissionDenied);
            }
            DeviceBehavior::Busy => {
                warn!("Simulated device: camera busy");
                return Err(MediaError::DeviceUnavailable(
                    "camera is in use by another application".into(),
                ));
            }
            DeviceBehavior::Allow => {}
        }

        if !constraints.video && !constraints.audio {
            return Err(MediaError::DeviceUnavailable(
                "no audio or video requested".into(),
            ));
        }

        let mut tracks = Vec::new();
        if constraints.video {
            tracks.push(MediaTrack::new(TrackKind::Video, "Simulated Camera"));
        }
        if constraints.audio {
            tracks.push(MediaTrack::new(TrackKind::Audio, "Simulated Microphone"));
        }

        let stream = MediaStream::new(tracks);
        let outstanding = {
            let mut outstanding = self.outstanding.lock().unwrap_or_else(|e| e.into_inner());
            outstanding.retain(|tracks| tracks.iter().any(MediaTrack::is_live));
            outstanding.push(stream.tracks().to_vec());
            outstanding.len()
        };
        self.issued_count.fetch_add(1, Ordering::Relaxed);

        info!(
            "Simulated device: issued stream {} (video={}, audio={})",
            stream.id(),
            constraints.video,
            constraints.audio
        );
        debug!("Simulated device: {} outstanding streams", outstanding);
        Ok(stream)
    }
}
