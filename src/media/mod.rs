pub mod device;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};
use uuid::Uuid;

/// What a caller asks the media device for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaConstraints {
    pub video: bool,
    pub audio: bool,
}

impl MediaConstraints {
    /// Video only. Used by the permission probe.
    pub const VIDEO: Self = Self { video: true, audio: false };
    pub const AUDIO_VIDEO: Self = Self { video: true, audio: true };
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MediaError {
    #[error("media access was denied")]
    PermissionDenied,
    #[error("media device unavailable: {0}")]
    DeviceUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrackKind {
    Audio,
    Video,
}

#[derive(Debug)]
struct TrackState {
    enabled: AtomicBool,
    live: AtomicBool,
}

/// A single capture track. Clones share the same underlying state, so a
/// device can keep an eye on the tracks it handed out.
#[derive(Debug, Clone)]
pub struct MediaTrack {
    kind: TrackKind,
    label: String,
    state: Arc<TrackState>,
}

impl MediaTrack {
    pub fn new(kind: TrackKind, label: impl Into<String>) -> Self {
        Self {
            kind,
            label: label.into(),
            state: Arc::new(TrackState {
                enabled: AtomicBool::new(true),
                live: AtomicBool::new(true),
            }),
        }
    }

    pub fn kind(&self) -> TrackKind {
        self.kind
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_enabled(&self) -> bool {
        self.state.enabled.load(Ordering::Relaxed)
    }

    /// Disabling a track keeps the device reserved; only `stop` releases it.
    pub fn set_enabled(&self, enabled: bool) {
        self.state.enabled.store(enabled, Ordering::Relaxed);
    }

    pub fn is_live(&self) -> bool {
        self.state.live.load(Ordering::Relaxed)
    }

    pub fn stop(&self) {
        self.state.live.store(false, Ordering::Relaxed);
    }
}

/// A held capture session. All tracks are stopped when the stream is
/// stopped or dropped.
#[derive(Debug)]
pub struct MediaStream {
    id: Uuid,
    tracks: Vec<MediaTrack>,
}

impl MediaStream {
    pub fn new(tracks: Vec<MediaTrack>) -> Self {
        Self {
            id: Uuid::new_v4(),
            tracks,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn tracks(&self) -> &[MediaTrack] {
        &self.tracks
    }

    pub fn tracks_of(&self, kind: TrackKind) -> impl Iterator<Item = &MediaTrack> {
        self.tracks.iter().filter(move |t| t.kind == kind)
    }

    pub fn audio_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Audio)
    }

    pub fn video_tracks(&self) -> impl Iterator<Item = &MediaTrack> {
        self.tracks_of(TrackKind::Video)
    }

    pub fn is_live(&self) -> bool {
        self.tracks.iter().any(MediaTrack::is_live)
    }

    pub fn stop(&self) {
        for track in &self.tracks {
            track.stop();
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Camera/microphone access.
#[async_trait]
pub trait MediaDevice: Send + Sync {
    async fn acquire(&self, constraints: MediaConstraints) -> Result<MediaStream, MediaError>;
}
