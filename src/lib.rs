mod api;
pub mod events;
pub mod gesture;
pub mod media;
pub mod models;
pub mod services;
pub mod session;
pub mod state;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;

pub use crate::events::AppEvent;
pub use crate::media::device::DeviceBehavior;
pub use crate::models::{PermissionState, SessionSnapshot, Severity};

use crate::events::create_event_bus;
use crate::media::device::SimulatedDevice;
use crate::media::MediaDevice;
use crate::session::{SessionCommand, SessionConfig, SessionHandle};
use crate::state::ServiceContext;

/// Options for the headless service, filled from the command line.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub host: String,
    pub port: u16,
    pub session: SessionConfig,
    pub device: DeviceBehavior,
    pub device_latency: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 9848,
            session: SessionConfig::default(),
            device: DeviceBehavior::Allow,
            device_latency: Duration::ZERO,
        }
    }
}

/// Create a ServiceContext with all shared state.
fn create_service_context() -> (
    ServiceContext,
    mpsc::Receiver<SessionCommand>,
    watch::Sender<SessionSnapshot>,
) {
    let (command_tx, command_rx) = mpsc::channel::<SessionCommand>(64);
    let (event_tx, _event_rx) = create_event_bus();
    let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());

    let ctx = ServiceContext {
        session: SessionHandle::new(command_tx),
        event_tx,
        snapshot_rx,
    };

    (ctx, command_rx, snapshot_tx)
}

/// Spawn the session engine event loop.
fn spawn_session_engine(
    command_rx: mpsc::Receiver<SessionCommand>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
    device: Arc<dyn MediaDevice>,
    config: SessionConfig,
    ctx: &ServiceContext,
) -> tokio::task::JoinHandle<()> {
    let event_tx = ctx.event_tx.clone();
    tokio::spawn(async move {
        session::engine::run_session_engine(command_rx, device, event_tx, snapshot_tx, config).await;
    })
}

/// Run without a GUI: session engine plus the API server the browser UI
/// talks to. Returns when the server stops or Ctrl-C is received; the
/// session is torn down either way.
pub async fn run_headless(opts: RunOptions) -> std::io::Result<()> {
    tracing_subscriber::fmt::init();

    let device: Arc<dyn MediaDevice> =
        Arc::new(SimulatedDevice::new(opts.device).with_latency(opts.device_latency));
    info!(
        "Simulated media device: {:?} (latency {:?})",
        opts.device, opts.device_latency
    );

    let (ctx, command_rx, snapshot_tx) = create_service_context();
    let engine = spawn_session_engine(command_rx, snapshot_tx, device, opts.session, &ctx);

    let handle = ctx.session.clone();
    let result = tokio::select! {
        result = api::server::start_api_server(ctx, &opts.host, opts.port) => result,
        _ = tokio::signal::ctrl_c() => {
            info!("Interrupted, shutting down");
            Ok(())
        }
    };

    if handle.shutdown().await.is_ok() {
        let _ = engine.await;
    }
    result
}
