use clap::Parser;
use std::time::Duration;

use gesturecall_lib::session::SessionConfig;
use gesturecall_lib::{DeviceBehavior, RunOptions};

#[derive(Parser)]
#[command(name = "gesturecall", about = "Video call demo with simulated gesture recognition")]
struct Cli {
    /// API server host
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// API server port
    #[arg(long, default_value = "9848")]
    port: u16,

    /// Milliseconds between simulated gesture detections
    #[arg(long, default_value = "3000", value_parser = clap::value_parser!(u64).range(1..))]
    gesture_interval_ms: u64,

    /// Only accept gestures reported by an external detector
    #[arg(long)]
    no_simulate_gestures: bool,

    /// Start calls with the microphone on
    #[arg(long)]
    start_unmuted: bool,

    /// Seed for the gesture simulator
    #[arg(long)]
    seed: Option<u64>,

    /// How the simulated camera/microphone answers requests
    #[arg(long, value_enum, default_value = "allow")]
    device: DeviceBehavior,

    /// Simulated delay before the device answers, in milliseconds
    #[arg(long, default_value = "0")]
    device_latency_ms: u64,
}

fn main() {
    let cli = Cli::parse();

    let opts = RunOptions {
        host: cli.host,
        port: cli.port,
        session: SessionConfig {
            gesture_interval: Duration::from_millis(cli.gesture_interval_ms),
            simulate_gestures: !cli.no_simulate_gestures,
            initial_audio_enabled: cli.start_unmuted,
            seed: cli.seed,
        },
        device: cli.device,
        device_latency: Duration::from_millis(cli.device_latency_ms),
    };

    let rt = tokio::runtime::Runtime::new().expect("Failed to create Tokio runtime");
    if let Err(e) = rt.block_on(gesturecall_lib::run_headless(opts)) {
        eprintln!("gesturecall: {}", e);
        std::process::exit(1);
    }
}
