//! roadwatch - live road-traffic monitoring client
//!
//! This binary:
//! 1. Opens the configured video source (file playback or camera capture)
//! 2. Pumps frames at a fixed cadence onto the terminal display sink
//! 3. Samples every 40th frame to the vision API in the selected mode
//! 4. Reconciles finished analyses onto the overlay and status surface
//! 5. Stops on Ctrl-C, releasing the source

use anyhow::Result;
use clap::Parser;
use std::io::IsTerminal;
use std::sync::mpsc;
use std::time::{Duration, Instant};

use roadwatch::{AnalysisMode, MonitorConfig, MonitorSession, SourceConfig, TerminalSink};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Video file to play back as the frame source.
    #[arg(long, conflicts_with = "camera")]
    file: Option<String>,
    /// Camera index to capture from (the default source when --file is absent).
    #[arg(long)]
    camera: Option<u32>,
    /// Analysis mode: detect, recognize, or count.
    #[arg(long, default_value = "detect")]
    mode: String,
    /// Vision API access token (overrides the config file).
    #[arg(long, env = "ROADWATCH_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
    /// Stop after this many pumped frames (runs until Ctrl-C by default).
    #[arg(long)]
    max_frames: Option<u64>,
    /// UI mode: auto, plain, or pretty.
    #[arg(long)]
    ui: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mode: AnalysisMode = args.mode.parse()?;
    let config = MonitorConfig::load_with_token(args.token.clone())?;

    let source_config = match (&args.file, args.camera) {
        (Some(path), _) => SourceConfig::file(path),
        (None, Some(index)) => SourceConfig::camera(index),
        (None, None) => SourceConfig::camera(0),
    };

    let sink = TerminalSink::from_args(args.ui.as_deref(), std::io::stderr().is_terminal());
    let mut session = MonitorSession::new(config.clone(), source_config, mode, Box::new(sink));

    let (shutdown_tx, shutdown_rx) = mpsc::channel();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(());
    })
    .expect("error setting Ctrl-C handler");

    log::info!("roadwatch running. analysis mode: {}", mode);
    session.start()?;

    let mut last_health_log = Instant::now();
    loop {
        if shutdown_rx.try_recv().is_ok() {
            log::info!("shutdown signal received, stopping session...");
            break;
        }

        session.tick();

        if let Some(max) = args.max_frames {
            if session.frame_count() >= max {
                log::info!("reached {} frames, stopping session...", max);
                break;
            }
        }

        if last_health_log.elapsed() >= Duration::from_secs(5) {
            log::info!(
                "source health={} frames={} dispatched={}",
                session.source_is_healthy(),
                session.frame_count(),
                session.dispatched()
            );
            last_health_log = Instant::now();
        }

        std::thread::sleep(config.tick_interval);
    }

    session.stop();
    Ok(())
}
