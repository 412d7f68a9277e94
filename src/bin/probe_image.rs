//! probe_image - one-shot vision API probe
//!
//! Submits a single image file to the configured vision endpoint and prints
//! the parsed result. Useful for checking credentials and endpoint wiring
//! without opening a video source.

use anyhow::{Context, Result};
use base64::{prelude::BASE64_STANDARD, Engine};
use clap::Parser;

use roadwatch::{AnalysisMode, AnalysisPayload, MonitorConfig, VisionClient};

#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Image file (JPEG or PNG) to submit.
    image: String,
    /// Analysis mode: detect, recognize, or count.
    #[arg(long, default_value = "detect")]
    mode: String,
    /// Vision API access token (overrides the config file).
    #[arg(long, env = "ROADWATCH_ACCESS_TOKEN", hide_env_values = true)]
    token: Option<String>,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let mode: AnalysisMode = args.mode.parse()?;
    let config = MonitorConfig::load_with_token(args.token.clone())?;

    let bytes =
        std::fs::read(&args.image).with_context(|| format!("failed to read {}", args.image))?;
    let image_b64 = BASE64_STANDARD.encode(&bytes);

    let endpoint = match mode {
        AnalysisMode::VehicleDetection => &config.vehicle_detect_url,
        AnalysisMode::VehicleRecognition => &config.vehicle_recognize_url,
        AnalysisMode::PeopleCount => &config.people_count_url,
    };

    let client = VisionClient::new(config.access_token.clone(), config.request_timeout);
    log::info!("probing {} with {} ({} bytes)", endpoint, mode, bytes.len());
    let payload = client.analyze(endpoint, mode, &image_b64)?;

    match payload {
        AnalysisPayload::Vehicles(detections) => {
            println!("{} vehicle(s)", detections.len());
            for det in detections {
                println!(
                    "  type: {}, at ({}, {}), {}x{}",
                    det.category, det.bbox.left, det.bbox.top, det.bbox.width, det.bbox.height
                );
            }
        }
        AnalysisPayload::Models(guesses) => {
            println!("{} model guess(es)", guesses.len());
            for guess in guesses {
                println!("  {} ({:.2})", guess.name, guess.score);
            }
        }
        AnalysisPayload::PeopleCount(count) => {
            println!("{} person(s)", count);
        }
    }
    Ok(())
}
