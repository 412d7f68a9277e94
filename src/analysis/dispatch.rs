//! Background analysis dispatch.
//!
//! `Dispatcher` turns a sampled frame into one fire-and-forget worker
//! thread: JPEG-encode, base64, blocking POST, then a single
//! `AnalysisReport` sent back over an mpsc channel. The session loop drains
//! reports with `poll()` on its own cadence, so the rendering path never
//! waits on the network. There is no cancellation; a stopped session
//! discards late reports by their epoch tag.

use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use anyhow::Result;
use base64::{prelude::BASE64_STANDARD, Engine};

use super::{AnalysisMode, AnalysisPayload, VisionClient};
use crate::config::MonitorConfig;
use crate::frame::{encode_jpeg, Frame};

/// Completion of one analysis request.
#[derive(Clone, Debug)]
pub struct AnalysisReport {
    /// Session epoch at dispatch time. Reports from an earlier epoch are
    /// stale and must be discarded.
    pub epoch: u64,
    pub mode: AnalysisMode,
    /// Parsed payload, or a human-readable failure message.
    pub outcome: Result<AnalysisPayload, String>,
}

pub struct Dispatcher {
    client: Arc<VisionClient>,
    detect_url: String,
    recognize_url: String,
    count_url: String,
    jpeg_quality: u8,
    tx: Sender<AnalysisReport>,
    rx: Receiver<AnalysisReport>,
    dispatched: u64,
}

impl Dispatcher {
    pub fn new(config: &MonitorConfig) -> Self {
        let (tx, rx) = mpsc::channel();
        Self {
            client: Arc::new(VisionClient::new(
                config.access_token.clone(),
                config.request_timeout,
            )),
            detect_url: config.vehicle_detect_url.clone(),
            recognize_url: config.vehicle_recognize_url.clone(),
            count_url: config.people_count_url.clone(),
            jpeg_quality: config.jpeg_quality,
            tx,
            rx,
            dispatched: 0,
        }
    }

    fn endpoint_for(&self, mode: AnalysisMode) -> &str {
        match mode {
            AnalysisMode::VehicleDetection => &self.detect_url,
            AnalysisMode::VehicleRecognition => &self.recognize_url,
            AnalysisMode::PeopleCount => &self.count_url,
        }
    }

    /// Encode `frame` and spawn one worker to submit it. Returns once the
    /// worker is started; encoding failures are the only synchronous errors.
    pub fn dispatch(&mut self, frame: &Frame, mode: AnalysisMode, epoch: u64) -> Result<()> {
        let jpeg = encode_jpeg(frame, self.jpeg_quality)?;
        let image_b64 = BASE64_STANDARD.encode(&jpeg);

        let client = Arc::clone(&self.client);
        let endpoint = self.endpoint_for(mode).to_string();
        let tx = self.tx.clone();

        self.dispatched += 1;
        log::debug!(
            "dispatching {} request #{} ({} base64 bytes)",
            mode,
            self.dispatched,
            image_b64.len()
        );

        std::thread::spawn(move || {
            let outcome = client
                .analyze(&endpoint, mode, &image_b64)
                .map_err(|e| e.to_string());
            // The receiver disappears when the session is dropped; a late
            // worker just lets its report go.
            let _ = tx.send(AnalysisReport {
                epoch,
                mode,
                outcome,
            });
        });
        Ok(())
    }

    /// Drain every completed report without blocking.
    pub fn poll(&mut self) -> Vec<AnalysisReport> {
        self.rx.try_iter().collect()
    }

    /// Total requests dispatched over the dispatcher's lifetime.
    pub fn dispatched(&self) -> u64 {
        self.dispatched
    }
}
