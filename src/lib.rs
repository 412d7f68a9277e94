//! Roadwatch
//!
//! This crate implements a desktop client for live road-traffic monitoring:
//! it pumps frames from a video source at a fixed cadence, samples frames to
//! a remote vision API, and reconciles the results onto a detection overlay
//! and a status surface.
//!
//! # Architecture
//!
//! Every tick of the pump honors the same contract:
//!
//! 1. **Pump**: read one frame from the source; a failed read is surfaced
//!    and the session keeps ticking.
//! 2. **Sample**: every 40th frame is JPEG-encoded, base64-wrapped, and
//!    dispatched to the vision API on a worker thread. The pump never waits.
//! 3. **Present**: the frame is converted to RGB, the current overlay is
//!    rendered onto it, and it goes to the display sink.
//! 4. **Reconcile**: finished analyses are drained from the dispatch channel
//!    and merged. Vehicle overlays redraw only when the detections actually
//!    changed; people counts always refresh; failures surface as status
//!    text. Reports from before the last stop are stale and discarded.
//!
//! # Module Structure
//!
//! - `frame`: pixel buffers, BGR/RGB conversion, JPEG encoding
//! - `ingest`: video sources (file playback, camera capture, synthetic)
//! - `analysis`: the vision API client, wire formats, and the dispatcher
//! - `monitor`: the session state machine, overlay, and result reconciler
//! - `display`: the sink the session presents frames and status through
//! - `config`: endpoints, credentials, and cadence knobs

pub mod analysis;
pub mod config;
pub mod display;
pub mod frame;
pub mod ingest;
pub mod monitor;

pub use analysis::{
    AnalysisMode, AnalysisPayload, AnalysisReport, BoundingBox, Detection, Dispatcher,
    ModelGuess, VisionClient,
};
pub use config::MonitorConfig;
pub use display::{DisplaySink, SinkMode, TerminalSink};
pub use frame::{encode_jpeg, Frame, PixelFormat};
pub use ingest::{
    CameraConfig, CameraSource, FileConfig, FileSource, SourceConfig, VideoSource,
};
pub use monitor::{MonitorSession, OverlayState, SessionState};
