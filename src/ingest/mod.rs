//! Frame ingestion sources.
//!
//! This module provides the video sources the monitor can pump frames from:
//! - Local video files (feature: ingest-file-ffmpeg, synthetic otherwise)
//! - Local camera devices (feature: ingest-camera-v4l2, synthetic otherwise)
//!
//! Every source is usable without any feature enabled: `stub://` file paths
//! and all camera indexes fall back to a synthetic scene generator, so the
//! full pump/sample/reconcile loop runs on machines with no media stack.
//!
//! All sources produce `Frame` instances in their native byte order
//! (typically BGR). The ingestion layer is responsible for:
//! - Opening and releasing the underlying device or demuxer
//! - Decoding frames in-memory
//! - Reporting health and capture statistics
//!
//! The ingestion layer MUST NOT:
//! - Perform color conversion (the pump does that once per tick)
//! - Retain frames beyond handoff to the caller

pub mod camera;
#[cfg(feature = "ingest-camera-v4l2")]
pub(crate) mod camera_v4l2;
pub mod file;
#[cfg(feature = "ingest-file-ffmpeg")]
pub(crate) mod file_ffmpeg;
pub mod source;

pub use camera::{CameraConfig, CameraSource};
pub use file::{FileConfig, FileSource};
pub use source::{SourceConfig, VideoSource};
