//! Video source selection.
//!
//! `SourceConfig` captures the user's choice (file path or camera index) and
//! knows how to open it; `VideoSource` dispatches over whichever backend the
//! choice produced. A monitoring session reopens its `SourceConfig` on every
//! start and drops the `VideoSource` on stop, which releases the demuxer or
//! device handle.

use anyhow::Result;

use super::camera::{CameraConfig, CameraSource};
use super::file::{FileConfig, FileSource};
use crate::frame::Frame;

/// Which video source a session should monitor.
#[derive(Clone, Debug)]
pub enum SourceConfig {
    File(FileConfig),
    Camera(CameraConfig),
}

impl SourceConfig {
    pub fn file(path: impl Into<String>) -> Self {
        SourceConfig::File(FileConfig {
            path: path.into(),
            ..FileConfig::default()
        })
    }

    pub fn camera(index: u32) -> Self {
        SourceConfig::Camera(CameraConfig {
            index,
            ..CameraConfig::default()
        })
    }

    /// Open and connect the configured source.
    pub fn open(&self) -> Result<VideoSource> {
        match self {
            SourceConfig::File(config) => {
                let mut source = FileSource::new(config.clone())?;
                source.connect()?;
                Ok(VideoSource::File(source))
            }
            SourceConfig::Camera(config) => {
                let mut source = CameraSource::new(config.clone())?;
                source.connect()?;
                Ok(VideoSource::Camera(source))
            }
        }
    }

    /// Human-readable name for logs and status lines.
    pub fn describe(&self) -> String {
        match self {
            SourceConfig::File(config) => format!("file {}", config.path),
            SourceConfig::Camera(config) => format!("camera {}", config.index),
        }
    }
}

/// An open video source.
pub enum VideoSource {
    File(FileSource),
    Camera(CameraSource),
}

impl VideoSource {
    /// Pull the next frame in the source's native byte order.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match self {
            VideoSource::File(source) => source.next_frame(),
            VideoSource::Camera(source) => source.next_frame(),
        }
    }

    pub fn is_healthy(&self) -> bool {
        match self {
            VideoSource::File(source) => source.is_healthy(),
            VideoSource::Camera(source) => source.is_healthy(),
        }
    }

    pub fn frames_captured(&self) -> u64 {
        match self {
            VideoSource::File(source) => source.stats().frames_captured,
            VideoSource::Camera(source) => source.stats().frames_captured,
        }
    }
}
