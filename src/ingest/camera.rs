//! Camera frame source.
//!
//! This module provides `CameraSource` for pumping frames from a local
//! capture device, addressed by index the way desktop capture stacks number
//! them (camera 0 is the default device).
//!
//! Real capture needs the `ingest-camera-v4l2` feature; without it every
//! index is served by a synthetic sensor that never runs out of frames.

use anyhow::Result;
use rand::Rng;

#[cfg(feature = "ingest-camera-v4l2")]
use super::camera_v4l2::V4l2CameraSource;
use crate::frame::{Frame, PixelFormat};

/// Configuration for a camera source.
#[derive(Clone, Debug)]
pub struct CameraConfig {
    /// Device index (camera 0 is the default device).
    pub index: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            index: 0,
            width: 640,
            height: 480,
        }
    }
}

/// Camera frame source.
pub struct CameraSource {
    backend: CameraBackend,
}

enum CameraBackend {
    Synthetic(SyntheticCameraSource),
    #[cfg(feature = "ingest-camera-v4l2")]
    V4l2(V4l2CameraSource),
}

impl CameraSource {
    pub fn new(config: CameraConfig) -> Result<Self> {
        #[cfg(feature = "ingest-camera-v4l2")]
        {
            Ok(Self {
                backend: CameraBackend::V4l2(V4l2CameraSource::new(config)?),
            })
        }
        #[cfg(not(feature = "ingest-camera-v4l2"))]
        {
            Ok(Self {
                backend: CameraBackend::Synthetic(SyntheticCameraSource::new(config)),
            })
        }
    }

    /// Open the capture device.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-camera-v4l2")]
            CameraBackend::V4l2(source) => source.connect(),
        }
    }

    /// Capture the next frame.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            CameraBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-camera-v4l2")]
            CameraBackend::V4l2(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-camera-v4l2")]
            CameraBackend::V4l2(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> CameraStats {
        match &self.backend {
            CameraBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-camera-v4l2")]
            CameraBackend::V4l2(source) => source.stats(),
        }
    }
}

/// Statistics for a camera source.
#[derive(Clone, Debug)]
pub struct CameraStats {
    pub frames_captured: u64,
    pub index: u32,
}

// ----------------------------------------------------------------------------
// Synthetic sensor for tests and feature-less builds
// ----------------------------------------------------------------------------

struct SyntheticCameraSource {
    config: CameraConfig,
    frame_count: u64,
}

impl SyntheticCameraSource {
    fn new(config: CameraConfig) -> Self {
        Self {
            config,
            frame_count: 0,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!(
            "CameraSource: opened camera {} (synthetic)",
            self.config.index
        );
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        self.frame_count += 1;
        let pixels = self.generate_sensor_pixels();
        Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            PixelFormat::Bgr8,
        )
    }

    /// Flat scene plus per-frame sensor noise. Unlike the file clip, the
    /// camera never ends and no two frames are identical.
    fn generate_sensor_pixels(&self) -> Vec<u8> {
        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let base = 80 + (self.frame_count % 16) as u8;
        let mut pixels = vec![base; w * h * 3];

        let mut rng = rand::thread_rng();
        let speckles = (w * h / 64).max(1);
        for _ in 0..speckles {
            let i = rng.gen_range(0..w * h) * 3;
            let level: u8 = rng.gen();
            pixels[i] = level;
            pixels[i + 1] = level;
            pixels[i + 2] = level;
        }

        pixels
    }

    fn is_healthy(&self) -> bool {
        true
    }

    fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            index: self.config.index,
        }
    }
}
