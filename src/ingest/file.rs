//! Local video file frame source.
//!
//! This module provides `FileSource` for pumping frames out of a local video
//! file. The file source is responsible for:
//! - Opening a local file path (no URL schemes, no network access)
//! - Decoding frames in-memory in capture order
//! - Signaling end of stream as a frame-read error
//!
//! Real decoding needs the `ingest-file-ffmpeg` feature; `stub://` paths
//! always use the synthetic clip so the rest of the pipeline is exercisable
//! without media files.

use anyhow::{anyhow, Result};

#[cfg(feature = "ingest-file-ffmpeg")]
use super::file_ffmpeg::FfmpegFileSource;
use crate::frame::{Frame, PixelFormat};

/// Frame count of the synthetic clip before it reports end of stream.
pub const SYNTHETIC_CLIP_FRAMES: u64 = 600;

/// Configuration for a local file source.
#[derive(Clone, Debug)]
pub struct FileConfig {
    /// Local file path (e.g., "/home/user/traffic.mp4").
    pub path: String,
    /// Frame width for the synthetic clip. Real decoders use the file's own.
    pub width: u32,
    /// Frame height for the synthetic clip. Real decoders use the file's own.
    pub height: u32,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: String::new(),
            width: 640,
            height: 480,
        }
    }
}

/// Local video file frame source.
pub struct FileSource {
    backend: FileBackend,
}

enum FileBackend {
    Synthetic(SyntheticFileSource),
    #[cfg(feature = "ingest-file-ffmpeg")]
    Ffmpeg(FfmpegFileSource),
}

impl FileSource {
    pub fn new(config: FileConfig) -> Result<Self> {
        if !is_local_file_path(&config.path) {
            return Err(anyhow!(
                "file playback only supports local paths (no URL schemes)"
            ));
        }
        if config.path.starts_with("stub://") {
            Ok(Self {
                backend: FileBackend::Synthetic(SyntheticFileSource::new(config)),
            })
        } else {
            #[cfg(feature = "ingest-file-ffmpeg")]
            {
                Ok(Self {
                    backend: FileBackend::Ffmpeg(FfmpegFileSource::new(config)?),
                })
            }
            #[cfg(not(feature = "ingest-file-ffmpeg"))]
            {
                Err(anyhow!(
                    "file playback requires the ingest-file-ffmpeg feature"
                ))
            }
        }
    }

    /// Open the file for reading.
    pub fn connect(&mut self) -> Result<()> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.connect(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.connect(),
        }
    }

    /// Decode the next frame. End of stream is an error; the caller decides
    /// whether to keep ticking or stop.
    pub fn next_frame(&mut self) -> Result<Frame> {
        match &mut self.backend {
            FileBackend::Synthetic(source) => source.next_frame(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.next_frame(),
        }
    }

    /// Check if the source is healthy.
    pub fn is_healthy(&self) -> bool {
        match &self.backend {
            FileBackend::Synthetic(source) => source.is_healthy(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.is_healthy(),
        }
    }

    /// Get frame statistics.
    pub fn stats(&self) -> FileStats {
        match &self.backend {
            FileBackend::Synthetic(source) => source.stats(),
            #[cfg(feature = "ingest-file-ffmpeg")]
            FileBackend::Ffmpeg(source) => source.stats(),
        }
    }
}

/// Statistics for a file source.
#[derive(Clone, Debug)]
pub struct FileStats {
    pub frames_captured: u64,
    pub path: String,
}

// ----------------------------------------------------------------------------
// Synthetic clip (stub://) for tests and feature-less builds
// ----------------------------------------------------------------------------

struct SyntheticFileSource {
    config: FileConfig,
    frame_count: u64,
    ended: bool,
}

impl SyntheticFileSource {
    fn new(config: FileConfig) -> Self {
        Self {
            config,
            frame_count: 0,
            ended: false,
        }
    }

    fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: opened {} (synthetic)", self.config.path);
        Ok(())
    }

    fn next_frame(&mut self) -> Result<Frame> {
        if self.frame_count >= SYNTHETIC_CLIP_FRAMES {
            self.ended = true;
            return Err(anyhow!("end of video stream"));
        }
        self.frame_count += 1;
        let pixels = self.generate_scene();
        Frame::new(
            pixels,
            self.config.width,
            self.config.height,
            PixelFormat::Bgr8,
        )
    }

    /// Deterministic road scene: gray band background, a lane stripe, and a
    /// bright "vehicle" block sweeping left to right as the clip plays.
    fn generate_scene(&self) -> Vec<u8> {
        let w = self.config.width as usize;
        let h = self.config.height as usize;
        let mut pixels = vec![0u8; w * h * 3];

        for y in 0..h {
            let band = ((y / 16) % 4) as u8 * 20 + 60;
            for x in 0..w {
                let offset = (y * w + x) * 3;
                let shade = if x == w / 2 { 220 } else { band };
                pixels[offset] = shade;
                pixels[offset + 1] = shade;
                pixels[offset + 2] = shade;
            }
        }

        let block_w = (w / 8).max(1);
        let block_h = (h / 8).max(1);
        let span = w.saturating_sub(block_w).max(1);
        let block_x = (self.frame_count as usize * 4) % span;
        let block_y = h / 2;
        for y in block_y..(block_y + block_h).min(h) {
            for x in block_x..(block_x + block_w).min(w) {
                let offset = (y * w + x) * 3;
                // BGR: a red-ish block.
                pixels[offset] = 40;
                pixels[offset + 1] = 40;
                pixels[offset + 2] = 230;
            }
        }

        pixels
    }

    fn is_healthy(&self) -> bool {
        !self.ended
    }

    fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

fn is_local_file_path(path: &str) -> bool {
    if path.trim().is_empty() {
        return false;
    }
    if path.starts_with("stub://") {
        return true;
    }
    !path.contains("://")
}
