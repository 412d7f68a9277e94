//! Frame container and pixel format handling.
//!
//! This module provides the raster type that flows from ingestion to display:
//!
//! - `PixelFormat`: byte layout of a frame (`Bgr8` from capture backends,
//!   `Rgb8` for display and JPEG encoding).
//! - `Frame`: owned, tightly packed raster with validated dimensions.
//!
//! Sources produce frames in their native order (typically BGR); the pump
//! converts to RGB exactly once per tick before rendering. Conversion never
//! reallocates for same-size layouts.

use anyhow::{anyhow, Result};
use image::codecs::jpeg::JpegEncoder;
use image::ExtendedColorType;

/// Byte layout of a packed 3-channel frame.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PixelFormat {
    /// Blue-green-red, the native order of most capture backends.
    Bgr8,
    /// Red-green-blue, the display and encoding order.
    Rgb8,
}

impl PixelFormat {
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Bgr8 | PixelFormat::Rgb8 => 3,
        }
    }
}

/// Owned raster image, tightly packed, `width * height * 3` bytes.
#[derive(Clone)]
pub struct Frame {
    data: Vec<u8>,
    pub width: u32,
    pub height: u32,
    pub format: PixelFormat,
}

impl Frame {
    /// Build a frame, validating that the buffer matches the dimensions.
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Result<Self> {
        let expected = expected_len(width, height, format)?;
        if data.len() != expected {
            return Err(anyhow!(
                "frame length mismatch: expected {}, got {}",
                expected,
                data.len()
            ));
        }
        Ok(Self {
            data,
            width,
            height,
            format,
        })
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Convert to RGB byte order in place. A no-op for frames already in RGB.
    pub fn into_rgb(mut self) -> Frame {
        if self.format == PixelFormat::Bgr8 {
            for px in self.data.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            self.format = PixelFormat::Rgb8;
        }
        self
    }
}

fn expected_len(width: u32, height: u32, format: PixelFormat) -> Result<usize> {
    let pixels = width
        .checked_mul(height)
        .ok_or_else(|| anyhow!("frame dimensions overflow"))? as usize;
    pixels
        .checked_mul(format.bytes_per_pixel())
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

/// Encode a frame as JPEG at the given quality (1-100).
///
/// BGR frames are reordered into a scratch buffer first; the frame itself is
/// not modified.
pub fn encode_jpeg(frame: &Frame, quality: u8) -> Result<Vec<u8>> {
    let rgb_scratch;
    let rgb: &[u8] = match frame.format {
        PixelFormat::Rgb8 => frame.data(),
        PixelFormat::Bgr8 => {
            let mut buf = frame.data().to_vec();
            for px in buf.chunks_exact_mut(3) {
                px.swap(0, 2);
            }
            rgb_scratch = buf;
            &rgb_scratch
        }
    };

    let mut jpeg = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut jpeg, quality);
    encoder
        .encode(rgb, frame.width, frame.height, ExtendedColorType::Rgb8)
        .map_err(|e| anyhow!("jpeg encoding failed: {}", e))?;
    Ok(jpeg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_rejects_length_mismatch() {
        let result = Frame::new(vec![0u8; 10], 2, 2, PixelFormat::Bgr8);
        assert!(result.is_err());
    }

    #[test]
    fn bgr_to_rgb_swaps_channels() -> Result<()> {
        // One blue pixel in BGR order.
        let frame = Frame::new(vec![255, 0, 0], 1, 1, PixelFormat::Bgr8)?;
        let rgb = frame.into_rgb();
        assert_eq!(rgb.format, PixelFormat::Rgb8);
        assert_eq!(rgb.data(), &[0, 0, 255]);
        Ok(())
    }

    #[test]
    fn rgb_conversion_is_idempotent() -> Result<()> {
        let frame = Frame::new(vec![1, 2, 3, 4, 5, 6], 2, 1, PixelFormat::Rgb8)?;
        let rgb = frame.into_rgb();
        assert_eq!(rgb.data(), &[1, 2, 3, 4, 5, 6]);
        Ok(())
    }

    #[test]
    fn jpeg_encoding_produces_nonempty_output() -> Result<()> {
        let frame = Frame::new(vec![128u8; 16 * 16 * 3], 16, 16, PixelFormat::Bgr8)?;
        let jpeg = encode_jpeg(&frame, 80)?;
        assert!(!jpeg.is_empty());
        // JPEG SOI marker.
        assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
        Ok(())
    }

    #[test]
    fn jpeg_encoding_reorders_bgr_to_match_rgb() -> Result<()> {
        // The same red pixel in both byte orders.
        let rgb = Frame::new(vec![230, 40, 40], 1, 1, PixelFormat::Rgb8)?;
        let bgr = Frame::new(vec![40, 40, 230], 1, 1, PixelFormat::Bgr8)?;
        assert_eq!(encode_jpeg(&rgb, 80)?, encode_jpeg(&bgr, 80)?);
        Ok(())
    }
}
