//! Local video file decoding via FFmpeg.
//!
//! FFmpeg-backed decoder for `FileSource`. Packets are demuxed and decoded
//! in-memory; every decoded picture is scaled into packed BGR at the file's
//! native dimensions.

use anyhow::{Context, Result};
use ffmpeg_next as ffmpeg;

use super::file::{FileConfig, FileStats};
use crate::frame::{Frame, PixelFormat};

pub(crate) struct FfmpegFileSource {
    config: FileConfig,
    input: ffmpeg::format::context::Input,
    stream_index: usize,
    decoder: ffmpeg::codec::decoder::Video,
    scaler: ffmpeg::software::scaling::Context,
    frame_count: u64,
    last_error: Option<String>,
}

impl FfmpegFileSource {
    pub(crate) fn new(config: FileConfig) -> Result<Self> {
        ffmpeg::init().context("initialize ffmpeg")?;
        let input = ffmpeg::format::input(&config.path)
            .with_context(|| format!("failed to open video file '{}'", config.path))?;
        let input_stream = input
            .streams()
            .best(ffmpeg::media::Type::Video)
            .ok_or_else(|| anyhow::anyhow!("file has no video track"))?;
        let stream_index = input_stream.index();
        let context = ffmpeg::codec::context::Context::from_parameters(input_stream.parameters())
            .context("load video decoder parameters")?;
        let decoder = context
            .decoder()
            .video()
            .context("open ffmpeg video decoder")?;

        let scaler = ffmpeg::software::scaling::context::Context::get(
            decoder.format(),
            decoder.width(),
            decoder.height(),
            ffmpeg::util::format::pixel::Pixel::BGR24,
            decoder.width(),
            decoder.height(),
            ffmpeg::software::scaling::flag::Flags::BILINEAR,
        )
        .context("create ffmpeg scaler")?;

        Ok(Self {
            config,
            input,
            stream_index,
            decoder,
            scaler,
            frame_count: 0,
            last_error: None,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        log::info!("FileSource: opened {} (ffmpeg)", self.config.path);
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        let mut decoded = ffmpeg::frame::Video::empty();
        let mut bgr_frame = ffmpeg::frame::Video::empty();

        for (stream, packet) in self.input.packets() {
            if stream.index() != self.stream_index {
                continue;
            }

            self.decoder
                .send_packet(&packet)
                .context("send packet to ffmpeg decoder")?;

            while self.decoder.receive_frame(&mut decoded).is_ok() {
                self.scaler
                    .run(&decoded, &mut bgr_frame)
                    .context("scale frame to BGR")?;
                let (pixels, width, height) = frame_to_pixels(&bgr_frame)?;

                self.frame_count += 1;
                return Frame::new(pixels, width, height, PixelFormat::Bgr8);
            }
        }

        self.last_error = Some("end of video stream".to_string());
        anyhow::bail!("end of video stream")
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.last_error.is_none()
    }

    pub(crate) fn stats(&self) -> FileStats {
        FileStats {
            frames_captured: self.frame_count,
            path: self.config.path.clone(),
        }
    }
}

fn frame_to_pixels(frame: &ffmpeg::frame::Video) -> Result<(Vec<u8>, u32, u32)> {
    let width = frame.width();
    let height = frame.height();
    let row_bytes = (width as usize) * 3;
    let stride = frame.stride(0) as usize;
    let data = frame.data(0);

    if stride == row_bytes {
        return Ok((data.to_vec(), width, height));
    }

    let mut pixels = Vec::with_capacity(row_bytes * height as usize);
    for row in 0..height as usize {
        let start = row * stride;
        let end = start + row_bytes;
        pixels.extend_from_slice(
            data.get(start..end)
                .context("ffmpeg frame row is out of bounds")?,
        );
    }

    Ok((pixels, width, height))
}
