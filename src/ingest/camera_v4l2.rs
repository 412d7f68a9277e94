//! V4L2 camera capture backend.
//!
//! Real capture backend for `CameraSource`, addressing `/dev/video{index}`
//! through libv4l with a memory-mapped buffer stream.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::camera::{CameraConfig, CameraStats};
use crate::frame::{Frame, PixelFormat};

pub(crate) struct V4l2CameraSource {
    config: CameraConfig,
    state: Option<V4l2CameraState>,
    frame_count: u64,
    last_error: Option<String>,
    active_width: u32,
    active_height: u32,
    active_format: PixelFormat,
}

#[self_referencing]
struct V4l2CameraState {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2CameraSource {
    pub(crate) fn new(config: CameraConfig) -> Result<Self> {
        Ok(Self {
            active_width: config.width,
            active_height: config.height,
            active_format: PixelFormat::Bgr8,
            config,
            state: None,
            frame_count: 0,
            last_error: None,
        })
    }

    pub(crate) fn connect(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let device_path = format!("/dev/video{}", self.config.index);
        let mut device = v4l::Device::with_path(&device_path)
            .with_context(|| format!("open camera device {}", device_path))?;
        let mut format = device.format().context("read camera format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"BGR3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "CameraSource: failed to set format on {}: {}",
                    device_path,
                    err
                );
                device
                    .format()
                    .context("read camera format after set failure")?
            }
        };

        self.active_format = match &format.fourcc.repr {
            b"BGR3" => PixelFormat::Bgr8,
            b"RGB3" => PixelFormat::Rgb8,
            other => {
                return Err(anyhow!(
                    "camera {} negotiated unsupported pixel format {:?}",
                    device_path,
                    String::from_utf8_lossy(other)
                ));
            }
        };
        self.active_width = format.width;
        self.active_height = format.height;
        self.last_error = None;

        let state = V4l2CameraStateBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create camera buffer stream"))
            },
        }
        .try_build()
        .map_err(|err| {
            self.last_error = Some(err.to_string());
            err
        })?;
        self.state = Some(state);

        log::info!(
            "CameraSource: opened {} ({}x{})",
            device_path,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    pub(crate) fn next_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("camera not connected")?;
        let (buf, _meta) = state
            .with_mut(|fields| fields.stream.next())
            .map_err(|err| {
                self.last_error = Some(err.to_string());
                anyhow::Error::new(err).context("capture camera frame")
            })?;

        // Mmap buffers can be padded past the packed frame length.
        let expected = self.active_width as usize * self.active_height as usize * 3;
        let pixels = buf
            .get(..expected)
            .ok_or_else(|| anyhow!("camera buffer shorter than negotiated frame size"))?
            .to_vec();

        self.frame_count += 1;
        Frame::new(
            pixels,
            self.active_width,
            self.active_height,
            self.active_format,
        )
    }

    pub(crate) fn is_healthy(&self) -> bool {
        self.last_error.is_none() && self.state.is_some()
    }

    pub(crate) fn stats(&self) -> CameraStats {
        CameraStats {
            frames_captured: self.frame_count,
            index: self.config.index,
        }
    }
}
