//! Detection overlay state and rendering.
//!
//! `OverlayState` holds the detection list the display currently shows and
//! draws it onto outgoing frames: a green outline per vehicle with a red
//! label tag above the top-left corner, everything clamped to the frame so
//! an off-screen box from the remote API can never panic the renderer.

use crate::analysis::Detection;
use crate::frame::{Frame, PixelFormat};

const BOX_COLOR: [u8; 3] = [0, 255, 0];
const TAG_COLOR: [u8; 3] = [255, 0, 0];
const TAG_HEIGHT: i32 = 8;
const TAG_CHAR_WIDTH: i32 = 6;

/// The detection list currently drawn over the live frame.
#[derive(Debug, Default)]
pub struct OverlayState {
    detections: Vec<Detection>,
}

impl OverlayState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn detections(&self) -> &[Detection] {
        &self.detections
    }

    /// Replace the held list iff `new` differs from it by value. Returns
    /// whether a replacement (and therefore a redraw) happened.
    pub fn replace_if_changed(&mut self, new: Vec<Detection>) -> bool {
        if new == self.detections {
            return false;
        }
        self.detections = new;
        true
    }

    /// Draw the held detections onto `frame`.
    pub fn render_onto(&self, frame: &mut Frame) {
        // The clamps below need at least one addressable pixel per axis.
        if frame.width == 0 || frame.height == 0 {
            return;
        }
        for detection in &self.detections {
            let left = detection.bbox.left;
            let top = detection.bbox.top;
            let right = left.saturating_add(detection.bbox.width);
            let bottom = top.saturating_add(detection.bbox.height);
            draw_box(frame, left, top, right, bottom, BOX_COLOR);
            draw_label_tag(frame, left, top, &detection.category, TAG_COLOR);
        }
    }
}

/// One-pixel rectangle outline, clamped to the frame.
fn draw_box(frame: &mut Frame, left: i32, top: i32, right: i32, bottom: i32, color: [u8; 3]) {
    let width = frame.width as i32;
    let height = frame.height as i32;
    let left = left.clamp(0, width.saturating_sub(1));
    let right = right.clamp(0, width.saturating_sub(1));
    let top = top.clamp(0, height.saturating_sub(1));
    let bottom = bottom.clamp(0, height.saturating_sub(1));

    for x in left..=right {
        put_pixel(frame, x, top, color);
        put_pixel(frame, x, bottom, color);
    }
    for y in top..=bottom {
        put_pixel(frame, left, y, color);
        put_pixel(frame, right, y, color);
    }
}

/// Filled tag above the box's top-left corner, sized to the label text the
/// way a toolkit would reserve space for it.
fn draw_label_tag(frame: &mut Frame, left: i32, top: i32, label: &str, color: [u8; 3]) {
    let tag_width = (label.chars().count() as i32).max(1) * TAG_CHAR_WIDTH;
    let tag_top = (top - TAG_HEIGHT - 2).max(0);
    let width = frame.width as i32;
    let height = frame.height as i32;
    let left = left.clamp(0, width.saturating_sub(1));
    let right = (left + tag_width).clamp(0, width.saturating_sub(1));
    let bottom = (tag_top + TAG_HEIGHT).clamp(0, height.saturating_sub(1));

    for y in tag_top..=bottom {
        for x in left..=right {
            put_pixel(frame, x, y, color);
        }
    }
}

fn put_pixel(frame: &mut Frame, x: i32, y: i32, rgb: [u8; 3]) {
    if x < 0 || y < 0 || x >= frame.width as i32 || y >= frame.height as i32 {
        return;
    }
    let offset = (y as usize * frame.width as usize + x as usize) * 3;
    let format = frame.format;
    let data = frame.data_mut();
    match format {
        PixelFormat::Rgb8 => {
            data[offset] = rgb[0];
            data[offset + 1] = rgb[1];
            data[offset + 2] = rgb[2];
        }
        PixelFormat::Bgr8 => {
            data[offset] = rgb[2];
            data[offset + 1] = rgb[1];
            data[offset + 2] = rgb[0];
        }
    }
}
