//! Display surface for the monitoring session.
//!
//! The session talks to whatever shows frames and status text through the
//! `DisplaySink` trait, so the pump loop never knows whether it is driving
//! a terminal, a test recorder, or something richer. `TerminalSink` is the
//! built-in implementation: a live spinner line for the frame counter when
//! stderr is a TTY, plain line output otherwise.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

use crate::analysis::Detection;
use crate::frame::Frame;

/// Where session output lands. One sink per session; calls arrive from the
/// pump loop in tick order.
pub trait DisplaySink {
    /// A pumped frame, RGB, with the current overlay already rendered.
    fn present_frame(&mut self, frame: &Frame);

    /// The overlay was replaced after a vehicle result differed.
    fn overlay_changed(&mut self, detections: &[Detection]);

    /// A status line: lifecycle changes, analysis results, failures.
    fn status(&mut self, text: &str);
}

#[derive(Clone, Copy, Debug)]
pub enum SinkMode {
    Auto,
    Plain,
    Pretty,
}

pub struct TerminalSink {
    spinner: Option<ProgressBar>,
    frames: u64,
    start: Instant,
}

impl TerminalSink {
    pub fn new(mode: SinkMode, is_tty: bool) -> Self {
        let use_pretty = is_tty
            && match mode {
                SinkMode::Pretty => true,
                SinkMode::Auto => true,
                SinkMode::Plain => false,
            };

        let spinner = if use_pretty {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message("waiting for frames…");
            Some(spinner)
        } else {
            None
        };

        Self {
            spinner,
            frames: 0,
            start: Instant::now(),
        }
    }

    pub fn from_args(ui_flag: Option<&str>, is_tty: bool) -> Self {
        let mode = match ui_flag {
            Some("plain") => SinkMode::Plain,
            Some("pretty") => SinkMode::Pretty,
            _ => SinkMode::Auto,
        };
        Self::new(mode, is_tty)
    }

    fn line(&self, text: &str) {
        if let Some(spinner) = &self.spinner {
            spinner.println(text);
        } else {
            eprintln!("{}", text);
        }
    }
}

impl DisplaySink for TerminalSink {
    fn present_frame(&mut self, frame: &Frame) {
        self.frames += 1;
        // Plain mode stays quiet at pump rate; only the live line moves.
        if let Some(spinner) = &self.spinner {
            spinner.set_message(format!(
                "frame {} {}x{}",
                self.frames, frame.width, frame.height
            ));
        }
    }

    fn overlay_changed(&mut self, detections: &[Detection]) {
        self.line(&format!("[overlay] {} vehicle(s)", detections.len()));
    }

    fn status(&mut self, text: &str) {
        self.line(text);
    }
}

impl Drop for TerminalSink {
    fn drop(&mut self) {
        let message = format!(
            "✔ {} frames shown ({})",
            self.frames,
            format_duration(self.start.elapsed())
        );
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
