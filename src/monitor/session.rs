//! Monitoring session state machine.
//!
//! `MonitorSession` owns everything one monitoring run needs: the source
//! selection, the dispatcher, the overlay, and the display sink. It moves
//! between `Idle` and `Running` on explicit `start()`/`stop()` calls, and
//! the caller drives `tick()` at the pump cadence while running.
//!
//! A tick does the whole per-frame contract in order: pump one frame,
//! convert to RGB, sample it for analysis when the frame counter divides by
//! the sampling interval, render the overlay, present, then drain and
//! reconcile finished analyses. Stopping releases the source and bumps the
//! session epoch so any in-flight request that completes later is discarded
//! instead of landing on a dead display.

use anyhow::Result;

use crate::analysis::{AnalysisMode, AnalysisReport, Detection, Dispatcher};
use crate::config::MonitorConfig;
use crate::display::DisplaySink;
use crate::ingest::{SourceConfig, VideoSource};
use crate::monitor::overlay::OverlayState;
use crate::monitor::reconcile;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Running,
}

pub struct MonitorSession {
    config: MonitorConfig,
    source_config: SourceConfig,
    mode: AnalysisMode,
    state: SessionState,
    source: Option<VideoSource>,
    dispatcher: Dispatcher,
    overlay: OverlayState,
    frame_count: u64,
    epoch: u64,
    sink: Box<dyn DisplaySink>,
}

impl MonitorSession {
    pub fn new(
        config: MonitorConfig,
        source_config: SourceConfig,
        mode: AnalysisMode,
        sink: Box<dyn DisplaySink>,
    ) -> Self {
        let dispatcher = Dispatcher::new(&config);
        Self {
            config,
            source_config,
            mode,
            state: SessionState::Idle,
            source: None,
            dispatcher,
            overlay: OverlayState::new(),
            frame_count: 0,
            epoch: 0,
            sink,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_running(&self) -> bool {
        self.state == SessionState::Running
    }

    pub fn mode(&self) -> AnalysisMode {
        self.mode
    }

    /// Retarget the next sampled frame. In-flight requests are not touched.
    pub fn set_mode(&mut self, mode: AnalysisMode) {
        if self.mode != mode {
            log::info!("analysis mode set to {}", mode);
            self.mode = mode;
        }
    }

    /// Pump ticks since the session was created. Deliberately not reset by
    /// stop/start, so the sampling cadence continues across restarts.
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }

    /// Detections currently on the overlay.
    pub fn detections(&self) -> &[Detection] {
        self.overlay.detections()
    }

    /// Analysis requests dispatched over the session's lifetime.
    pub fn dispatched(&self) -> u64 {
        self.dispatcher.dispatched()
    }

    pub fn source_is_healthy(&self) -> bool {
        self.source.as_ref().map(VideoSource::is_healthy) == Some(true)
    }

    /// Open the source and enter `Running`. A no-op if already running; on
    /// open failure the session surfaces the problem and stays `Idle`.
    pub fn start(&mut self) -> Result<()> {
        if self.state == SessionState::Running {
            log::debug!("start ignored: session already running");
            return Ok(());
        }
        match self.source_config.open() {
            Ok(source) => {
                log::info!("monitoring {}", self.source_config.describe());
                self.source = Some(source);
                self.state = SessionState::Running;
                self.surface("monitoring started");
                Ok(())
            }
            Err(e) => {
                log::error!(
                    "failed to open {}: {}",
                    self.source_config.describe(),
                    e
                );
                self.surface("unable to open video source");
                Err(e.context("open video source"))
            }
        }
    }

    /// Release the source and return to `Idle`. A no-op if already idle.
    /// In-flight requests are left to finish; the epoch bump makes their
    /// reports stale.
    pub fn stop(&mut self) {
        if self.state == SessionState::Idle {
            log::debug!("stop ignored: session already idle");
            return;
        }
        self.source = None;
        self.state = SessionState::Idle;
        self.epoch += 1;
        self.surface("monitoring stopped");
    }

    /// One pump tick. Does nothing while idle. Frame-read failures are
    /// surfaced and the session keeps ticking; only `stop()` ends a run.
    pub fn tick(&mut self) {
        if self.state != SessionState::Running {
            return;
        }

        let pumped = match self.source.as_mut() {
            Some(source) => source.next_frame(),
            None => return,
        };

        match pumped {
            Ok(frame) => {
                self.frame_count += 1;
                let mut display_frame = frame.into_rgb();

                if self.frame_count % self.config.sample_interval == 0 {
                    // The API gets the clean frame; the overlay belongs to
                    // the display alone.
                    if let Err(e) =
                        self.dispatcher
                            .dispatch(&display_frame, self.mode, self.epoch)
                    {
                        log::error!("sample dispatch failed: {}", e);
                        self.surface(&format!("failed to submit frame for {}", self.mode));
                    }
                }

                self.overlay.render_onto(&mut display_frame);
                self.sink.present_frame(&display_frame);
            }
            Err(e) => {
                log::error!("frame capture failed: {}", e);
                self.surface("unable to capture video frame");
            }
        }

        let reports = self.dispatcher.poll();
        for report in reports {
            self.apply_report(report);
        }
    }

    fn apply_report(&mut self, report: AnalysisReport) {
        if report.epoch < self.epoch {
            log::debug!(
                "discarding stale {} report (epoch {} < {})",
                report.mode,
                report.epoch,
                self.epoch
            );
            return;
        }
        let outcome = reconcile::apply(&mut self.overlay, report);
        if outcome.overlay_changed {
            self.sink.overlay_changed(self.overlay.detections());
        }
        if let Some(status) = outcome.status {
            self.surface(&status);
        }
    }

    /// Put `text` on the status surface and mirror it to the log, the way
    /// the status pane and log pane always move together.
    fn surface(&mut self, text: &str) {
        log::info!("{}", text);
        self.sink.status(text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{AnalysisPayload, BoundingBox};
    use crate::frame::Frame;
    use crate::ingest::FileConfig;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingSink {
        frames: Arc<Mutex<u64>>,
        overlays: Arc<Mutex<Vec<Vec<Detection>>>>,
        statuses: Arc<Mutex<Vec<String>>>,
    }

    impl DisplaySink for RecordingSink {
        fn present_frame(&mut self, _frame: &Frame) {
            *self.frames.lock().unwrap() += 1;
        }

        fn overlay_changed(&mut self, detections: &[Detection]) {
            self.overlays.lock().unwrap().push(detections.to_vec());
        }

        fn status(&mut self, text: &str) {
            self.statuses.lock().unwrap().push(text.to_string());
        }
    }

    impl RecordingSink {
        fn frames(&self) -> u64 {
            *self.frames.lock().unwrap()
        }

        fn statuses(&self) -> Vec<String> {
            self.statuses.lock().unwrap().clone()
        }

        fn overlay_updates(&self) -> usize {
            self.overlays.lock().unwrap().len()
        }
    }

    fn test_source() -> SourceConfig {
        SourceConfig::File(FileConfig {
            path: "stub://clip".to_string(),
            width: 64,
            height: 48,
        })
    }

    fn test_config() -> MonitorConfig {
        MonitorConfig {
            access_token: "test-token".to_string(),
            // Nothing listens on port 1, so accidental dispatches fail fast.
            vehicle_detect_url: "http://127.0.0.1:1/detect".to_string(),
            vehicle_recognize_url: "http://127.0.0.1:1/recognize".to_string(),
            people_count_url: "http://127.0.0.1:1/count".to_string(),
            ..MonitorConfig::default()
        }
    }

    fn test_session() -> (MonitorSession, RecordingSink) {
        let sink = RecordingSink::default();
        let session = MonitorSession::new(
            test_config(),
            test_source(),
            AnalysisMode::VehicleDetection,
            Box::new(sink.clone()),
        );
        (session, sink)
    }

    fn car_at(left: i32) -> Detection {
        Detection {
            category: "car".to_string(),
            bbox: BoundingBox {
                left,
                top: 20,
                width: 30,
                height: 40,
            },
        }
    }

    fn vehicles_report(epoch: u64, detections: Vec<Detection>) -> AnalysisReport {
        AnalysisReport {
            epoch,
            mode: AnalysisMode::VehicleDetection,
            outcome: Ok(AnalysisPayload::Vehicles(detections)),
        }
    }

    #[test]
    fn start_and_stop_are_idempotent() -> Result<()> {
        let (mut session, sink) = test_session();
        assert_eq!(session.state(), SessionState::Idle);

        session.start()?;
        session.start()?;
        assert!(session.is_running());
        let started = sink
            .statuses()
            .iter()
            .filter(|s| *s == "monitoring started")
            .count();
        assert_eq!(started, 1);

        session.stop();
        session.stop();
        assert_eq!(session.state(), SessionState::Idle);
        let stopped = sink
            .statuses()
            .iter()
            .filter(|s| *s == "monitoring stopped")
            .count();
        assert_eq!(stopped, 1);
        Ok(())
    }

    #[test]
    fn stop_releases_source_for_restart() -> Result<()> {
        let (mut session, sink) = test_session();
        session.start()?;
        for _ in 0..5 {
            session.tick();
        }
        session.stop();

        session.start()?;
        session.tick();
        assert!(session.is_running());
        assert_eq!(sink.frames(), 6);
        Ok(())
    }

    #[test]
    fn open_failure_keeps_session_idle() {
        let sink = RecordingSink::default();
        let mut session = MonitorSession::new(
            test_config(),
            SourceConfig::file(""),
            AnalysisMode::VehicleDetection,
            Box::new(sink.clone()),
        );

        assert!(session.start().is_err());
        assert_eq!(session.state(), SessionState::Idle);
        assert!(sink
            .statuses()
            .iter()
            .any(|s| s == "unable to open video source"));
    }

    #[test]
    fn tick_while_idle_does_nothing() {
        let (mut session, sink) = test_session();
        session.tick();
        assert_eq!(session.frame_count(), 0);
        assert_eq!(sink.frames(), 0);
    }

    #[test]
    fn dispatch_fires_on_every_40th_frame() -> Result<()> {
        let (mut session, _sink) = test_session();
        session.start()?;

        for expected in [(39, 0), (40, 1), (79, 1), (80, 2), (120, 3)] {
            while session.frame_count() < expected.0 {
                session.tick();
            }
            assert_eq!(
                session.dispatched(),
                expected.1,
                "at frame {}",
                expected.0
            );
        }
        Ok(())
    }

    #[test]
    fn frame_counter_continues_across_restart() -> Result<()> {
        let (mut session, _sink) = test_session();
        session.start()?;
        for _ in 0..30 {
            session.tick();
        }
        session.stop();
        session.start()?;
        for _ in 0..10 {
            session.tick();
        }

        assert_eq!(session.frame_count(), 40);
        assert_eq!(session.dispatched(), 1);
        Ok(())
    }

    #[test]
    fn end_of_stream_surfaces_error_and_keeps_running() -> Result<()> {
        let (mut session, sink) = test_session();
        session.start()?;

        let clip = crate::ingest::file::SYNTHETIC_CLIP_FRAMES;
        for _ in 0..clip + 3 {
            session.tick();
        }

        assert!(session.is_running());
        assert_eq!(session.frame_count(), clip);
        assert_eq!(sink.frames(), clip);
        let failures = sink
            .statuses()
            .iter()
            .filter(|s| *s == "unable to capture video frame")
            .count();
        assert_eq!(failures, 3);
        assert!(!session.source_is_healthy());
        Ok(())
    }

    #[test]
    fn reports_from_before_stop_are_discarded() -> Result<()> {
        let (mut session, sink) = test_session();
        session.start()?;
        session.apply_report(vehicles_report(0, vec![car_at(10)]));
        assert_eq!(session.detections(), &[car_at(10)]);
        assert_eq!(sink.overlay_updates(), 1);

        session.stop();
        session.start()?;

        // A request dispatched before the stop finally completes: stale.
        session.apply_report(vehicles_report(0, vec![car_at(99)]));
        assert_eq!(session.detections(), &[car_at(10)]);
        assert_eq!(sink.overlay_updates(), 1);

        // Current-epoch reports still land.
        session.apply_report(vehicles_report(1, vec![car_at(50)]));
        assert_eq!(session.detections(), &[car_at(50)]);
        assert_eq!(sink.overlay_updates(), 2);
        Ok(())
    }

    #[test]
    fn mode_switch_retargets_next_dispatch() -> Result<()> {
        let (mut session, _sink) = test_session();
        assert_eq!(session.mode(), AnalysisMode::VehicleDetection);
        session.set_mode(AnalysisMode::PeopleCount);
        assert_eq!(session.mode(), AnalysisMode::PeopleCount);
        Ok(())
    }
}
