//! Result reconciliation.
//!
//! Pure merge of a completed analysis into overlay and status state. The
//! rules come straight from the display contract:
//!
//! - Vehicle detections replace the overlay iff the list differs by value,
//!   and the text pane updates only on that change.
//! - Model recognition and people counts are text-only and always refresh.
//! - Failures surface their message and never touch the overlay.
//!
//! Stale-report filtering happens before this module; reconcile assumes the
//! report belongs to the current session epoch.

use crate::analysis::{AnalysisPayload, AnalysisReport, ModelGuess};
use crate::monitor::overlay::OverlayState;

/// What a report did to the display state.
#[derive(Debug, Default, PartialEq)]
pub struct ReconcileOutcome {
    /// The overlay detection list was replaced and needs a redraw.
    pub overlay_changed: bool,
    /// New text for the status pane, if any.
    pub status: Option<String>,
}

/// Merge one completed report into the overlay, returning what changed.
pub fn apply(overlay: &mut OverlayState, report: AnalysisReport) -> ReconcileOutcome {
    match report.outcome {
        Ok(AnalysisPayload::Vehicles(detections)) => {
            let mut text = String::from("vehicle detection results:\n");
            for detection in &detections {
                text.push_str(&format!(
                    "type: {}, at ({}, {}), {}x{}\n",
                    detection.category,
                    detection.bbox.left,
                    detection.bbox.top,
                    detection.bbox.width,
                    detection.bbox.height
                ));
            }
            if overlay.replace_if_changed(detections) {
                log::info!("detection overlay updated: {:?}", overlay.detections());
                ReconcileOutcome {
                    overlay_changed: true,
                    status: Some(text),
                }
            } else {
                ReconcileOutcome::default()
            }
        }
        Ok(AnalysisPayload::Models(guesses)) => ReconcileOutcome {
            overlay_changed: false,
            status: Some(format_model_guesses(&guesses)),
        },
        Ok(AnalysisPayload::PeopleCount(count)) => ReconcileOutcome {
            overlay_changed: false,
            status: Some(format!("people count result: {} person(s)", count)),
        },
        Err(message) => {
            log::warn!("{} analysis failed: {}", report.mode, message);
            ReconcileOutcome {
                overlay_changed: false,
                status: Some(message),
            }
        }
    }
}

fn format_model_guesses(guesses: &[ModelGuess]) -> String {
    if guesses.is_empty() {
        return "vehicle recognition result: no match".to_string();
    }
    let mut text = String::from("vehicle recognition results:\n");
    for guess in guesses {
        text.push_str(&format!("{} ({:.2})\n", guess.name, guess.score));
    }
    text
}
