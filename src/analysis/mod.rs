//! Remote frame analysis.
//!
//! Everything between a sampled frame and a reconciled result lives here:
//!
//! - `AnalysisMode`: which remote capability a sample is sent to.
//! - `Detection` / `BoundingBox` / `ModelGuess`: normalized result types.
//! - `wire`: tolerant serde schemas for the remote JSON bodies.
//! - `client`: the blocking HTTP call (form POST, token in the query string).
//! - `dispatch`: one worker thread per request, completion over a channel.
//!
//! The analysis layer MUST NOT touch display or session state; it reports
//! outcomes and the session loop reconciles them.

use std::fmt;
use std::str::FromStr;

use anyhow::anyhow;

pub mod client;
pub mod dispatch;
pub mod wire;

pub use client::VisionClient;
pub use dispatch::{AnalysisReport, Dispatcher};

/// Which remote analysis a sampled frame is submitted to.
///
/// Modes differ only by endpoint URL and response schema; switching modes
/// between dispatches retargets the next sample and nothing else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnalysisMode {
    /// Locate vehicles: list of (category, bounding box).
    VehicleDetection,
    /// Identify vehicle models: ranked (name, confidence) candidates.
    VehicleRecognition,
    /// Count pedestrians: a single scalar.
    PeopleCount,
}

impl AnalysisMode {
    /// Short label used in status messages and logs.
    pub fn label(self) -> &'static str {
        match self {
            AnalysisMode::VehicleDetection => "vehicle detection",
            AnalysisMode::VehicleRecognition => "vehicle recognition",
            AnalysisMode::PeopleCount => "people count",
        }
    }
}

impl fmt::Display for AnalysisMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for AnalysisMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "detect" | "vehicles" => Ok(AnalysisMode::VehicleDetection),
            "recognize" | "models" => Ok(AnalysisMode::VehicleRecognition),
            "count" | "people" => Ok(AnalysisMode::PeopleCount),
            other => Err(anyhow!(
                "unknown analysis mode '{}' (expected detect, recognize, or count)",
                other
            )),
        }
    }
}

/// Pixel-space box, top-left anchored, as the remote API reports it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BoundingBox {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

/// One detected vehicle.
///
/// Compared by value: the reconciler redraws the overlay only when the full
/// detection list differs from the one currently held.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Detection {
    pub category: String,
    pub bbox: BoundingBox,
}

/// One vehicle-model candidate from recognition mode.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelGuess {
    pub name: String,
    pub score: f64,
}

/// Parsed success payload of one analysis response.
#[derive(Clone, Debug, PartialEq)]
pub enum AnalysisPayload {
    Vehicles(Vec<Detection>),
    Models(Vec<ModelGuess>),
    PeopleCount(u32),
}
