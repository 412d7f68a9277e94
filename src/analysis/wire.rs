//! Remote vision API response parsing.
//!
//! This module holds the serde schemas for the three endpoint bodies and the
//! conversion into normalized payload types. Parsing is deliberately
//! tolerant: the remote service omits fields freely, and a partial body must
//! degrade to safe fallbacks (empty list, "unknown" category, zero count)
//! rather than take the display down. Only a body that is not JSON at all is
//! an error.

use anyhow::{anyhow, Result};
use serde::Deserialize;

use super::{AnalysisMode, AnalysisPayload, BoundingBox, Detection, ModelGuess};

/// Vehicle-detect body: `{ "vehicle_info": [ { "type", "location" }, ... ] }`.
#[derive(Debug, Deserialize)]
pub struct VehicleDetectResponse {
    #[serde(default)]
    pub vehicle_info: Vec<VehicleInfo>,
}

#[derive(Debug, Deserialize)]
pub struct VehicleInfo {
    /// Vehicle category (car, truck, bus, ...). Absent means unknown.
    #[serde(rename = "type")]
    pub vehicle_type: Option<String>,

    /// Pixel-space box. Absent fields collapse to zero.
    #[serde(default)]
    pub location: WireLocation,
}

#[derive(Debug, Default, Deserialize)]
pub struct WireLocation {
    #[serde(default)]
    pub left: i32,
    #[serde(default)]
    pub top: i32,
    #[serde(default)]
    pub width: i32,
    #[serde(default)]
    pub height: i32,
}

/// Vehicle-recognize body: `{ "result": [ { "name", "score" }, ... ] }`.
#[derive(Debug, Deserialize)]
pub struct VehicleRecognizeResponse {
    #[serde(default)]
    pub result: Vec<ModelCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct ModelCandidate {
    pub name: Option<String>,

    #[serde(default)]
    pub score: f64,
}

/// People-count body: `{ "person_num": n }`.
#[derive(Debug, Deserialize)]
pub struct PeopleCountResponse {
    #[serde(default)]
    pub person_num: u32,
}

/// Parse a 2xx response body for the given mode into a normalized payload.
pub fn parse_response(mode: AnalysisMode, body: &[u8]) -> Result<AnalysisPayload> {
    match mode {
        AnalysisMode::VehicleDetection => {
            let response: VehicleDetectResponse =
                serde_json::from_slice(body).map_err(|e| anyhow!("parse error: {}", e))?;
            let detections = response
                .vehicle_info
                .into_iter()
                .map(|info| Detection {
                    category: info.vehicle_type.unwrap_or_else(|| "unknown".to_string()),
                    bbox: BoundingBox {
                        left: info.location.left,
                        top: info.location.top,
                        width: info.location.width,
                        height: info.location.height,
                    },
                })
                .collect();
            Ok(AnalysisPayload::Vehicles(detections))
        }
        AnalysisMode::VehicleRecognition => {
            let response: VehicleRecognizeResponse =
                serde_json::from_slice(body).map_err(|e| anyhow!("parse error: {}", e))?;
            let guesses = response
                .result
                .into_iter()
                .map(|candidate| ModelGuess {
                    name: candidate.name.unwrap_or_else(|| "unknown".to_string()),
                    score: candidate.score,
                })
                .collect();
            Ok(AnalysisPayload::Models(guesses))
        }
        AnalysisMode::PeopleCount => {
            let response: PeopleCountResponse =
                serde_json::from_slice(body).map_err(|e| anyhow!("parse error: {}", e))?;
            Ok(AnalysisPayload::PeopleCount(response.person_num))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETECT_BODY: &str = r#"{
        "vehicle_num": {"car": 1},
        "vehicle_info": [
            {"type": "car", "location": {"left": 10, "top": 20, "width": 30, "height": 40}}
        ]
    }"#;

    #[test]
    fn detect_body_parses_into_detections() -> Result<()> {
        let payload = parse_response(AnalysisMode::VehicleDetection, DETECT_BODY.as_bytes())?;
        let AnalysisPayload::Vehicles(detections) = payload else {
            panic!("wrong payload variant");
        };
        assert_eq!(detections.len(), 1);
        assert_eq!(detections[0].category, "car");
        assert_eq!(
            detections[0].bbox,
            BoundingBox {
                left: 10,
                top: 20,
                width: 30,
                height: 40
            }
        );
        Ok(())
    }

    #[test]
    fn detect_body_missing_fields_fall_back() -> Result<()> {
        let body = r#"{"vehicle_info": [{"location": {"left": 5}}]}"#;
        let payload = parse_response(AnalysisMode::VehicleDetection, body.as_bytes())?;
        let AnalysisPayload::Vehicles(detections) = payload else {
            panic!("wrong payload variant");
        };
        assert_eq!(detections[0].category, "unknown");
        assert_eq!(
            detections[0].bbox,
            BoundingBox {
                left: 5,
                top: 0,
                width: 0,
                height: 0
            }
        );
        Ok(())
    }

    #[test]
    fn detect_body_without_vehicle_info_is_empty() -> Result<()> {
        let payload = parse_response(AnalysisMode::VehicleDetection, b"{}")?;
        assert_eq!(payload, AnalysisPayload::Vehicles(vec![]));
        Ok(())
    }

    #[test]
    fn recognize_body_parses_candidates() -> Result<()> {
        let body = r#"{"result": [{"name": "Corolla", "score": 0.97}, {"score": 0.01}]}"#;
        let payload = parse_response(AnalysisMode::VehicleRecognition, body.as_bytes())?;
        let AnalysisPayload::Models(guesses) = payload else {
            panic!("wrong payload variant");
        };
        assert_eq!(guesses.len(), 2);
        assert_eq!(guesses[0].name, "Corolla");
        assert!((guesses[0].score - 0.97).abs() < 1e-9);
        assert_eq!(guesses[1].name, "unknown");
        Ok(())
    }

    #[test]
    fn person_num_parses_and_defaults_to_zero() -> Result<()> {
        let payload = parse_response(AnalysisMode::PeopleCount, br#"{"person_num": 5}"#)?;
        assert_eq!(payload, AnalysisPayload::PeopleCount(5));

        let payload = parse_response(AnalysisMode::PeopleCount, b"{}")?;
        assert_eq!(payload, AnalysisPayload::PeopleCount(0));
        Ok(())
    }

    #[test]
    fn non_json_body_is_an_error() {
        let result = parse_response(AnalysisMode::PeopleCount, b"<html>oops</html>");
        assert!(result.is_err());
    }
}
