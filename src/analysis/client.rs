//! Blocking HTTP client for the remote vision API.
//!
//! One request = one form-encoded POST: the base64 JPEG travels in the
//! `image` field, the credential as the `access_token` query parameter. A
//! 2xx status means the body is parsed for the request's mode; anything else
//! (non-2xx, transport failure, timeout) becomes a human-readable error that
//! ends up on the status surface.

use std::time::Duration;

use anyhow::{anyhow, Result};

use super::wire::parse_response;
use super::{AnalysisMode, AnalysisPayload};

pub struct VisionClient {
    agent: ureq::Agent,
    access_token: String,
}

impl VisionClient {
    /// Build a client with a fixed per-request timeout. The timeout covers
    /// the whole call; expiry surfaces as a transport error.
    pub fn new(access_token: impl Into<String>, timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self {
            agent,
            access_token: access_token.into(),
        }
    }

    /// Submit one base64-encoded JPEG to `endpoint` and parse the response
    /// according to `mode`.
    pub fn analyze(
        &self,
        endpoint: &str,
        mode: AnalysisMode,
        image_b64: &str,
    ) -> Result<AnalysisPayload> {
        let response = self
            .agent
            .post(endpoint)
            .query("access_token", &self.access_token)
            .send_form(&[("image", image_b64)]);

        match response {
            Ok(response) => {
                let body = response
                    .into_string()
                    .map_err(|e| anyhow!("{} response unreadable: {}", mode.label(), e))?;
                log::debug!("{} response body: {}", mode.label(), body);
                parse_response(mode, body.as_bytes())
                    .map_err(|e| anyhow!("{} response malformed: {}", mode.label(), e))
            }
            Err(ureq::Error::Status(code, response)) => {
                let body = response.into_string().unwrap_or_default();
                log::error!(
                    "{} request failed: status {}, body: {}",
                    mode.label(),
                    code,
                    body
                );
                Err(anyhow!("{} request failed (status {})", mode.label(), code))
            }
            Err(ureq::Error::Transport(transport)) => {
                log::error!("{} request error: {}", mode.label(), transport);
                Err(anyhow!("{} request error: {}", mode.label(), transport))
            }
        }
    }
}
