use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

const DEFAULT_VEHICLE_DETECT_URL: &str =
    "https://aip.baidubce.com/rest/2.0/image-classify/v1/vehicle_detect";
const DEFAULT_VEHICLE_RECOGNIZE_URL: &str =
    "https://aip.baidubce.com/rest/2.0/image-classify/v1/car";
const DEFAULT_PEOPLE_COUNT_URL: &str =
    "https://aip.baidubce.com/rest/2.0/image-classify/v1/body_num";
const DEFAULT_SAMPLE_INTERVAL: u64 = 40;
const DEFAULT_TICK_MS: u64 = 40;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_JPEG_QUALITY: u8 = 80;

#[derive(Debug, Deserialize, Default)]
struct MonitorConfigFile {
    access_token: Option<String>,
    endpoints: Option<EndpointsConfigFile>,
    sampling: Option<SamplingConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct EndpointsConfigFile {
    vehicle_detect: Option<String>,
    vehicle_recognize: Option<String>,
    people_count: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct SamplingConfigFile {
    sample_interval: Option<u64>,
    tick_ms: Option<u64>,
    request_timeout_secs: Option<u64>,
    jpeg_quality: Option<u8>,
}

/// Everything a monitoring session needs to know up front: credential,
/// endpoint URLs, and the pump/sampling cadence. Passed by reference into
/// the dispatcher and session at construction; nothing reads globals.
#[derive(Debug, Clone)]
pub struct MonitorConfig {
    pub access_token: String,
    pub vehicle_detect_url: String,
    pub vehicle_recognize_url: String,
    pub people_count_url: String,
    /// Displayed frames between analysis dispatches.
    pub sample_interval: u64,
    /// Pump cadence.
    pub tick_interval: Duration,
    /// Fixed per-request ceiling for analysis calls.
    pub request_timeout: Duration,
    pub jpeg_quality: u8,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            access_token: String::new(),
            vehicle_detect_url: DEFAULT_VEHICLE_DETECT_URL.to_string(),
            vehicle_recognize_url: DEFAULT_VEHICLE_RECOGNIZE_URL.to_string(),
            people_count_url: DEFAULT_PEOPLE_COUNT_URL.to_string(),
            sample_interval: DEFAULT_SAMPLE_INTERVAL,
            tick_interval: Duration::from_millis(DEFAULT_TICK_MS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            jpeg_quality: DEFAULT_JPEG_QUALITY,
        }
    }
}

impl MonitorConfig {
    /// Load from the optional JSON file named by `ROADWATCH_CONFIG`, then
    /// apply environment overrides, then validate.
    pub fn load() -> Result<Self> {
        Self::load_with_token(None)
    }

    /// Like [`load`](Self::load), with a final credential override (the CLI
    /// `--token` flag) applied before validation.
    pub fn load_with_token(token_override: Option<String>) -> Result<Self> {
        let config_path = std::env::var("ROADWATCH_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        if let Some(token) = token_override {
            if !token.trim().is_empty() {
                cfg.access_token = token;
            }
        }
        cfg.validate()?;
        Ok(cfg)
    }

    fn from_file(file: MonitorConfigFile) -> Self {
        let defaults = Self::default();
        let endpoints = file.endpoints.unwrap_or_default();
        let sampling = file.sampling.unwrap_or_default();
        Self {
            access_token: file.access_token.unwrap_or(defaults.access_token),
            vehicle_detect_url: endpoints
                .vehicle_detect
                .unwrap_or(defaults.vehicle_detect_url),
            vehicle_recognize_url: endpoints
                .vehicle_recognize
                .unwrap_or(defaults.vehicle_recognize_url),
            people_count_url: endpoints.people_count.unwrap_or(defaults.people_count_url),
            sample_interval: sampling.sample_interval.unwrap_or(DEFAULT_SAMPLE_INTERVAL),
            tick_interval: Duration::from_millis(sampling.tick_ms.unwrap_or(DEFAULT_TICK_MS)),
            request_timeout: Duration::from_secs(
                sampling
                    .request_timeout_secs
                    .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS),
            ),
            jpeg_quality: sampling.jpeg_quality.unwrap_or(DEFAULT_JPEG_QUALITY),
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(token) = std::env::var("ROADWATCH_ACCESS_TOKEN") {
            if !token.trim().is_empty() {
                self.access_token = token;
            }
        }
        if let Ok(url) = std::env::var("ROADWATCH_VEHICLE_DETECT_URL") {
            if !url.trim().is_empty() {
                self.vehicle_detect_url = url;
            }
        }
        if let Ok(url) = std::env::var("ROADWATCH_VEHICLE_RECOGNIZE_URL") {
            if !url.trim().is_empty() {
                self.vehicle_recognize_url = url;
            }
        }
        if let Ok(url) = std::env::var("ROADWATCH_PEOPLE_COUNT_URL") {
            if !url.trim().is_empty() {
                self.people_count_url = url;
            }
        }
        if let Ok(interval) = std::env::var("ROADWATCH_SAMPLE_INTERVAL") {
            let frames: u64 = interval
                .parse()
                .map_err(|_| anyhow!("ROADWATCH_SAMPLE_INTERVAL must be an integer frame count"))?;
            self.sample_interval = frames;
        }
        if let Ok(tick) = std::env::var("ROADWATCH_TICK_MS") {
            let ms: u64 = tick
                .parse()
                .map_err(|_| anyhow!("ROADWATCH_TICK_MS must be an integer millisecond count"))?;
            self.tick_interval = Duration::from_millis(ms);
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.access_token.trim().is_empty() {
            return Err(anyhow!(
                "access token is required (set ROADWATCH_ACCESS_TOKEN or pass --token)"
            ));
        }
        validate_endpoint("vehicle detect", &self.vehicle_detect_url)?;
        validate_endpoint("vehicle recognize", &self.vehicle_recognize_url)?;
        validate_endpoint("people count", &self.people_count_url)?;
        if self.sample_interval == 0 {
            return Err(anyhow!("sample interval must be greater than zero"));
        }
        if self.tick_interval.is_zero() {
            return Err(anyhow!("tick interval must be greater than zero"));
        }
        if self.request_timeout.is_zero() {
            return Err(anyhow!("request timeout must be greater than zero"));
        }
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(anyhow!("jpeg quality must be between 1 and 100"));
        }
        Ok(())
    }
}

fn validate_endpoint(name: &str, value: &str) -> Result<()> {
    let parsed =
        url::Url::parse(value).map_err(|e| anyhow!("{} endpoint URL invalid: {}", name, e))?;
    match parsed.scheme() {
        "http" | "https" => Ok(()),
        other => Err(anyhow!(
            "{} endpoint URL must be http or https (got {})",
            name,
            other
        )),
    }
}

fn read_config_file(path: &Path) -> Result<MonitorConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}
