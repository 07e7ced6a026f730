//! Configuration management for the OCR relay

use std::env;
use std::time::Duration;

use serde::Deserialize;

use crate::ocr::Schedule;

/// Public demo key published by OCR.space. Heavily rate limited; set
/// `OCR_SPACE_API_KEY` for anything beyond local testing.
pub const DEMO_API_KEY: &str = "helloworld";

pub const DEFAULT_API_URL: &str = "https://api.ocr.space/parse/image";

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub ocr: OcrConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Maximum accepted request body, in bytes
    pub max_body_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OcrConfig {
    /// Provider endpoint
    pub api_url: String,
    pub api_key: String,
    pub default_language: String,
    pub default_engine: String,
    /// Fan-out limit (images in flight per request)
    pub concurrency: usize,
    pub schedule: Schedule,
    /// Default for the per-request `preprocess` flag
    pub preprocess: bool,
    /// Per-call timeout; `None` leaves the HTTP client default in place
    #[serde(default)]
    pub request_timeout: Option<Duration>,
}

impl OcrConfig {
    /// True when no key was configured and the public demo key is in use
    pub fn uses_demo_key(&self) -> bool {
        self.api_key == DEMO_API_KEY
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                max_body_bytes: 25 * 1024 * 1024,
            },
            ocr: OcrConfig {
                api_url: DEFAULT_API_URL.to_string(),
                api_key: DEMO_API_KEY.to_string(),
                default_language: "jpn".to_string(),
                default_engine: "2".to_string(),
                concurrency: 3,
                schedule: Schedule::Batched,
                preprocess: false,
                request_timeout: None,
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a configuration from an arbitrary variable source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let schedule = match var("OCR_SCHEDULE") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                name: "OCR_SCHEDULE",
                value,
            })?,
            None => defaults.ocr.schedule,
        };

        let request_timeout = match var("OCR_REQUEST_TIMEOUT_SECS") {
            Some(value) => Some(Duration::from_secs(parse_var(
                "OCR_REQUEST_TIMEOUT_SECS",
                value,
            )?)),
            None => None,
        };

        let max_body_mb: usize = match var("SERVER_MAX_BODY_MB") {
            Some(value) => parse_var("SERVER_MAX_BODY_MB", value)?,
            None => defaults.server.max_body_bytes / (1024 * 1024),
        };

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: var("SERVER_PORT")
                    .and_then(|p| p.parse().ok())
                    .unwrap_or(defaults.server.port),
                max_body_bytes: max_body_mb * 1024 * 1024,
            },
            ocr: OcrConfig {
                api_url: var("OCR_SPACE_API_URL").unwrap_or(defaults.ocr.api_url),
                api_key: var("OCR_SPACE_API_KEY").unwrap_or(defaults.ocr.api_key),
                default_language: var("OCR_DEFAULT_LANGUAGE")
                    .unwrap_or(defaults.ocr.default_language),
                default_engine: var("OCR_DEFAULT_ENGINE").unwrap_or(defaults.ocr.default_engine),
                concurrency: match var("OCR_CONCURRENCY") {
                    Some(value) => parse_var::<usize>("OCR_CONCURRENCY", value)?.max(1),
                    None => defaults.ocr.concurrency,
                },
                schedule,
                preprocess: match var("OCR_PREPROCESS") {
                    Some(value) => parse_bool("OCR_PREPROCESS", value)?,
                    None => defaults.ocr.preprocess,
                },
                request_timeout,
            },
        })
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, value: String) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::InvalidValue { name, value })
}

fn parse_bool(name: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { name, value }),
    }
}
