//! Application state management

use std::sync::Arc;

use crate::config::Config;
use crate::ocr::{OcrError, OcrRelay, OcrRelayConfig, OcrSpaceProvider, OcrSpaceSettings};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to initialize OCR provider: {0}")]
    ProviderInit(#[from] OcrError),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    relay: OcrRelay,
}

impl AppState {
    /// Create the application state with the OCR.space provider described by `config`
    pub fn new(config: Config) -> Result<Self, StateError> {
        let provider = OcrSpaceProvider::new(OcrSpaceSettings {
            api_url: config.ocr.api_url.clone(),
            api_key: config.ocr.api_key.clone(),
            timeout: config.ocr.request_timeout,
        })?;

        let relay = OcrRelay::new(
            Arc::new(provider),
            OcrRelayConfig {
                concurrency: config.ocr.concurrency,
                schedule: config.ocr.schedule,
            },
        );

        Ok(Self::with_relay(config, relay))
    }

    /// Create the application state around an existing relay
    pub fn with_relay(config: Config, relay: OcrRelay) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, relay }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the OCR relay
    pub fn relay(&self) -> &OcrRelay {
        &self.inner.relay
    }
}
