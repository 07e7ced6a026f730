//! OCR Providers
//!
//! Defines the provider trait and the OCR.space HTTP implementation.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::Form;

use super::types::{OcrError, ProviderResponse, RecognitionRequest};

/// OCR provider trait
#[async_trait]
pub trait OcrProviderTrait: Send + Sync {
    /// Short provider name used in logs
    fn name(&self) -> &str;

    /// Send one image to the provider and return its parsed response
    async fn recognize(&self, request: &RecognitionRequest) -> Result<ProviderResponse, OcrError>;
}

/// OCR.space provider settings, injected at construction
#[derive(Debug, Clone)]
pub struct OcrSpaceSettings {
    pub api_url: String,
    pub api_key: String,
    pub timeout: Option<Duration>,
}

/// OCR.space (`/parse/image`) provider
pub struct OcrSpaceProvider {
    client: reqwest::Client,
    api_url: String,
    api_key: String,
}

impl OcrSpaceProvider {
    pub fn new(settings: OcrSpaceSettings) -> Result<Self, OcrError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = settings.timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| OcrError::Transport(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_url: settings.api_url,
            api_key: settings.api_key,
        })
    }

    /// Multipart fields in the order they are sent
    pub fn form_fields(&self, request: &RecognitionRequest) -> Vec<(&'static str, String)> {
        let options = &request.options;
        let image = request.image.to_field();

        vec![
            ("apikey", self.api_key.clone()),
            ("language", options.language.clone()),
            ("OCREngine", options.engine.clone()),
            (
                "isOverlayRequired",
                if options.overlay { "true" } else { "false" }.to_string(),
            ),
            (image.name(), image.value().to_string()),
        ]
    }
}

#[async_trait]
impl OcrProviderTrait for OcrSpaceProvider {
    fn name(&self) -> &str {
        "ocr.space"
    }

    async fn recognize(&self, request: &RecognitionRequest) -> Result<ProviderResponse, OcrError> {
        let form = self
            .form_fields(request)
            .into_iter()
            .fold(Form::new(), |form, (name, value)| form.text(name, value));

        let response = self
            .client
            .post(&self.api_url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| OcrError::Transport(format!("Failed to call OCR provider: {}", e)))?;

        // Errors are reported in the body; the status only annotates parse failures.
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OcrError::Transport(format!("Failed to read OCR response: {}", e)))?;

        serde_json::from_str(&body).map_err(|e| {
            OcrError::InvalidResponse(format!(
                "OCR provider returned {} with an unreadable body: {}",
                status, e
            ))
        })
    }
}
