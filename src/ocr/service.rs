//! Batch Relay
//!
//! Fans a list of images out to the OCR provider with bounded concurrency and
//! reassembles one outcome per image, in input order.

use std::sync::Arc;

use serde_json::Value;

use super::{
    fanout::{FanOut, Schedule},
    keywords::{join_blocks, split_keywords},
    normalize::{self, ImageDescriptor},
    provider::OcrProviderTrait,
    types::{OcrError, ProviderResponse, RecognitionOptions, RecognitionOutcome, RecognitionRequest},
};

/// Message used for entries that are not strings
pub const NON_STRING_IMAGE: &str = "Each image must be a string (dataURL/base64/url)";

/// Relay configuration
#[derive(Debug, Clone, Copy)]
pub struct OcrRelayConfig {
    /// Maximum concurrent provider calls per request
    pub concurrency: usize,
    pub schedule: Schedule,
}

impl Default for OcrRelayConfig {
    fn default() -> Self {
        Self {
            concurrency: 3,
            schedule: Schedule::Batched,
        }
    }
}

/// Stateless batch relay. Cheap to clone; holds no per-request state.
#[derive(Clone)]
pub struct OcrRelay {
    provider: Arc<dyn OcrProviderTrait>,
    fanout: FanOut,
}

impl OcrRelay {
    pub fn new(provider: Arc<dyn OcrProviderTrait>, config: OcrRelayConfig) -> Self {
        Self {
            provider,
            fanout: FanOut::new(config.concurrency, config.schedule),
        }
    }

    pub fn fanout(&self) -> FanOut {
        self.fanout
    }

    /// Recognize every entry and return exactly one outcome per entry.
    ///
    /// Entries are raw JSON values; anything that is not a string becomes a
    /// failure at its own index without a provider call.
    pub async fn process(
        &self,
        entries: Vec<Value>,
        options: &RecognitionOptions,
    ) -> Vec<RecognitionOutcome> {
        let total = entries.len();
        tracing::info!(
            "Relaying {} image(s) to {} in {} batch(es)",
            total,
            self.provider.name(),
            self.fanout.batch_count(total)
        );

        let outcomes = self
            .fanout
            .run(entries, |index, entry| async move {
                let outcome = match entry {
                    Value::String(raw) => self.recognize_one(&raw, options).await,
                    _ => RecognitionOutcome::failure(OcrError::InvalidImage(
                        NON_STRING_IMAGE.to_string(),
                    )),
                };
                if let RecognitionOutcome::Failure { error } = &outcome {
                    tracing::warn!("Image {} failed: {}", index, error);
                }
                outcome
            })
            .await;

        let succeeded = outcomes.iter().filter(|o| o.is_success()).count();
        tracing::info!("Relay finished: {}/{} succeeded", succeeded, total);

        outcomes
    }

    /// Recognize a single image string, containing every failure
    pub async fn recognize_one(&self, raw: &str, options: &RecognitionOptions) -> RecognitionOutcome {
        match self.try_recognize(raw, options).await {
            Ok(outcome) => outcome,
            Err(e) => RecognitionOutcome::failure(e),
        }
    }

    async fn try_recognize(
        &self,
        raw: &str,
        options: &RecognitionOptions,
    ) -> Result<RecognitionOutcome, OcrError> {
        let mut descriptor = ImageDescriptor::parse(raw);
        tracing::debug!("Classified image as {}", descriptor.kind());

        if options.preprocess {
            descriptor = tokio::task::spawn_blocking(move || normalize::preprocess(&descriptor))
                .await
                .map_err(|e| OcrError::Preprocessing(format!("worker failed: {}", e)))??;
        }

        let request = RecognitionRequest {
            image: descriptor,
            options: options.clone(),
        };
        let response = self.provider.recognize(&request).await?;

        into_outcome(response)
    }
}

/// Convert a provider response into the caller-facing outcome
fn into_outcome(response: ProviderResponse) -> Result<RecognitionOutcome, OcrError> {
    if response.is_errored() {
        return Err(OcrError::Processing(response.error_text()));
    }

    let raw_text = join_blocks(&response.text_blocks());
    let keywords = split_keywords(&raw_text);

    Ok(RecognitionOutcome::Success {
        raw_text,
        keywords,
        meta: response.summary(),
    })
}
