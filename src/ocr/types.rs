//! OCR Types
//!
//! Request, provider-response and outcome types for the batch relay.

use serde::{ser::SerializeMap, Deserialize, Serialize, Serializer};
use serde_json::Value;

use super::normalize::ImageDescriptor;

/// Request-wide recognition options, shared by every image in a batch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecognitionOptions {
    /// Provider language code (e.g. "jpn", "eng")
    pub language: String,
    /// Provider engine selector ("1", "2", ...)
    pub engine: String,
    /// Ask the provider for word overlay data
    pub overlay: bool,
    /// Grayscale/contrast/sharpen inline images before forwarding
    pub preprocess: bool,
}

/// One outbound recognition call
#[derive(Debug, Clone)]
pub struct RecognitionRequest {
    pub image: ImageDescriptor,
    pub options: RecognitionOptions,
}

/// Body returned by the provider. Only the fields the relay reads are modelled.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderResponse {
    #[serde(rename = "IsErroredOnProcessing", default)]
    pub is_errored_on_processing: Option<bool>,

    #[serde(rename = "ErrorMessage", default)]
    pub error_message: Option<Value>,

    #[serde(rename = "OCRExitCode", default)]
    pub ocr_exit_code: Option<Value>,

    #[serde(rename = "ParsedResults", default)]
    pub parsed_results: Option<Vec<ParsedResult>>,
}

/// A single parsed page/block
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ParsedResult {
    #[serde(rename = "ParsedText", default)]
    pub parsed_text: Option<String>,
}

impl ProviderResponse {
    pub fn is_errored(&self) -> bool {
        self.is_errored_on_processing == Some(true)
    }

    /// Text of every parsed block, missing text treated as empty
    pub fn text_blocks(&self) -> Vec<&str> {
        self.parsed_results
            .iter()
            .flatten()
            .map(|r| r.parsed_text.as_deref().unwrap_or(""))
            .collect()
    }

    /// Provider error message flattened to a single line
    pub fn error_text(&self) -> String {
        match &self.error_message {
            Some(Value::String(msg)) if !msg.is_empty() => msg.clone(),
            Some(Value::Array(parts)) if !parts.is_empty() => parts
                .iter()
                .map(|p| match p {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect::<Vec<_>>()
                .join("; "),
            _ => "OCR provider reported a processing error".to_string(),
        }
    }

    /// The non-sensitive fields forwarded to the caller
    pub fn summary(&self) -> ResponseSummary {
        ResponseSummary {
            ocr_exit_code: self.ocr_exit_code.clone(),
            parsed_results_count: self.parsed_results.as_ref().map_or(0, Vec::len),
        }
    }
}

/// Summary of the provider response. The full response is never forwarded.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResponseSummary {
    #[serde(rename = "OCRExitCode", skip_serializing_if = "Option::is_none")]
    pub ocr_exit_code: Option<Value>,
    #[serde(rename = "ParsedResultsCount")]
    pub parsed_results_count: usize,
}

/// Result for one input image
#[derive(Debug, Clone, PartialEq)]
pub enum RecognitionOutcome {
    Success {
        raw_text: String,
        keywords: Vec<String>,
        meta: ResponseSummary,
    },
    Failure {
        error: String,
    },
}

impl RecognitionOutcome {
    pub fn failure(error: impl ToString) -> Self {
        Self::Failure {
            error: error.to_string(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

impl Serialize for RecognitionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Success {
                raw_text,
                keywords,
                meta,
            } => {
                let mut map = serializer.serialize_map(Some(4))?;
                map.serialize_entry("success", &true)?;
                map.serialize_entry("raw_text", raw_text)?;
                map.serialize_entry("keywords", keywords)?;
                map.serialize_entry("ocrResponse", meta)?;
                map.end()
            }
            Self::Failure { error } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("success", &false)?;
                map.serialize_entry("error", error)?;
                map.end()
            }
        }
    }
}

/// Response body of the batch endpoint, one outcome per input image
#[derive(Debug, Serialize)]
pub struct BatchResponse {
    pub results: Vec<RecognitionOutcome>,
}

/// Per-image error types. These are always converted to a
/// [`RecognitionOutcome::Failure`], never returned to the HTTP layer.
#[derive(Debug, thiserror::Error)]
pub enum OcrError {
    #[error("{0}")]
    InvalidImage(String),

    #[error("{0}")]
    Transport(String),

    #[error("{0}")]
    InvalidResponse(String),

    #[error("{0}")]
    Processing(String),

    #[error("Image preprocessing failed: {0}")]
    Preprocessing(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serialization() {
        let outcome = RecognitionOutcome::Success {
            raw_text: "HELLO WORLD".to_string(),
            keywords: vec!["HELLO".to_string(), "WORLD".to_string()],
            meta: ResponseSummary {
                ocr_exit_code: Some(json!(1)),
                parsed_results_count: 1,
            },
        };

        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({
                "success": true,
                "raw_text": "HELLO WORLD",
                "keywords": ["HELLO", "WORLD"],
                "ocrResponse": { "OCRExitCode": 1, "ParsedResultsCount": 1 }
            })
        );
    }

    #[test]
    fn test_failure_serialization() {
        let outcome = RecognitionOutcome::failure("Unable to recognize the file type");
        assert_eq!(
            serde_json::to_value(&outcome).unwrap(),
            json!({ "success": false, "error": "Unable to recognize the file type" })
        );
    }

    #[test]
    fn test_missing_exit_code_is_omitted() {
        let summary = ProviderResponse::default().summary();
        assert_eq!(
            serde_json::to_value(&summary).unwrap(),
            json!({ "ParsedResultsCount": 0 })
        );
    }

    #[test]
    fn test_provider_response_parsing() {
        let response: ProviderResponse = serde_json::from_value(json!({
            "ParsedResults": [
                { "ParsedText": "page one", "FileParseExitCode": 1 },
                { "ParsedText": null },
                {}
            ],
            "OCRExitCode": 1,
            "IsErroredOnProcessing": false,
            "ProcessingTimeInMilliseconds": "343",
            "SearchablePDFURL": "Searchable PDF not generated as it was not requested."
        }))
        .unwrap();

        assert!(!response.is_errored());
        assert_eq!(response.text_blocks(), vec!["page one", "", ""]);
        assert_eq!(response.summary().parsed_results_count, 3);
        assert_eq!(response.summary().ocr_exit_code, Some(json!(1)));
    }

    #[test]
    fn test_error_text_variants() {
        let array: ProviderResponse = serde_json::from_value(json!({
            "IsErroredOnProcessing": true,
            "ErrorMessage": ["E216: Unable to detect the file extension", "Invalid image"]
        }))
        .unwrap();
        assert_eq!(
            array.error_text(),
            "E216: Unable to detect the file extension; Invalid image"
        );

        let string: ProviderResponse = serde_json::from_value(json!({
            "IsErroredOnProcessing": true,
            "ErrorMessage": "Timed out"
        }))
        .unwrap();
        assert_eq!(string.error_text(), "Timed out");

        let missing: ProviderResponse =
            serde_json::from_value(json!({ "IsErroredOnProcessing": true })).unwrap();
        assert_eq!(
            missing.error_text(),
            "OCR provider reported a processing error"
        );
    }
}
