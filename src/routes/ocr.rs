//! Batch OCR route
//!
//! `POST /api/ocr` accepts `{ "images": [...] }` or `{ "image": "..." }` plus
//! optional `language`, `OCREngine`, `isOverlayRequired` and `preprocess`, and
//! answers `{ "results": [...] }` with one entry per image in input order.

use std::any::Any;
use std::panic::AssertUnwindSafe;

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use futures::FutureExt;
use serde_json::Value;
use tracing::Instrument;

use crate::config::OcrConfig;
use crate::error::{AppError, Result};
use crate::ocr::{BatchResponse, RecognitionOptions};
use crate::state::AppState;

const INVALID_JSON: &str = "Invalid JSON body";
const MISSING_IMAGES: &str = "Send { images: [dataUrlString, ...] }";
const NO_IMAGES: &str = "No images provided";

/// Create the OCR router
pub fn router() -> Router<AppState> {
    Router::new().route("/", post(recognize_batch))
}

/// A validated batch request
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    /// Image entries in input order. Non-string entries are kept so they can
    /// fail in place.
    pub images: Vec<Value>,
    pub options: RecognitionOptions,
}

impl BatchRequest {
    /// Validate a request body, filling unset options from `defaults`
    pub fn from_body(body: &Value, defaults: &OcrConfig) -> Result<Self> {
        if !is_truthy(body) {
            return Err(AppError::BadRequest(INVALID_JSON.to_string()));
        }

        let images: Vec<Value> = match (body.get("image"), body.get("images")) {
            (Some(Value::String(image)), _) if !image.is_empty() => {
                vec![Value::String(image.clone())]
            }
            (_, Some(Value::Array(entries))) => {
                entries.iter().filter(|v| is_truthy(v)).cloned().collect()
            }
            _ => return Err(AppError::BadRequest(MISSING_IMAGES.to_string())),
        };

        if images.is_empty() {
            return Err(AppError::BadRequest(NO_IMAGES.to_string()));
        }

        let options = RecognitionOptions {
            language: form_value(body.get("language"))
                .unwrap_or_else(|| defaults.default_language.clone()),
            engine: form_value(body.get("OCREngine"))
                .unwrap_or_else(|| defaults.default_engine.clone()),
            overlay: body.get("isOverlayRequired").is_some_and(is_truthy),
            preprocess: match body.get("preprocess") {
                None | Some(Value::Null) => defaults.preprocess,
                Some(flag) => is_truthy(flag),
            },
        };

        Ok(Self { images, options })
    }
}

/// Recognize a batch of images
///
/// POST /api/ocr
async fn recognize_batch(
    State(state): State<AppState>,
    payload: std::result::Result<Json<Value>, JsonRejection>,
) -> Result<Json<BatchResponse>> {
    let Json(body) = payload?;
    let request = BatchRequest::from_body(&body, &state.config().ocr)?;

    let span = tracing::info_span!(
        "ocr_batch",
        request_id = %uuid::Uuid::new_v4(),
        images = request.images.len()
    );

    let results = AssertUnwindSafe(
        state
            .relay()
            .process(request.images, &request.options)
            .instrument(span),
    )
    .catch_unwind()
    .await
    .map_err(|panic| AppError::Internal(panic_message(panic)))?;

    Ok(Json(BatchResponse { results }))
}

/// JavaScript-style truthiness, used for the loosely typed request fields
fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Stringify an option the way it is sent in a form field. Absent or null
/// fields yield `None`.
fn form_value(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "Unexpected failure while processing images".to_string()
    }
}
