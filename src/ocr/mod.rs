//! OCR Module
//!
//! Relays images to a hosted OCR provider (OCR.space) in bounded concurrent
//! batches and returns one outcome per image.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use ocr_relay_server::ocr::{OcrRelay, OcrRelayConfig, OcrSpaceProvider, OcrSpaceSettings};
//!
//! let provider = OcrSpaceProvider::new(OcrSpaceSettings {
//!     api_url: "https://api.ocr.space/parse/image".into(),
//!     api_key: key,
//!     timeout: None,
//! })?;
//! let relay = OcrRelay::new(Arc::new(provider), OcrRelayConfig::default());
//!
//! let results = relay.process(images, &options).await;
//! assert_eq!(results.len(), images_len);
//! ```

mod fanout;
mod keywords;
mod normalize;
mod provider;
mod service;
mod types;

pub use fanout::{FanOut, Schedule};
pub use normalize::{preprocess, ImageDescriptor, ImageField};
pub use keywords::{join_blocks, split_keywords, BLOCK_SEPARATOR};
pub use provider::{OcrProviderTrait, OcrSpaceProvider, OcrSpaceSettings};
pub use service::{OcrRelay, OcrRelayConfig, NON_STRING_IMAGE};
pub use types::{
    BatchResponse, OcrError, ParsedResult, ProviderResponse, RecognitionOptions,
    RecognitionOutcome, RecognitionRequest, ResponseSummary,
};
