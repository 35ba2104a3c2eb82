// In extractor/src/lib.rs

use std::path::PathBuf;

/// Why a model response could not be turned into asset records.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MalformedReason {
    #[error("no JSON array found in model output")]
    NoJsonArray,
    #[error("JSON decode failed: {0}")]
    Decode(String),
    #[error("decoded JSON is not an array of objects")]
    NotArrayOfObjects,
}

// The library error type
#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("document unreadable: {path}: {reason}")]
    DocumentUnreadable { path: PathBuf, reason: String },
    #[error("extraction service error: {0}")]
    Service(String),
    #[error("malformed model output: {0}")]
    MalformedOutput(MalformedReason),
    #[error("invalid record: {0}")]
    InvalidRecord(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("cannot read API key from {path}: {reason}")]
    Credentials { path: PathBuf, reason: String },
    #[error("export failed: {0}")]
    Export(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl ExtractError {
    /// Errors the retry controller is allowed to retry.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractError::Service(_) | ExtractError::MalformedOutput(_))
    }
}

pub type Result<T, E = ExtractError> = std::result::Result<T, E>;

pub mod api_keys;
pub mod batch;
pub mod config;
pub mod document_processing;
pub mod export;
pub mod merge;
pub mod model_adapters;
pub mod orchestrator;
pub mod parser;

pub use document_processing::schemas;

pub use batch::{BatchDriver, BatchReport, DocumentOutcome, DocumentStatus};
pub use config::{ExtractorConfig, MergeStrategy, PassMode, RetryPolicy};
pub use document_processing::{DocumentReader, PdfExtractor};
pub use model_adapters::{ExtractionClient, OpenAiChatAdapter, Prompt};
pub use schemas::{AssetField, AssetRecord, ExtractedDocument, FieldValue, TableCandidate};
