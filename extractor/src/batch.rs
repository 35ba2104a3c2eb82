// extractor/src/batch.rs
//!
//! Batch driver: every PDF in a directory, one document at a time.
//!
//! A failing document is logged and reported in its outcome; it never aborts
//! the batch. Records are accumulated in file-name order.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::config::ExtractorConfig;
use crate::document_processing::{find_files_by_extension, load_document, DocumentReader, RelevanceFilter};
use crate::model_adapters::ExtractionClient;
use crate::orchestrator::{ExtractionContext, Orchestrator};
use crate::schemas::AssetRecord;
use crate::Result;

/// How one document ended.
#[derive(Debug, Clone, PartialEq)]
pub enum DocumentStatus {
    /// At least one pass succeeded; may still carry zero records.
    Extracted { records: usize },
    /// Every pass ran out of attempts.
    Exhausted { last_error: Option<String> },
    /// The document could not be read at all.
    Unreadable { reason: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct DocumentOutcome {
    pub filename: String,
    pub path: PathBuf,
    pub status: DocumentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub records: Vec<AssetRecord>,
    pub outcomes: Vec<DocumentOutcome>,
}

impl BatchReport {
    pub fn documents(&self) -> usize {
        self.outcomes.len()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|outcome| !matches!(outcome.status, DocumentStatus::Extracted { .. }))
            .count()
    }
}

pub struct BatchDriver<R, C> {
    reader: R,
    client: C,
    config: ExtractorConfig,
}

impl<R: DocumentReader, C: ExtractionClient> BatchDriver<R, C> {
    pub fn new(reader: R, client: C, config: ExtractorConfig) -> Self {
        Self {
            reader,
            client,
            config,
        }
    }

    /// Process every `.pdf` directly inside `input_dir`.
    pub fn run(&self, input_dir: impl AsRef<Path>) -> Result<BatchReport> {
        let input_dir = input_dir.as_ref();
        let files = find_files_by_extension(input_dir, "pdf")?;
        info!(
            input_dir = %input_dir.display(),
            documents = files.len(),
            "starting batch"
        );

        let filter = RelevanceFilter::new(&self.config.pipeline.relevance_keywords);
        let orchestrator = Orchestrator::new(&self.client, &self.config);

        let mut report = BatchReport::default();
        for path in files {
            let filename = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string());

            let status = match load_document(&self.reader, &path, &filter) {
                Ok(document) => {
                    let extraction = orchestrator.extract_document(ExtractionContext {
                        filename: &filename,
                        document: &document,
                    });
                    if extraction.is_exhausted() {
                        warn!(filename = filename.as_str(), "no records extracted");
                        DocumentStatus::Exhausted {
                            last_error: extraction.failure_reason(),
                        }
                    } else {
                        let count = extraction.records.len();
                        report.records.extend(extraction.records);
                        DocumentStatus::Extracted { records: count }
                    }
                }
                Err(err) => {
                    error!(filename = filename.as_str(), error = %err, "skipping document");
                    DocumentStatus::Unreadable {
                        reason: err.to_string(),
                    }
                }
            };

            report.outcomes.push(DocumentOutcome {
                filename,
                path,
                status,
            });
        }

        info!(
            documents = report.documents(),
            failed = report.failed(),
            records = report.records.len(),
            "batch finished"
        );
        Ok(report)
    }
}
