// extractor/src/orchestrator.rs
//!
//! Per-document extraction: prompting, bounded retry and pass reconciliation.
//!
//! A document goes through up to two passes. The table pass sends only the
//! rendered relevant tables; the full-text pass sends the page text with
//! tables interleaved. Each pass is an explicit retry loop with exponential
//! backoff. The records of the passes that ran are merged so every Asset
//! Name appears at most once per document.

use std::thread;

use tracing::{debug, info, warn};

use crate::config::{ExtractorConfig, PassMode, PipelineConfig, RetryPolicy};
use crate::document_processing::{ContentAssembler, InputStrategy};
use crate::merge::merge_records;
use crate::model_adapters::{build_extraction_prompt, build_repair_prompt, ExtractionClient};
use crate::parser;
use crate::schemas::{AssetRecord, ExtractedDocument};
use crate::{ExtractError, MalformedReason, Result};

/// Where a retry loop stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptState {
    Attempting,
    Succeeded,
    Exhausted,
}

/// One call to the extraction service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtractionAttempt {
    /// 1-based attempt number within the pass.
    pub number: u32,
    pub strategy: InputStrategy,
}

/// Result of one pass through the retry loop.
#[derive(Debug, Clone)]
pub struct RetryOutcome {
    pub state: AttemptState,
    pub records: Vec<AssetRecord>,
    pub attempts: Vec<ExtractionAttempt>,
    pub last_error: Option<String>,
}

impl RetryOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == AttemptState::Succeeded
    }
}

/// What one document produced across its passes.
#[derive(Debug, Clone)]
pub struct DocumentExtraction {
    pub records: Vec<AssetRecord>,
    /// `None` when the pass was not run.
    pub table_pass: Option<RetryOutcome>,
    pub text_pass: RetryOutcome,
}

impl DocumentExtraction {
    /// Last error of every failed pass, full-text pass first.
    pub fn failure_reason(&self) -> Option<String> {
        let reasons: Vec<String> = [
            ("full-text pass", Some(&self.text_pass)),
            ("table pass", self.table_pass.as_ref()),
        ]
        .into_iter()
        .filter_map(|(label, outcome)| {
            let outcome = outcome.filter(|outcome| !outcome.succeeded())?;
            let error = outcome.last_error.as_deref()?;
            Some(format!("{}: {}", label, error))
        })
        .collect();

        (!reasons.is_empty()).then(|| reasons.join("; "))
    }

    /// Every pass that ran ended exhausted.
    pub fn is_exhausted(&self) -> bool {
        !self.text_pass.succeeded()
            && self
                .table_pass
                .as_ref()
                .map_or(true, |outcome| !outcome.succeeded())
    }

    /// Number of service calls made for extraction prompts.
    pub fn attempt_count(&self) -> usize {
        self.text_pass.attempts.len()
            + self
                .table_pass
                .as_ref()
                .map_or(0, |outcome| outcome.attempts.len())
    }
}

/// Per-document inputs passed explicitly through the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct ExtractionContext<'a> {
    pub filename: &'a str,
    pub document: &'a ExtractedDocument,
}

pub struct Orchestrator<'c> {
    client: &'c dyn ExtractionClient,
    retry: RetryPolicy,
    pipeline: PipelineConfig,
    temperature: f32,
    assembler: ContentAssembler,
}

impl<'c> Orchestrator<'c> {
    pub fn new(client: &'c dyn ExtractionClient, config: &ExtractorConfig) -> Self {
        Self {
            client,
            retry: config.retry.clone(),
            pipeline: config.pipeline.clone(),
            temperature: config.model.temperature,
            assembler: ContentAssembler::new(config.pipeline.max_content_chars),
        }
    }

    /// Run the configured passes over one document and reconcile them.
    pub fn extract_document(&self, ctx: ExtractionContext<'_>) -> DocumentExtraction {
        let table_pass = match self.pipeline.passes {
            PassMode::Dual if !ctx.document.tables.is_empty() => {
                Some(self.run_pass(ctx, InputStrategy::TablesOnly))
            }
            PassMode::Dual => {
                debug!(filename = ctx.filename, "no relevant tables, skipping table pass");
                None
            }
            PassMode::Single => None,
        };
        let text_pass = self.run_pass(ctx, InputStrategy::FullText);

        let table_records = table_pass
            .as_ref()
            .map(|outcome| outcome.records.clone())
            .unwrap_or_default();
        // Always merged: a single pass can still repeat an Asset Name.
        let records = merge_records(
            table_records,
            text_pass.records.clone(),
            self.pipeline.merge_strategy,
        );

        info!(
            filename = ctx.filename,
            records = records.len(),
            "document extraction finished"
        );

        DocumentExtraction {
            records,
            table_pass,
            text_pass,
        }
    }

    /// Bounded retry loop for one pass.
    pub fn run_pass(&self, ctx: ExtractionContext<'_>, initial: InputStrategy) -> RetryOutcome {
        let max_attempts = self.retry.max_attempts.max(1);
        let mut state = AttemptState::Attempting;
        let mut attempts = Vec::new();
        let mut records = Vec::new();
        let mut last_error = None;

        while state == AttemptState::Attempting {
            let attempt = ExtractionAttempt {
                number: attempts.len() as u32 + 1,
                strategy: self.strategy_for(initial, attempts.len() as u32 + 1),
            };
            attempts.push(attempt);

            match self.attempt(ctx, attempt.strategy) {
                Ok(parsed) => {
                    info!(
                        filename = ctx.filename,
                        attempt = attempt.number,
                        strategy = attempt.strategy.as_str(),
                        records = parsed.len(),
                        "extraction attempt succeeded"
                    );
                    records = parsed;
                    state = AttemptState::Succeeded;
                }
                Err(err) if err.is_retryable() && attempt.number < max_attempts => {
                    let delay = self.retry.backoff(attempt.number);
                    warn!(
                        filename = ctx.filename,
                        attempt = attempt.number,
                        strategy = attempt.strategy.as_str(),
                        error = %err,
                        delay_ms = delay.as_millis() as u64,
                        "extraction attempt failed, retrying"
                    );
                    last_error = Some(err.to_string());
                    if !delay.is_zero() {
                        thread::sleep(delay);
                    }
                }
                Err(err) => {
                    warn!(
                        filename = ctx.filename,
                        attempt = attempt.number,
                        strategy = attempt.strategy.as_str(),
                        error = %err,
                        "extraction attempts exhausted"
                    );
                    last_error = Some(err.to_string());
                    state = AttemptState::Exhausted;
                }
            }
        }

        RetryOutcome {
            state,
            records,
            attempts,
            last_error,
        }
    }

    fn strategy_for(&self, initial: InputStrategy, attempt: u32) -> InputStrategy {
        match initial {
            InputStrategy::TablesOnly if attempt > 1 && self.pipeline.fallback_to_full_text => {
                InputStrategy::FullText
            }
            strategy => strategy,
        }
    }

    /// One prompt, one call, one parse; plus an optional repair call.
    fn attempt(
        &self,
        ctx: ExtractionContext<'_>,
        strategy: InputStrategy,
    ) -> Result<Vec<AssetRecord>> {
        let content = self
            .assembler
            .assemble(strategy, &ctx.document.pages, &ctx.document.tables);
        let prompt = build_extraction_prompt(&content);
        let raw = self.client.complete(&prompt, self.temperature)?;

        match parser::parse_records(&raw, ctx.filename) {
            Err(err @ ExtractError::MalformedOutput(MalformedReason::Decode(_)))
                if self.pipeline.repair_json =>
            {
                let Some(span) = parser::bracket_span(&raw) else {
                    return Err(err);
                };
                self.repair(span, ctx.filename).map_err(|repair_err| {
                    debug!(
                        filename = ctx.filename,
                        error = %repair_err,
                        "JSON repair failed"
                    );
                    err
                })
            }
            other => other,
        }
    }

    fn repair(&self, json_text: &str, filename: &str) -> Result<Vec<AssetRecord>> {
        debug!(filename, chars = json_text.len(), "requesting JSON repair");
        let raw = self
            .client
            .complete(&build_repair_prompt(json_text), self.temperature)?;
        parser::parse_records(&raw, filename)
    }
}
