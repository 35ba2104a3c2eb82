use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

use asset_extractor::api_keys::{load_api_key, redact};
use asset_extractor::export::{write_jsonl, write_xlsx};
use asset_extractor::{
    BatchDriver, DocumentStatus, ExtractorConfig, MergeStrategy, OpenAiChatAdapter, PassMode,
    PdfExtractor,
};

/// Extract real-estate asset records from a directory of PDFs into a spreadsheet.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// TOML configuration file. Every key is optional.
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Directory containing the PDF files.
    #[arg(long)]
    input_dir: Option<PathBuf>,

    /// Output workbook path.
    #[arg(long, short)]
    output: Option<PathBuf>,

    /// Also write the records as JSON lines to this path.
    #[arg(long)]
    jsonl: Option<PathBuf>,

    /// File containing the bare API key.
    #[arg(long)]
    api_key_file: Option<PathBuf>,

    /// Model name sent to the chat completions API.
    #[arg(long)]
    model: Option<String>,

    /// Attempts per extraction pass.
    #[arg(long)]
    max_attempts: Option<u32>,

    #[arg(long, value_enum)]
    passes: Option<PassArg>,

    #[arg(long, value_enum)]
    merge_strategy: Option<MergeArg>,

    /// Ask the model to correct JSON that fails to decode.
    #[arg(long)]
    repair_json: bool,

    /// Debug logging (overridden by RUST_LOG).
    #[arg(long, short)]
    verbose: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PassArg {
    Single,
    Dual,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum MergeArg {
    CompletenessWins,
    FieldWise,
}

impl Cli {
    fn apply(&self, config: &mut ExtractorConfig) {
        if let Some(dir) = &self.input_dir {
            config.input_dir = dir.clone();
        }
        if let Some(output) = &self.output {
            config.output_file = output.clone();
        }
        if let Some(jsonl) = &self.jsonl {
            config.jsonl_output = Some(jsonl.clone());
        }
        if let Some(path) = &self.api_key_file {
            config.api_key_file = path.clone();
        }
        if let Some(model) = &self.model {
            config.model.model = model.clone();
        }
        if let Some(max_attempts) = self.max_attempts {
            config.retry.max_attempts = max_attempts;
        }
        if let Some(passes) = self.passes {
            config.pipeline.passes = match passes {
                PassArg::Single => PassMode::Single,
                PassArg::Dual => PassMode::Dual,
            };
        }
        if let Some(strategy) = self.merge_strategy {
            config.pipeline.merge_strategy = match strategy {
                MergeArg::CompletenessWins => MergeStrategy::CompletenessWins,
                MergeArg::FieldWise => MergeStrategy::FieldWise,
            };
        }
        if self.repair_json {
            config.pipeline.repair_json = true;
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut config = match &cli.config {
        Some(path) => ExtractorConfig::load(path)
            .with_context(|| format!("failed to load config: {}", path.display()))?,
        None => ExtractorConfig::default(),
    };
    cli.apply(&mut config);
    config.validate().context("invalid configuration")?;

    let api_key = load_api_key(&config.api_key_file).context("failed to load API key")?;
    tracing::info!(key = %redact(&api_key), model = config.model.model.as_str(), "loaded credentials");

    let client = OpenAiChatAdapter::new(api_key, &config.model);
    let input_dir = config.input_dir.clone();
    let output_file = config.output_file.clone();
    let jsonl_output = config.jsonl_output.clone();

    let driver = BatchDriver::new(PdfExtractor::new(), client, config);
    let report = driver
        .run(&input_dir)
        .with_context(|| format!("failed to scan input directory: {}", input_dir.display()))?;

    write_xlsx(&report.records, &output_file)
        .with_context(|| format!("failed to write workbook: {}", output_file.display()))?;
    if let Some(path) = &jsonl_output {
        write_jsonl(&report.records, path)
            .with_context(|| format!("failed to write JSONL: {}", path.display()))?;
    }

    for outcome in &report.outcomes {
        match &outcome.status {
            DocumentStatus::Extracted { .. } => {}
            DocumentStatus::Exhausted { last_error } => eprintln!(
                "  {}: no records ({})",
                outcome.filename,
                last_error.as_deref().unwrap_or("attempts exhausted")
            ),
            DocumentStatus::Unreadable { reason } => {
                eprintln!("  {}: unreadable ({})", outcome.filename, reason)
            }
        }
    }
    println!(
        "Extracted {} records from {} documents ({} failed) into {}",
        report.records.len(),
        report.documents(),
        report.failed(),
        output_file.display()
    );

    Ok(())
}
