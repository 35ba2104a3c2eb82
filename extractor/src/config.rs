// extractor/src/config.rs
//!
//! Extractor configuration
//!
//! Loaded from a TOML file where every key is optional; anything missing falls
//! back to the defaults below. The command line can override single values
//! after loading, and `validate` runs before any document is touched.
//!
//! ```toml
//! input_dir = "./input"
//! output_file = "./output/extracted.xlsx"
//!
//! [model]
//! model = "gpt-4o"
//! temperature = 0.2
//!
//! [retry]
//! max_attempts = 3
//!
//! [pipeline]
//! passes = "dual"
//! merge_strategy = "completeness-wins"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::document_processing::processors::relevance::DEFAULT_KEYWORDS;
use crate::{ExtractError, Result};

/// Highest temperature that still keeps the model close to the schema.
///
/// Advisory: `validate` accepts higher values and only logs a warning.
pub const MAX_RECOMMENDED_TEMPERATURE: f32 = 0.2;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractorConfig {
    pub input_dir: PathBuf,
    pub output_file: PathBuf,
    /// Optional JSONL dump of the same records.
    pub jsonl_output: Option<PathBuf>,
    pub api_key_file: PathBuf,
    pub model: ModelConfig,
    pub retry: RetryPolicy,
    pub pipeline: PipelineConfig,
}

impl Default for ExtractorConfig {
    fn default() -> Self {
        Self {
            input_dir: PathBuf::from("./input"),
            output_file: PathBuf::from("./output/extracted.xlsx"),
            jsonl_output: None,
            api_key_file: PathBuf::from("api_key.txt"),
            model: ModelConfig::default(),
            retry: RetryPolicy::default(),
            pipeline: PipelineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of an OpenAI-compatible API.
    pub api_base: String,
    pub model: String,
    pub temperature: f32,
    pub timeout_secs: u64,
    pub max_tokens: u32,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o".to_string(),
            temperature: MAX_RECOMMENDED_TEMPERATURE,
            timeout_secs: 120,
            max_tokens: 4096,
        }
    }
}

/// Attempt bound and exponential backoff between retried calls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub initial_backoff_ms: u64,
    pub backoff_multiplier: f64,
    pub max_backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_backoff_ms: 4_000,
            backoff_multiplier: 2.0,
            max_backoff_ms: 10_000,
        }
    }
}

impl RetryPolicy {
    /// Policy without any waiting between attempts.
    pub fn immediate(max_attempts: u32) -> Self {
        Self {
            max_attempts,
            initial_backoff_ms: 0,
            backoff_multiplier: 1.0,
            max_backoff_ms: 0,
        }
    }

    /// Delay before retry number `retry` (1 for the second attempt).
    pub fn backoff(&self, retry: u32) -> Duration {
        if retry == 0 {
            return Duration::ZERO;
        }
        let exponent = i32::try_from(retry - 1).unwrap_or(i32::MAX);
        let delay = self.initial_backoff_ms as f64 * self.backoff_multiplier.powi(exponent);
        let capped = delay.min(self.max_backoff_ms as f64).max(0.0);
        Duration::from_millis(capped as u64)
    }
}

/// Which extraction passes run per document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PassMode {
    /// Full-text pass only.
    Single,
    /// Tables-only pass and full-text pass, reconciled.
    Dual,
}

/// How two records with the same Asset Name are reconciled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MergeStrategy {
    /// Keep the record with more populated fields.
    CompletenessWins,
    /// Keep the more complete record and fill its gaps from the other.
    FieldWise,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub passes: PassMode,
    pub merge_strategy: MergeStrategy,
    /// Retries of the tables pass send the full text instead.
    pub fallback_to_full_text: bool,
    /// Ask the model to correct JSON that fails to decode.
    pub repair_json: bool,
    pub max_content_chars: usize,
    pub relevance_keywords: Vec<String>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            passes: PassMode::Dual,
            merge_strategy: MergeStrategy::CompletenessWins,
            fallback_to_full_text: true,
            repair_json: false,
            max_content_chars: 120_000,
            relevance_keywords: DEFAULT_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl ExtractorConfig {
    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let toml_str = std::fs::read_to_string(path).map_err(|err| {
            ExtractError::Config(format!("failed to read {}: {}", path.display(), err))
        })?;
        Self::from_toml_str(&toml_str)
    }

    /// Parse configuration from a TOML string
    pub fn from_toml_str(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str).map_err(|err| ExtractError::Config(err.to_string()))
    }

    /// Reject values the pipeline cannot run with.
    ///
    /// A temperature above [`MAX_RECOMMENDED_TEMPERATURE`] is allowed with a
    /// warning; only negative or NaN temperatures are errors.
    pub fn validate(&self) -> Result<()> {
        if self.retry.max_attempts == 0 {
            return Err(ExtractError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        if self.retry.backoff_multiplier < 1.0 {
            return Err(ExtractError::Config(
                "retry.backoff_multiplier must be at least 1.0".to_string(),
            ));
        }
        if self.model.temperature.is_nan() || self.model.temperature < 0.0 {
            return Err(ExtractError::Config(
                "model.temperature must be a non-negative number".to_string(),
            ));
        }
        if self.pipeline.max_content_chars == 0 {
            return Err(ExtractError::Config(
                "pipeline.max_content_chars must be positive".to_string(),
            ));
        }
        if self.model.model.trim().is_empty() {
            return Err(ExtractError::Config("model.model must not be empty".to_string()));
        }

        if self.model.temperature > MAX_RECOMMENDED_TEMPERATURE {
            warn!(
                temperature = self.model.temperature,
                "temperature above {} makes schema violations more likely",
                MAX_RECOMMENDED_TEMPERATURE
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = ExtractorConfig::from_toml_str("").unwrap();
        assert_eq!(config, ExtractorConfig::default());
        assert_eq!(config.retry.max_attempts, 3);
        assert_eq!(config.pipeline.relevance_keywords.len(), 4);
        config.validate().unwrap();
    }

    #[test]
    fn test_partial_sections_override_defaults() {
        let config = ExtractorConfig::from_toml_str(
            r#"
            input_dir = "/data/pdfs"

            [retry]
            max_attempts = 4

            [pipeline]
            passes = "single"
            merge_strategy = "field-wise"
            "#,
        )
        .unwrap();

        assert_eq!(config.input_dir, PathBuf::from("/data/pdfs"));
        assert_eq!(config.retry.max_attempts, 4);
        assert_eq!(config.retry.initial_backoff_ms, 4_000);
        assert_eq!(config.pipeline.passes, PassMode::Single);
        assert_eq!(config.pipeline.merge_strategy, MergeStrategy::FieldWise);
        assert_eq!(config.model.model, "gpt-4o");
    }

    #[test]
    fn test_load_from_file() -> anyhow::Result<()> {
        let mut file = NamedTempFile::new()?;
        writeln!(file, "[model]\nmodel = \"gpt-4o-mini\"\ntemperature = 0.0")?;

        let config = ExtractorConfig::load(file.path())?;
        assert_eq!(config.model.model, "gpt-4o-mini");
        assert_eq!(config.model.temperature, 0.0);
        Ok(())
    }

    #[test]
    fn test_unknown_merge_strategy_is_rejected() {
        let err = ExtractorConfig::from_toml_str("[pipeline]\nmerge_strategy = \"newest\"").unwrap_err();
        assert!(matches!(err, ExtractError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = ExtractorConfig::default();
        config.retry.max_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.retry.backoff_multiplier = 0.5;
        assert!(config.validate().is_err());

        let mut config = ExtractorConfig::default();
        config.model.temperature = -0.1;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_schedule_is_capped() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.backoff(0), Duration::ZERO);
        assert_eq!(policy.backoff(1), Duration::from_millis(4_000));
        assert_eq!(policy.backoff(2), Duration::from_millis(8_000));
        assert_eq!(policy.backoff(3), Duration::from_millis(10_000));
        assert_eq!(RetryPolicy::immediate(3).backoff(2), Duration::ZERO);
    }

    #[test]
    fn test_high_temperature_is_advisory() {
        let mut config = ExtractorConfig::default();
        config.model.temperature = 0.7;
        assert!(config.validate().is_ok());

        config.model.temperature = f32::NAN;
        assert!(config.validate().is_err());
    }
}
