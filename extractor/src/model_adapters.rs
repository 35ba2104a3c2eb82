// extractor/src/model_adapters.rs
//!
//! Model Adapters: the extraction service behind a narrow interface
//!
//! The pipeline only needs `complete(prompt, temperature) -> text`. The
//! production adapter talks to any OpenAI-compatible chat completions API;
//! tests plug in stubs.
//!
//! Architecture:
//! - ExtractionClient trait: one call, one logical attempt, no internal retry
//! - Prompt: ordered role-tagged messages
//! - OpenAiChatAdapter: HTTP adapter built on ureq

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::config::ModelConfig;
use crate::schemas::AssetField;
use crate::{ExtractError, Result};

const SYSTEM_INSTRUCTION: &str = "You are a data analyst that extracts from pdf files";

const USER_INSTRUCTION: &str = "Extract fields from the given text then output python dictionary \
or list of dictionaries if there are more than one asset, take note to not omit any valid entry";

/// Role of one prompt message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

/// Ordered multi-role prompt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Prompt {
    pub messages: Vec<ChatMessage>,
}

impl Prompt {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_message(mut self, role: Role, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage {
            role,
            content: content.into(),
        });
        self
    }

    /// Total characters across all messages.
    pub fn len_chars(&self) -> usize {
        self.messages.iter().map(|m| m.content.chars().count()).sum()
    }
}

/// Prompt asking the model to turn `content` into asset records.
pub fn build_extraction_prompt(content: &str) -> Prompt {
    let user = format!(
        "{}:{}, with Text:{}",
        USER_INSTRUCTION,
        AssetField::field_list(),
        content
    );

    let mut schema = String::from(
        "The result MUST be just a valid JSON string: an array of flat objects, \
         one object per asset, with the field names below as keys.\n\
         The value for each key should be a string; if there is more than one value, \
         concatenate them separated by commas; if a value is not found, put \"unspecified\".\n\
         The fields are:\n",
    );
    for field in AssetField::ALL {
        schema.push_str(&format!("- {} // {}\n", field.as_str(), field.description()));
    }

    Prompt::new()
        .with_message(Role::System, SYSTEM_INSTRUCTION)
        .with_message(Role::User, user)
        .with_message(Role::Assistant, schema)
}

/// Prompt asking the model to fix JSON that failed to decode.
pub fn build_repair_prompt(json_text: &str) -> Prompt {
    Prompt::new().with_message(
        Role::User,
        format!(
            "Correct the following JSON data:\n\n{}\n\nEnsure it is valid and properly formatted.",
            json_text
        ),
    )
}

/// Text-generation service used for extraction.
///
/// Each call is a single attempt; failures surface as
/// `ExtractError::Service` and are retried by the caller.
pub trait ExtractionClient {
    fn complete(&self, prompt: &Prompt, temperature: f32) -> Result<String>;
}

impl<T: ExtractionClient + ?Sized> ExtractionClient for &T {
    fn complete(&self, prompt: &Prompt, temperature: f32) -> Result<String> {
        (**self).complete(prompt, temperature)
    }
}

// ============================================================================
// OpenAI-Compatible Adapter
// ============================================================================

#[derive(Debug)]
pub struct OpenAiChatAdapter {
    api_key: String,
    api_base: String,
    model: String,
    max_tokens: u32,
    agent: ureq::Agent,
}

impl OpenAiChatAdapter {
    pub fn new(api_key: String, config: &ModelConfig) -> Self {
        let agent = ureq::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build();

        Self {
            api_key,
            api_base: config.api_base.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            max_tokens: config.max_tokens,
            agent,
        }
    }

    fn payload(&self, prompt: &Prompt, temperature: f32) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "messages": prompt.messages,
            "temperature": temperature,
            "max_tokens": self.max_tokens,
        })
    }
}

impl ExtractionClient for OpenAiChatAdapter {
    fn complete(&self, prompt: &Prompt, temperature: f32) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        debug!(
            model = self.model.as_str(),
            prompt_chars = prompt.len_chars(),
            "sending extraction request"
        );

        let response = self
            .agent
            .post(&url)
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .set("Content-Type", "application/json")
            .send_json(self.payload(prompt, temperature));

        // Handle HTTP errors with detailed messages
        let response = match response {
            Ok(resp) => resp,
            Err(ureq::Error::Status(code, resp)) => {
                let error_msg = match resp.into_json::<serde_json::Value>() {
                    Ok(json) => json["error"]["message"]
                        .as_str()
                        .unwrap_or("Unknown API error")
                        .to_string(),
                    Err(_) => format!("HTTP {} error", code),
                };
                return Err(ExtractError::Service(format!(
                    "API error (HTTP {}): {}",
                    code, error_msg
                )));
            }
            Err(err) => {
                return Err(ExtractError::Service(format!(
                    "failed to connect to {}: {}",
                    self.api_base, err
                )));
            }
        };

        let response_json: serde_json::Value = response
            .into_json()
            .map_err(|err| ExtractError::Service(format!("unreadable API response: {}", err)))?;

        let text = extract_message_content(&response_json)?;

        debug!(
            prompt_tokens = response_json["usage"]["prompt_tokens"].as_u64().unwrap_or(0),
            completion_tokens = response_json["usage"]["completion_tokens"].as_u64().unwrap_or(0),
            "received extraction response"
        );

        Ok(text)
    }
}

/// Pull the first choice's message text out of a chat completions response.
fn extract_message_content(response_json: &serde_json::Value) -> Result<String> {
    response_json["choices"][0]["message"]["content"]
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| ExtractError::Service("no content in API response".to_string()))
}
