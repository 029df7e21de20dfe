// SPDX-FileCopyrightText: 2026 TokenWatch Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Usage extraction from provider API responses.
//!
//! Each adapter deserializes a narrow view of the response body: the model
//! identifier and the two token counts. Every other field, including message
//! content, is skipped by serde and never stored. Errors describe where
//! decoding failed but never quote the body.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use strum::{Display, EnumString};
use tokenwatch_core::TokenwatchError;

use crate::pricing::PricingTable;

/// Provider whose response format an adapter understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum ResponseProvider {
    Anthropic,
    #[strum(serialize = "openai")]
    OpenAi,
}

/// The three fields forwarded to the ledger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedUsage {
    pub model: String,
    pub input_tokens: i64,
    pub output_tokens: i64,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    model: String,
    usage: AnthropicUsage,
}

#[derive(Deserialize)]
struct AnthropicUsage {
    input_tokens: i64,
    output_tokens: i64,
}

#[derive(Deserialize)]
struct OpenAiResponse {
    model: String,
    usage: OpenAiUsage,
}

#[derive(Deserialize)]
struct OpenAiUsage {
    prompt_tokens: i64,
    completion_tokens: i64,
}

impl ResponseProvider {
    /// Extract usage from a response body of this provider's format.
    pub fn extract(self, body: &str, table: &PricingTable) -> Result<ExtractedUsage, TokenwatchError> {
        match self {
            Self::Anthropic => extract_anthropic(body),
            Self::OpenAi => extract_openai(body, table),
        }
    }
}

/// Read `model`, `usage.input_tokens` and `usage.output_tokens`.
pub fn extract_anthropic(body: &str) -> Result<ExtractedUsage, TokenwatchError> {
    let response: AnthropicResponse = decode(ResponseProvider::Anthropic, body)?;
    Ok(ExtractedUsage {
        model: response.model,
        input_tokens: response.usage.input_tokens,
        output_tokens: response.usage.output_tokens,
    })
}

/// Read `model`, `usage.prompt_tokens` and `usage.completion_tokens`.
///
/// OpenAI reports dated model names (`gpt-4.1-mini-2025-04-14`); these are
/// mapped onto the pricing table with [`PricingTable::normalize`]. Names that
/// match nothing are kept as reported.
pub fn extract_openai(body: &str, table: &PricingTable) -> Result<ExtractedUsage, TokenwatchError> {
    let response: OpenAiResponse = decode(ResponseProvider::OpenAi, body)?;
    let model = match table.normalize(&response.model) {
        Some(pricing) => pricing.name.clone(),
        None => response.model,
    };
    Ok(ExtractedUsage {
        model,
        input_tokens: response.usage.prompt_tokens,
        output_tokens: response.usage.completion_tokens,
    })
}

fn decode<T: DeserializeOwned>(provider: ResponseProvider, body: &str) -> Result<T, TokenwatchError> {
    use serde_json::error::Category;

    serde_json::from_str(body).map_err(|e| {
        let problem = match e.classify() {
            Category::Syntax | Category::Eof => "is not valid JSON",
            Category::Data => "lacks a usable model or usage field",
            Category::Io => "could not be read",
        };
        TokenwatchError::Adapter {
            message: format!(
                "{provider} response {problem} (line {}, column {})",
                e.line(),
                e.column()
            ),
            source: None,
        }
    })
}
