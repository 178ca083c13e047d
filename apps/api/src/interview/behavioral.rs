//! Behavioral analysis: sentiment, behavioral cues, communication style, and approach
//! for a typed answer.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::prompts::{RESPONSE_PROMPT_TEMPLATE, RESPONSE_SYSTEM};
use crate::llm_client::prompts::{fill_template, ACTIONABLE_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{call_json, LlmBackend, PromptRequest};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseAnalysisInput {
    pub question: String,
    pub response: String,
}

impl ResponseAnalysisInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.question.trim().is_empty() {
            return Err(AppError::Validation("question cannot be empty".to_string()));
        }
        if self.response.trim().is_empty() {
            return Err(AppError::Validation("response cannot be empty".to_string()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BehavioralFeedback {
    pub sentiment: String,
    pub behavioral_cues: String,
    pub communication_style_feedback: String,
    pub approach_feedback: String,
}

/// Coarse bucket for the free-text sentiment the provider returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl SentimentLabel {
    /// "positive" wins over "negative"; anything else is neutral.
    pub fn classify(sentiment: &str) -> Self {
        let lower = sentiment.to_lowercase();
        if lower.contains("positive") {
            SentimentLabel::Positive
        } else if lower.contains("negative") {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        }
    }
}

pub async fn analyze_response(
    llm: &dyn LlmBackend,
    input: &ResponseAnalysisInput,
) -> Result<BehavioralFeedback, AppError> {
    input.validate()?;

    let prompt = fill_template(
        RESPONSE_PROMPT_TEMPLATE,
        &[
            ("actionable", ACTIONABLE_INSTRUCTION),
            ("json_only", JSON_ONLY_INSTRUCTION),
            ("question", input.question.trim()),
            ("response", input.response.trim()),
        ],
    );

    call_json(llm, PromptRequest::text(RESPONSE_SYSTEM, &prompt))
        .await
        .map_err(|e| AppError::Llm(format!("Response analysis failed: {e}")))
}
