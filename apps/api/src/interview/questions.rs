//! Question generation. Produces the question set for a (role, seniority) pair.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::errors::AppError;
use crate::interview::prompts::{QUESTIONS_PROMPT_TEMPLATE, QUESTIONS_SYSTEM};
use crate::llm_client::prompts::fill_template;
use crate::llm_client::{call_json, LlmBackend, PromptRequest};

pub const DEFAULT_QUESTION_COUNT: u32 = 5;
/// Upper bound on questions per request; keeps prompts and sessions bounded.
pub const MAX_QUESTION_COUNT: u32 = 20;

fn default_question_count() -> u32 {
    DEFAULT_QUESTION_COUNT
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateQuestionsInput {
    pub job_role: String,
    pub seniority_level: String,
    #[serde(default = "default_question_count")]
    pub number_of_questions: u32,
}

impl GenerateQuestionsInput {
    pub fn validate(&self) -> Result<(), AppError> {
        if self.job_role.trim().is_empty() {
            return Err(AppError::Validation("jobRole cannot be empty".to_string()));
        }
        if self.seniority_level.trim().is_empty() {
            return Err(AppError::Validation(
                "seniorityLevel cannot be empty".to_string(),
            ));
        }
        if self.number_of_questions == 0 || self.number_of_questions > MAX_QUESTION_COUNT {
            return Err(AppError::Validation(format!(
                "numberOfQuestions must be between 1 and {MAX_QUESTION_COUNT}"
            )));
        }
        Ok(())
    }
}

/// The generated question set. The count is not enforced: whatever list
/// the provider returns is passed through once it matches this shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerateQuestionsOutput {
    pub questions: Vec<String>,
}

/// Validates the input, makes one provider call, and validates the output shape.
pub async fn generate_questions(
    llm: &dyn LlmBackend,
    input: &GenerateQuestionsInput,
) -> Result<GenerateQuestionsOutput, AppError> {
    input.validate()?;

    let count = input.number_of_questions.to_string();
    let prompt = fill_template(
        QUESTIONS_PROMPT_TEMPLATE,
        &[
            ("number_of_questions", count.as_str()),
            ("job_role", input.job_role.trim()),
            ("seniority_level", input.seniority_level.trim()),
        ],
    );

    let output: GenerateQuestionsOutput =
        call_json(llm, PromptRequest::text(QUESTIONS_SYSTEM, &prompt))
            .await
            .map_err(|e| AppError::Llm(format!("Question generation failed: {e}")))?;

    if output.questions.len() != input.number_of_questions as usize {
        warn!(
            "Requested {} questions, provider returned {}",
            input.number_of_questions,
            output.questions.len()
        );
    }
    info!(
        "Generated {} questions for {} ({})",
        output.questions.len(),
        input.job_role,
        input.seniority_level
    );

    Ok(output)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedLlm;

    fn input(count: u32) -> GenerateQuestionsInput {
        GenerateQuestionsInput {
            job_role: "Software Engineer".to_string(),
            seniority_level: "Mid-Level".to_string(),
            number_of_questions: count,
        }
    }

    #[test]
    fn test_number_of_questions_defaults_to_five() {
        let parsed: GenerateQuestionsInput = serde_json::from_value(json!({
            "jobRole": "Data Scientist",
            "seniorityLevel": "Senior"
        }))
        .unwrap();
        assert_eq!(parsed.number_of_questions, 5);
    }

    #[test]
    fn test_validate_rejects_blank_role() {
        let mut bad = input(5);
        bad.job_role = "   ".to_string();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_blank_seniority() {
        let mut bad = input(5);
        bad.seniority_level = String::new();
        assert!(matches!(bad.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_zero_and_oversized_counts() {
        assert!(input(0).validate().is_err());
        assert!(input(MAX_QUESTION_COUNT + 1).validate().is_err());
        assert!(input(1).validate().is_ok());
        assert!(input(MAX_QUESTION_COUNT).validate().is_ok());
    }

    #[tokio::test]
    async fn test_generates_five_questions_with_healthy_provider() {
        let llm = ScriptedLlm::new().reply(
            QUESTIONS_SYSTEM,
            json!({"questions": ["Q1", "Q2", "Q3", "Q4", "Q5"]}),
        );
        let output = generate_questions(&llm, &input(5)).await.unwrap();
        assert_eq!(output.questions.len(), 5);
        assert_eq!(llm.calls(), 1);
    }

    #[tokio::test]
    async fn test_count_mismatch_is_passed_through() {
        let llm = ScriptedLlm::new().reply(QUESTIONS_SYSTEM, json!({"questions": ["Only one"]}));
        let output = generate_questions(&llm, &input(5)).await.unwrap();
        assert_eq!(output.questions, vec!["Only one".to_string()]);
    }

    #[tokio::test]
    async fn test_malformed_output_is_an_error() {
        let llm = ScriptedLlm::new().reply(QUESTIONS_SYSTEM, json!({"questions": "Q1, Q2"}));
        let result = generate_questions(&llm, &input(2)).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_provider_failure_is_an_error() {
        let llm = ScriptedLlm::new().fail(QUESTIONS_SYSTEM, 500);
        let result = generate_questions(&llm, &input(5)).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_invalid_input_makes_no_call() {
        let llm = ScriptedLlm::new();
        let result = generate_questions(&llm, &input(0)).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.calls(), 0);
    }
}
