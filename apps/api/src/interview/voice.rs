//! Voice feedback: tone, clarity, and pace from a recorded answer.

use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::interview::prompts::{VOICE_PROMPT_TEMPLATE, VOICE_SYSTEM};
use crate::llm_client::prompts::{fill_template, ACTIONABLE_INSTRUCTION, JSON_ONLY_INSTRUCTION};
use crate::llm_client::{call_json, LlmBackend, PromptRequest};
use crate::models::data_uri::DataUri;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceFeedbackInput {
    /// `data:<mimetype>;base64,<encoded_data>`
    pub audio_data_uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoiceFeedback {
    pub tone_feedback: String,
    pub clarity_feedback: String,
    pub pace_feedback: String,
}

/// Analyzes the recorded audio. No retry at this layer: a failure propagates as one error.
pub async fn analyze_voice(
    llm: &dyn LlmBackend,
    input: &VoiceFeedbackInput,
) -> Result<VoiceFeedback, AppError> {
    let audio = DataUri::parse(&input.audio_data_uri)
        .map_err(|e| AppError::Validation(format!("audioDataUri is invalid: {e}")))?;

    let prompt = fill_template(
        VOICE_PROMPT_TEMPLATE,
        &[
            ("actionable", ACTIONABLE_INSTRUCTION),
            ("json_only", JSON_ONLY_INSTRUCTION),
        ],
    );

    call_json(
        llm,
        PromptRequest::text(VOICE_SYSTEM, &prompt).with_media(&audio),
    )
    .await
    .map_err(|e| AppError::Llm(format!("Voice analysis failed: {e}")))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::llm_client::testing::ScriptedLlm;

    fn voice_reply() -> serde_json::Value {
        json!({
            "toneFeedback": "Warm and confident.",
            "clarityFeedback": "Articulate, minor filler words.",
            "paceFeedback": "Slightly fast in the second half."
        })
    }

    #[tokio::test]
    async fn test_attaches_audio_as_media() {
        let llm = ScriptedLlm::new().reply(VOICE_SYSTEM, voice_reply());
        let input = VoiceFeedbackInput {
            audio_data_uri: "data:audio/webm;base64,AAA=".to_string(),
        };
        let feedback = analyze_voice(&llm, &input).await.unwrap();
        assert_eq!(feedback.tone_feedback, "Warm and confident.");
        assert_eq!(llm.media_calls(), 1);
    }

    #[tokio::test]
    async fn test_malformed_data_uri_is_rejected_before_calling() {
        let llm = ScriptedLlm::new().reply(VOICE_SYSTEM, voice_reply());
        let input = VoiceFeedbackInput {
            audio_data_uri: "https://example.com/answer.webm".to_string(),
        };
        let result = analyze_voice(&llm, &input).await;
        assert!(matches!(result, Err(AppError::Validation(_))));
        assert_eq!(llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_output_field_is_an_error() {
        let llm = ScriptedLlm::new().reply(
            VOICE_SYSTEM,
            json!({"toneFeedback": "ok", "clarityFeedback": "ok"}),
        );
        let input = VoiceFeedbackInput {
            audio_data_uri: "data:audio/webm;base64,AAA=".to_string(),
        };
        let result = analyze_voice(&llm, &input).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
