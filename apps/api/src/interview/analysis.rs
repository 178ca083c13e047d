//! Answer analysis. Runs voice and behavioral analysis as a fork-join pair.
//!
//! Both calls are issued concurrently. The join fails fast on the first error
//! and no partial result is returned, so a caller can never store half a Feedback.

use tracing::info;

use crate::errors::AppError;
use crate::interview::behavioral::{analyze_response, ResponseAnalysisInput};
use crate::interview::voice::{analyze_voice, VoiceFeedbackInput};
use crate::llm_client::LlmBackend;
use crate::models::interview::{Answer, Feedback};

pub async fn analyze_answer(
    llm: &dyn LlmBackend,
    question: &str,
    answer: &Answer,
) -> Result<Feedback, AppError> {
    let voice_input = VoiceFeedbackInput {
        audio_data_uri: answer.audio_payload.clone(),
    };
    let response_input = ResponseAnalysisInput {
        question: question.to_string(),
        response: answer.text.clone(),
    };

    let (voice, behavioral) = tokio::try_join!(
        analyze_voice(llm, &voice_input),
        analyze_response(llm, &response_input),
    )?;

    info!(
        "Analysis complete: sentiment={:?}",
        behavioral.sentiment.chars().take(40).collect::<String>()
    );

    Ok(Feedback::merge(voice, behavioral))
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::interview::behavioral::SentimentLabel;
    use crate::interview::prompts::{RESPONSE_SYSTEM, VOICE_SYSTEM};
    use crate::llm_client::testing::ScriptedLlm;

    fn answer() -> Answer {
        Answer {
            text: "I led the migration and kept stakeholders informed.".to_string(),
            audio_payload: "data:audio/webm;base64,AAA=".to_string(),
        }
    }

    fn voice_reply() -> serde_json::Value {
        json!({"toneFeedback": "t", "clarityFeedback": "c", "paceFeedback": "p"})
    }

    fn response_reply() -> serde_json::Value {
        json!({
            "sentiment": "Positive",
            "behavioralCues": "b",
            "communicationStyleFeedback": "s",
            "approachFeedback": "a"
        })
    }

    #[tokio::test]
    async fn test_both_succeed_merges_feedback() {
        let llm = ScriptedLlm::new()
            .reply(VOICE_SYSTEM, voice_reply())
            .reply(RESPONSE_SYSTEM, response_reply());
        let feedback = analyze_answer(&llm, "Tell me about a migration.", &answer())
            .await
            .unwrap();
        assert_eq!(feedback.voice_analysis.pace_feedback, "p");
        assert_eq!(feedback.behavioral_analysis.approach_feedback, "a");
        assert_eq!(feedback.sentiment_label, SentimentLabel::Positive);
        assert_eq!(llm.calls(), 2);
    }

    #[tokio::test]
    async fn test_behavioral_failure_fails_the_pair() {
        let llm = ScriptedLlm::new()
            .reply(VOICE_SYSTEM, voice_reply())
            .fail(RESPONSE_SYSTEM, 500);
        let result = analyze_answer(&llm, "Q", &answer()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }

    #[tokio::test]
    async fn test_voice_failure_fails_the_pair() {
        let llm = ScriptedLlm::new()
            .fail(VOICE_SYSTEM, 503)
            .reply(RESPONSE_SYSTEM, response_reply());
        let result = analyze_answer(&llm, "Q", &answer()).await;
        assert!(matches!(result, Err(AppError::Llm(_))));
    }
}
