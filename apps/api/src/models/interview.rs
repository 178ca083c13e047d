use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::interview::behavioral::{BehavioralFeedback, SentimentLabel};
use crate::interview::voice::VoiceFeedback;

pub const DEFAULT_JOB_ROLE: &str = "Software Engineer";
pub const DEFAULT_SENIORITY_LEVEL: &str = "Mid-Level";

/// Immutable inputs a session is created with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionContext {
    pub job_role: String,
    pub seniority_level: String,
}

impl SessionContext {
    /// Falls back to the default role and level when a value is absent or blank.
    pub fn from_params(job_role: Option<String>, seniority_level: Option<String>) -> Self {
        let or_default = |value: Option<String>, default: &str| {
            value
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        Self {
            job_role: or_default(job_role, DEFAULT_JOB_ROLE),
            seniority_level: or_default(seniority_level, DEFAULT_SENIORITY_LEVEL),
        }
    }
}

/// A candidate's answer to one question.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Answer {
    pub text: String,
    /// Recorded audio as a data URI.
    pub audio_payload: String,
}

impl Answer {
    pub fn is_complete(&self) -> bool {
        !self.text.trim().is_empty() && !self.audio_payload.is_empty()
    }
}

/// Merged voice and behavioral analysis for one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Feedback {
    pub voice_analysis: VoiceFeedback,
    pub behavioral_analysis: BehavioralFeedback,
    pub sentiment_label: SentimentLabel,
    pub analyzed_at: DateTime<Utc>,
}

impl Feedback {
    pub fn merge(voice: VoiceFeedback, behavioral: BehavioralFeedback) -> Self {
        let sentiment_label = SentimentLabel::classify(&behavioral.sentiment);
        Self {
            voice_analysis: voice,
            behavioral_analysis: behavioral,
            sentiment_label,
            analyzed_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_falls_back_to_defaults() {
        let ctx = SessionContext::from_params(None, Some("  ".to_string()));
        assert_eq!(ctx.job_role, "Software Engineer");
        assert_eq!(ctx.seniority_level, "Mid-Level");
    }

    #[test]
    fn test_context_keeps_supplied_values() {
        let ctx =
            SessionContext::from_params(Some("Data Scientist".into()), Some("Senior".into()));
        assert_eq!(ctx.job_role, "Data Scientist");
        assert_eq!(ctx.seniority_level, "Senior");
    }

    #[test]
    fn test_answer_requires_text_and_audio() {
        let mut answer = Answer::default();
        assert!(!answer.is_complete());
        answer.audio_payload = "data:audio/webm;base64,AAA=".to_string();
        assert!(!answer.is_complete());
        answer.text = "My answer".to_string();
        assert!(answer.is_complete());
    }

    #[test]
    fn test_merge_classifies_sentiment() {
        let feedback = Feedback::merge(
            VoiceFeedback {
                tone_feedback: "t".into(),
                clarity_feedback: "c".into(),
                pace_feedback: "p".into(),
            },
            BehavioralFeedback {
                sentiment: "Negative".into(),
                behavioral_cues: "b".into(),
                communication_style_feedback: "s".into(),
                approach_feedback: "a".into(),
            },
        );
        assert_eq!(feedback.sentiment_label, SentimentLabel::Negative);
    }
}
