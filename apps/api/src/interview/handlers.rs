//! Axum route handlers exposing the three operations directly.

use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::interview::behavioral::{analyze_response, BehavioralFeedback, ResponseAnalysisInput};
use crate::interview::questions::{
    generate_questions, GenerateQuestionsInput, GenerateQuestionsOutput,
};
use crate::interview::voice::{analyze_voice, VoiceFeedback, VoiceFeedbackInput};
use crate::state::AppState;

/// POST /api/v1/questions
pub async fn handle_generate_questions(
    State(state): State<AppState>,
    Json(input): Json<GenerateQuestionsInput>,
) -> Result<Json<GenerateQuestionsOutput>, AppError> {
    let output = generate_questions(state.llm.as_ref(), &input).await?;
    Ok(Json(output))
}

/// POST /api/v1/analysis/voice
pub async fn handle_analyze_voice(
    State(state): State<AppState>,
    Json(input): Json<VoiceFeedbackInput>,
) -> Result<Json<VoiceFeedback>, AppError> {
    let feedback = analyze_voice(state.llm.as_ref(), &input).await?;
    Ok(Json(feedback))
}

/// POST /api/v1/analysis/response
pub async fn handle_analyze_response(
    State(state): State<AppState>,
    Json(input): Json<ResponseAnalysisInput>,
) -> Result<Json<BehavioralFeedback>, AppError> {
    let feedback = analyze_response(state.llm.as_ref(), &input).await?;
    Ok(Json(feedback))
}
