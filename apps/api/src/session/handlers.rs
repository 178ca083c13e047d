//! Axum route handlers for interview sessions.

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use anyhow::anyhow;
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::errors::AppError;
use crate::interview::analysis::analyze_answer;
use crate::interview::questions::{
    generate_questions, GenerateQuestionsInput, DEFAULT_QUESTION_COUNT,
};
use crate::models::interview::{Feedback, SessionContext};
use crate::recording::device::UploadStream;
use crate::recording::timer::{spawn_ticker, TICK_PERIOD};
use crate::session::machine::{InterviewSession, SessionSnapshot};
use crate::session::store::SessionStore;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request types
// ────────────────────────────────────────────────────────────────────────────

/// Query string handed over by the setup page.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartSessionQuery {
    pub job_role: Option<String>,
    pub seniority_level: Option<String>,
    pub number_of_questions: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerTextRequest {
    pub text: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerAudioRequest {
    pub audio_data_uri: String,
}

fn permission_granted_default() -> bool {
    true
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartRecordingRequest {
    pub mime_type: Option<String>,
    #[serde(default = "permission_granted_default")]
    pub permission_granted: bool,
}

impl Default for StartRecordingRequest {
    fn default() -> Self {
        Self {
            mime_type: None,
            permission_granted: true,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Lifecycle
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions?jobRole=..&seniorityLevel=..
///
/// Creates a session and loads its questions. A session whose questions fail to
/// load is discarded; the retry path is creating a new one.
pub async fn handle_create_session(
    State(state): State<AppState>,
    Query(params): Query<StartSessionQuery>,
) -> Result<(StatusCode, Json<SessionSnapshot>), AppError> {
    let context = SessionContext::from_params(params.job_role, params.seniority_level);
    let input = GenerateQuestionsInput {
        job_role: context.job_role.clone(),
        seniority_level: context.seniority_level.clone(),
        number_of_questions: params.number_of_questions.unwrap_or(DEFAULT_QUESTION_COUNT),
    };
    input.validate()?;

    let id = state.sessions.insert(InterviewSession::new(context)).await;
    info!(
        "Session {id} created for {} ({})",
        input.job_role, input.seniority_level
    );

    let result = generate_questions(state.llm.as_ref(), &input)
        .await
        .map(|output| output.questions);

    if let Err(e) = state.sessions.update(id, |s| s.finish_loading(result)).await {
        state.sessions.remove(id).await.ok();
        return Err(e);
    }

    let snapshot = state.sessions.snapshot(id).await?;
    Ok((StatusCode::CREATED, Json(snapshot)))
}

/// GET /api/v1/sessions/:id
pub async fn handle_get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// DELETE /api/v1/sessions/:id
pub async fn handle_delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// ────────────────────────────────────────────────────────────────────────────
// Answers and analysis
// ────────────────────────────────────────────────────────────────────────────

/// PUT /api/v1/sessions/:id/answer/text
pub async fn handle_set_answer_text(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerTextRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state
        .sessions
        .update(id, |s| s.set_answer_text(req.text))
        .await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// PUT /api/v1/sessions/:id/answer/audio
pub async fn handle_set_answer_audio(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<AnswerAudioRequest>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state
        .sessions
        .update(id, |s| s.set_answer_audio(&req.audio_data_uri))
        .await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// POST /api/v1/sessions/:id/analyze
///
/// Submits the current answer. The session lock is released while the two
/// analysis calls run. The calls and the write-back run on their own task, so
/// the session leaves `Analyzing` even if the client goes away mid-request.
pub async fn handle_analyze(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Feedback>, AppError> {
    let ticket = state.sessions.update(id, |s| s.begin_analysis()).await?;
    info!("Session {id}: analyzing answer to question {}", ticket.index + 1);

    let sessions = state.sessions.clone();
    let llm = state.llm.clone();
    let analysis = tokio::spawn(async move {
        let outcome = analyze_answer(llm.as_ref(), &ticket.question, &ticket.answer).await;
        sessions
            .update(id, |s| s.complete_analysis(ticket.index, outcome))
            .await
    });

    let feedback = analysis
        .await
        .map_err(|e| anyhow!("analysis task for session {id} failed: {e}"))??;
    Ok(Json(feedback))
}

// ────────────────────────────────────────────────────────────────────────────
// Navigation
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/next
pub async fn handle_next(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state.sessions.update(id, |s| Ok(s.next())).await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// POST /api/v1/sessions/:id/previous
pub async fn handle_previous(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state.sessions.update(id, |s| Ok(s.previous())).await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

// ────────────────────────────────────────────────────────────────────────────
// Recording
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/sessions/:id/recording/start
///
/// The body is optional; an empty one starts with the defaults.
pub async fn handle_start_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<Json<SessionSnapshot>, AppError> {
    let req = if body.is_empty() {
        StartRecordingRequest::default()
    } else {
        serde_json::from_slice::<StartRecordingRequest>(&body)
            .map_err(|e| AppError::Validation(format!("invalid recording request: {e}")))?
    };
    let device = Box::new(UploadStream::new(req.mime_type, req.permission_granted));

    let epoch = state
        .sessions
        .update(id, |s| s.start_recording(device))
        .await?;
    if let Some(epoch) = epoch {
        spawn_recording_timer(state.sessions.clone(), id, epoch);
    }

    Ok(Json(state.sessions.snapshot(id).await?))
}

/// POST /api/v1/sessions/:id/recording/chunk
pub async fn handle_recording_chunk(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    if body.is_empty() {
        return Err(AppError::Validation("chunk body cannot be empty".to_string()));
    }
    state
        .sessions
        .update(id, |s| s.push_recording_chunk(body))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/sessions/:id/recording/stop
pub async fn handle_stop_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state.sessions.update(id, |s| s.stop_recording()).await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// DELETE /api/v1/sessions/:id/recording
pub async fn handle_reset_recording(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionSnapshot>, AppError> {
    state
        .sessions
        .update(id, |s| {
            s.reset_recording();
            Ok(())
        })
        .await?;
    Ok(Json(state.sessions.snapshot(id).await?))
}

/// Ticks the session's recorder once per second until the recording ends,
/// is reset, or the session disappears.
fn spawn_recording_timer(sessions: SessionStore, id: Uuid, epoch: u64) {
    spawn_ticker(TICK_PERIOD, move || {
        let sessions = sessions.clone();
        async move {
            sessions
                .update(id, |s| Ok(s.tick_recording(epoch)))
                .await
                .unwrap_or(false)
        }
    });
}
