pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post, put},
    Router,
};

use crate::interview::handlers as interview;
use crate::session::handlers as session;
use crate::state::AppState;

/// Five minutes of compressed audio, base64-encoded, with headroom.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Operations
        .route("/api/v1/questions", post(interview::handle_generate_questions))
        .route("/api/v1/analysis/voice", post(interview::handle_analyze_voice))
        .route(
            "/api/v1/analysis/response",
            post(interview::handle_analyze_response),
        )
        // Sessions
        .route("/api/v1/sessions", post(session::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(session::handle_get_session).delete(session::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/answer/text",
            put(session::handle_set_answer_text),
        )
        .route(
            "/api/v1/sessions/:id/answer/audio",
            put(session::handle_set_answer_audio),
        )
        .route("/api/v1/sessions/:id/analyze", post(session::handle_analyze))
        .route("/api/v1/sessions/:id/next", post(session::handle_next))
        .route("/api/v1/sessions/:id/previous", post(session::handle_previous))
        // Recording
        .route(
            "/api/v1/sessions/:id/recording/start",
            post(session::handle_start_recording),
        )
        .route(
            "/api/v1/sessions/:id/recording/chunk",
            post(session::handle_recording_chunk),
        )
        .route(
            "/api/v1/sessions/:id/recording/stop",
            post(session::handle_stop_recording),
        )
        .route(
            "/api/v1/sessions/:id/recording",
            delete(session::handle_reset_recording),
        )
        .layer(DefaultBodyLimit::max(MAX_BODY_BYTES))
        .with_state(state)
}
