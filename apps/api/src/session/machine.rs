//! Interview session state machine.
//!
//! `Loading → Ready ⇄ Analyzing`, or `Loading → Error`. Every transition is a method
//! on `InterviewSession`; a rejected transition returns an error and leaves the
//! session untouched.
//!
//! Analysis is split into `begin_analysis` and `complete_analysis` so that the
//! outbound calls run without holding the session. The ticket returned by
//! `begin_analysis` pins the question index; the result is written there even if
//! the candidate has navigated away in the meantime.

use std::collections::{BTreeMap, HashMap};

use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::data_uri::DataUri;
use crate::models::interview::{Answer, Feedback, SessionContext};
use crate::recording::device::CaptureDevice;
use crate::recording::{AudioRecorder, RecorderStatus, Tick};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SessionPhase {
    Loading,
    Ready,
    Analyzing { index: usize },
    Error { message: String },
}

/// Everything the analysis calls need, captured when the submission was accepted.
#[derive(Debug, Clone)]
pub struct AnalysisTicket {
    pub index: usize,
    pub question: String,
    pub answer: Answer,
}

pub struct InterviewSession {
    id: Uuid,
    context: SessionContext,
    created_at: DateTime<Utc>,
    phase: SessionPhase,
    questions: Vec<String>,
    current_index: usize,
    answers: HashMap<usize, Answer>,
    feedback: HashMap<usize, Feedback>,
    last_error: Option<String>,
    recorder: AudioRecorder,
    /// Question index that was current when the active recording started.
    recording_index: Option<usize>,
}

impl InterviewSession {
    pub fn new(context: SessionContext) -> Self {
        Self::with_recorder(context, AudioRecorder::default())
    }

    pub fn with_recorder(context: SessionContext, recorder: AudioRecorder) -> Self {
        Self {
            id: Uuid::new_v4(),
            context,
            created_at: Utc::now(),
            phase: SessionPhase::Loading,
            questions: Vec::new(),
            current_index: 0,
            answers: HashMap::new(),
            feedback: HashMap::new(),
            last_error: None,
            recorder,
            recording_index: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    // ────────────────────────────────────────────────────────────────────────
    // Loading
    // ────────────────────────────────────────────────────────────────────────

    /// Applies the outcome of question generation. Only valid while `Loading`.
    pub fn finish_loading(
        &mut self,
        result: Result<Vec<String>, AppError>,
    ) -> Result<(), AppError> {
        if self.phase != SessionPhase::Loading {
            return Err(AppError::Conflict("questions are already loaded".to_string()));
        }
        match result {
            Ok(questions) if !questions.is_empty() => {
                info!("Session {} ready with {} questions", self.id, questions.len());
                self.questions = questions;
                self.current_index = 0;
                self.phase = SessionPhase::Ready;
                Ok(())
            }
            Ok(_) => {
                let message = "No interview questions were generated. Please go back and try again."
                    .to_string();
                warn!("Session {}: empty question list", self.id);
                self.phase = SessionPhase::Error {
                    message: message.clone(),
                };
                Err(AppError::Llm(message))
            }
            Err(e) => {
                warn!("Session {}: question generation failed: {e}", self.id);
                self.phase = SessionPhase::Error {
                    message: "Could not generate interview questions. Please go back and try again."
                        .to_string(),
                };
                Err(e)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Answers
    // ────────────────────────────────────────────────────────────────────────

    pub fn set_answer_text(&mut self, text: String) -> Result<(), AppError> {
        self.require_ready("edit the answer")?;
        self.answers.entry(self.current_index).or_default().text = text;
        Ok(())
    }

    pub fn set_answer_audio(&mut self, audio_data_uri: &str) -> Result<(), AppError> {
        self.require_ready("attach audio")?;
        let uri = DataUri::parse(audio_data_uri)
            .map_err(|e| AppError::Validation(format!("audioDataUri is invalid: {e}")))?;
        self.answers.entry(self.current_index).or_default().audio_payload = uri.to_string();
        Ok(())
    }

    // ────────────────────────────────────────────────────────────────────────
    // Analysis
    // ────────────────────────────────────────────────────────────────────────

    /// `Ready → Analyzing` for the current index.
    ///
    /// Rejected without any state change when the answer lacks text or audio.
    pub fn begin_analysis(&mut self) -> Result<AnalysisTicket, AppError> {
        self.require_ready("submit an answer")?;

        let index = self.current_index;
        let answer = self
            .answers
            .get(&index)
            .filter(|a| a.is_complete())
            .cloned()
            .ok_or_else(|| {
                AppError::IncompleteAnswer(
                    "Please record your voice and type your answer before submitting.".to_string(),
                )
            })?;

        self.phase = SessionPhase::Analyzing { index };
        self.last_error = None;
        Ok(AnalysisTicket {
            index,
            question: self.questions[index].clone(),
            answer,
        })
    }

    /// `Analyzing → Ready`. Feedback is stored only when the whole pair succeeded.
    pub fn complete_analysis(
        &mut self,
        index: usize,
        result: Result<Feedback, AppError>,
    ) -> Result<Feedback, AppError> {
        if matches!(self.phase, SessionPhase::Analyzing { .. }) {
            self.phase = SessionPhase::Ready;
        }
        match result {
            Ok(feedback) => {
                self.feedback.insert(index, feedback.clone());
                info!("Session {}: feedback stored for question {}", self.id, index + 1);
                Ok(feedback)
            }
            Err(e) => {
                self.last_error = Some(
                    "There was an error analyzing your response. Please try again.".to_string(),
                );
                Err(e)
            }
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Navigation
    // ────────────────────────────────────────────────────────────────────────

    /// Moves forward one question. Returns `false` at the last question.
    pub fn next(&mut self) -> bool {
        if !self.can_navigate() || self.current_index + 1 >= self.questions.len() {
            return false;
        }
        self.current_index += 1;
        true
    }

    /// Moves back one question. Returns `false` at the first question.
    pub fn previous(&mut self) -> bool {
        if !self.can_navigate() || self.current_index == 0 {
            return false;
        }
        self.current_index -= 1;
        true
    }

    fn can_navigate(&self) -> bool {
        matches!(
            self.phase,
            SessionPhase::Ready | SessionPhase::Analyzing { .. }
        )
    }

    // ────────────────────────────────────────────────────────────────────────
    // Recording
    // ────────────────────────────────────────────────────────────────────────

    /// Returns the timer epoch for a new recording, `None` if one is already running.
    pub fn start_recording(
        &mut self,
        device: Box<dyn CaptureDevice>,
    ) -> Result<Option<u64>, AppError> {
        self.require_ready("record audio")?;
        let epoch = self.recorder.start(device)?;
        if epoch.is_some() {
            self.recording_index = Some(self.current_index);
        }
        Ok(epoch)
    }

    pub fn push_recording_chunk(&mut self, chunk: Bytes) -> Result<(), AppError> {
        Ok(self.recorder.push_chunk(chunk)?)
    }

    pub fn stop_recording(&mut self) -> Result<(), AppError> {
        match self.recorder.stop() {
            Ok(Some(uri)) => {
                self.on_recording_complete(uri);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.recording_index = None;
                Err(e.into())
            }
        }
    }

    /// Timer callback. Returns whether the timer should keep running.
    pub fn tick_recording(&mut self, epoch: u64) -> bool {
        match self.recorder.tick(epoch) {
            Tick::Continue { elapsed_secs } => {
                debug!("Session {}: recording at {elapsed_secs}s", self.id);
                true
            }
            Tick::Cancelled => false,
            Tick::Finished(Ok(uri)) => {
                self.on_recording_complete(uri);
                false
            }
            Tick::Finished(Err(e)) => {
                warn!("Session {}: auto-stopped recording discarded: {e}", self.id);
                self.recording_index = None;
                false
            }
        }
    }

    /// Discards the recording, including audio it already deposited into an answer.
    pub fn reset_recording(&mut self) {
        if self.recorder.status() == RecorderStatus::Stopped {
            if let Some(answer) = self
                .recording_index
                .and_then(|index| self.answers.get_mut(&index))
            {
                answer.audio_payload.clear();
            }
        }
        self.recorder.reset();
        self.recording_index = None;
    }

    fn on_recording_complete(&mut self, uri: DataUri) {
        let index = self.recording_index.unwrap_or(self.current_index);
        self.answers.entry(index).or_default().audio_payload = uri.to_string();
        info!("Session {}: recording attached to question {}", self.id, index + 1);
    }

    fn require_ready(&self, action: &str) -> Result<(), AppError> {
        match &self.phase {
            SessionPhase::Ready => Ok(()),
            SessionPhase::Loading => Err(AppError::Conflict(format!(
                "cannot {action}: questions are still loading"
            ))),
            SessionPhase::Analyzing { .. } => Err(AppError::Conflict(format!(
                "cannot {action}: an analysis is in progress"
            ))),
            SessionPhase::Error { .. } => Err(AppError::Conflict(format!(
                "cannot {action}: the session failed to load"
            ))),
        }
    }

    // ────────────────────────────────────────────────────────────────────────
    // Snapshot
    // ────────────────────────────────────────────────────────────────────────

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            id: self.id,
            context: self.context.clone(),
            created_at: self.created_at,
            phase: self.phase.clone(),
            questions: self.questions.clone(),
            question_count: self.questions.len(),
            current_index: self.current_index,
            current_question: self.questions.get(self.current_index).cloned(),
            answers: self
                .answers
                .iter()
                .map(|(&i, a)| {
                    (
                        i,
                        AnswerView {
                            text: a.text.clone(),
                            has_audio: !a.audio_payload.is_empty(),
                        },
                    )
                })
                .collect(),
            feedback: self
                .feedback
                .iter()
                .map(|(&i, f)| (i, f.clone()))
                .collect(),
            last_error: self.last_error.clone(),
            recording: RecordingView {
                status: self.recorder.status(),
                elapsed_seconds: self.recorder.elapsed_secs(),
                max_seconds: self.recorder.max_secs(),
                question_index: self.recording_index,
            },
        }
    }
}

// Handlers read sessions through `snapshot`; tests inspect them directly.
#[cfg(test)]
impl InterviewSession {
    pub fn phase(&self) -> &SessionPhase {
        &self.phase
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn questions(&self) -> &[String] {
        &self.questions
    }

    pub fn answer(&self, index: usize) -> Option<&Answer> {
        self.answers.get(&index)
    }

    pub fn feedback(&self, index: usize) -> Option<&Feedback> {
        self.feedback.get(&index)
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnswerView {
    pub text: String,
    pub has_audio: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingView {
    pub status: RecorderStatus,
    pub elapsed_seconds: u32,
    pub max_seconds: u32,
    pub question_index: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub id: Uuid,
    #[serde(flatten)]
    pub context: SessionContext,
    pub created_at: DateTime<Utc>,
    pub phase: SessionPhase,
    pub questions: Vec<String>,
    pub question_count: usize,
    pub current_index: usize,
    pub current_question: Option<String>,
    pub answers: BTreeMap<usize, AnswerView>,
    pub feedback: BTreeMap<usize, Feedback>,
    pub last_error: Option<String>,
    pub recording: RecordingView,
}
