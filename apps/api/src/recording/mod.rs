//! Recording capture: a bounded-duration recorder modeled as a finite-state resource.
//!
//! `Idle → Recording → Stopped`, back to `Idle` on reset. Every transition that
//! finalizes a recording returns the resulting data URI to the caller instead of
//! invoking a stored closure; the owner decides where the audio goes.
//!
//! Each recording gets a fresh epoch. The timer task carries the epoch it was
//! spawned for, so ticks from a stopped or reset recording are recognized and the
//! timer exits.

pub mod device;
pub mod timer;

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::errors::AppError;
use crate::models::data_uri::DataUri;
use crate::recording::device::CaptureDevice;

/// Five minutes.
pub const MAX_RECORDING_SECS: u32 = 300;

/// Base64 of this many bytes still fits the request body limit.
pub const MAX_RECORDING_BYTES: usize = 12 * 1024 * 1024;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("microphone access denied: {0}")]
    MediaAccess(String),

    #[error("unsupported audio MIME type '{0}'")]
    InvalidMimeType(String),

    #[error("a finished recording exists; reset before recording again")]
    NotReset,

    #[error("not recording")]
    NotRecording,

    #[error("recording exceeds the {limit} byte limit")]
    TooLarge { limit: usize },

    #[error("recording captured no audio")]
    EmptyRecording,
}

impl From<RecorderError> for AppError {
    fn from(e: RecorderError) -> Self {
        match e {
            RecorderError::MediaAccess(msg) => AppError::MediaAccess(msg),
            RecorderError::NotReset | RecorderError::NotRecording => {
                AppError::Conflict(e.to_string())
            }
            RecorderError::InvalidMimeType(_) | RecorderError::EmptyRecording => {
                AppError::Validation(e.to_string())
            }
            RecorderError::TooLarge { .. } => AppError::PayloadTooLarge(e.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RecorderStatus {
    Idle,
    Recording,
    Stopped,
}

/// Outcome of one timer tick.
#[derive(Debug)]
pub enum Tick {
    Continue { elapsed_secs: u32 },
    /// The tick belongs to a recording that is no longer running.
    Cancelled,
    /// The limit was reached and the recording was finalized.
    Finished(Result<DataUri, RecorderError>),
}

pub struct AudioRecorder {
    status: RecorderStatus,
    device: Option<Box<dyn CaptureDevice>>,
    chunks: Vec<Bytes>,
    recorded_bytes: usize,
    elapsed_secs: u32,
    max_secs: u32,
    max_bytes: usize,
    epoch: u64,
}

impl Default for AudioRecorder {
    fn default() -> Self {
        Self::new(MAX_RECORDING_SECS)
    }
}

impl AudioRecorder {
    pub fn new(max_secs: u32) -> Self {
        Self {
            status: RecorderStatus::Idle,
            device: None,
            chunks: Vec::new(),
            recorded_bytes: 0,
            elapsed_secs: 0,
            max_secs,
            max_bytes: MAX_RECORDING_BYTES,
            epoch: 0,
        }
    }

    pub fn with_byte_limit(mut self, max_bytes: usize) -> Self {
        self.max_bytes = max_bytes;
        self
    }

    pub fn status(&self) -> RecorderStatus {
        self.status
    }

    pub fn elapsed_secs(&self) -> u32 {
        self.elapsed_secs
    }

    pub fn max_secs(&self) -> u32 {
        self.max_secs
    }

    /// Opens the device and begins a recording.
    ///
    /// Returns the new epoch for the timer, or `None` when already recording.
    pub fn start(
        &mut self,
        mut device: Box<dyn CaptureDevice>,
    ) -> Result<Option<u64>, RecorderError> {
        match self.status {
            RecorderStatus::Recording => {
                debug!("start ignored: already recording");
                Ok(None)
            }
            RecorderStatus::Stopped => Err(RecorderError::NotReset),
            RecorderStatus::Idle => {
                device.open()?;
                self.chunks.clear();
                self.recorded_bytes = 0;
                self.elapsed_secs = 0;
                self.epoch += 1;
                info!("Recording started ({})", device.mime_type());
                self.device = Some(device);
                self.status = RecorderStatus::Recording;
                Ok(Some(self.epoch))
            }
        }
    }

    /// Data-available event. Chunks outside a recording are dropped.
    ///
    /// A chunk that would push the recording past the byte limit is rejected;
    /// the recording keeps what it has and can still be stopped.
    pub fn push_chunk(&mut self, chunk: Bytes) -> Result<(), RecorderError> {
        if self.status != RecorderStatus::Recording {
            warn!("Dropping {} byte chunk: not recording", chunk.len());
            return Err(RecorderError::NotRecording);
        }
        if self.recorded_bytes + chunk.len() > self.max_bytes {
            warn!(
                "Dropping {} byte chunk: recording already holds {} bytes",
                chunk.len(),
                self.recorded_bytes
            );
            return Err(RecorderError::TooLarge {
                limit: self.max_bytes,
            });
        }
        self.recorded_bytes += chunk.len();
        self.chunks.push(chunk);
        Ok(())
    }

    /// Stops and finalizes. A no-op when not recording.
    pub fn stop(&mut self) -> Result<Option<DataUri>, RecorderError> {
        if self.status != RecorderStatus::Recording {
            return Ok(None);
        }
        self.finalize().map(Some)
    }

    pub fn tick(&mut self, epoch: u64) -> Tick {
        if self.status != RecorderStatus::Recording || epoch != self.epoch {
            return Tick::Cancelled;
        }
        self.elapsed_secs = (self.elapsed_secs + 1).min(self.max_secs);
        if self.elapsed_secs >= self.max_secs {
            info!("Recording reached {}s limit, stopping", self.max_secs);
            return Tick::Finished(self.finalize());
        }
        Tick::Continue {
            elapsed_secs: self.elapsed_secs,
        }
    }

    /// Discards any recording and returns to `Idle`.
    pub fn reset(&mut self) {
        if let Some(mut device) = self.device.take() {
            device.close();
        }
        self.chunks.clear();
        self.recorded_bytes = 0;
        self.elapsed_secs = 0;
        self.epoch += 1;
        self.status = RecorderStatus::Idle;
    }

    fn finalize(&mut self) -> Result<DataUri, RecorderError> {
        let mut device = self.device.take();
        if let Some(device) = device.as_mut() {
            device.close();
        }
        let mime_type = device
            .as_ref()
            .map(|d| d.mime_type().to_string())
            .unwrap_or_else(|| device::DEFAULT_MIME_TYPE.to_string());

        // Invalidate the running timer.
        self.epoch += 1;

        let bytes: Vec<u8> = self.chunks.drain(..).flat_map(|c| c.to_vec()).collect();
        self.recorded_bytes = 0;
        if bytes.is_empty() {
            self.status = RecorderStatus::Idle;
            return Err(RecorderError::EmptyRecording);
        }

        self.status = RecorderStatus::Stopped;
        info!(
            "Recording finalized: {} bytes after {}s",
            bytes.len(),
            self.elapsed_secs
        );
        Ok(DataUri::encode(&mime_type, &bytes))
    }
}
