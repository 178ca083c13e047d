//! Capture devices, the platform side of a recording.
//!
//! The recorder never touches audio hardware itself. A device grants or denies
//! access and names the MIME type of the bytes it will deliver; the bytes arrive
//! through `AudioRecorder::push_chunk`.

use crate::models::data_uri::is_valid_mime_type;
use crate::recording::RecorderError;

pub const DEFAULT_MIME_TYPE: &str = "audio/webm";

pub trait CaptureDevice: Send + Sync {
    /// Acquires the input. Fails with `RecorderError::MediaAccess` when permission is denied
    /// and `RecorderError::InvalidMimeType` when the bytes could not be labelled.
    fn open(&mut self) -> Result<(), RecorderError>;

    fn close(&mut self);

    fn mime_type(&self) -> &str;
}

/// A browser-side `MediaRecorder` streaming its chunks to the API.
#[derive(Debug, Clone)]
pub struct UploadStream {
    mime_type: String,
    permission_granted: bool,
    open: bool,
}

impl UploadStream {
    pub fn new(mime_type: Option<String>, permission_granted: bool) -> Self {
        Self {
            mime_type: mime_type
                .map(|m| m.trim().to_string())
                .filter(|m| !m.is_empty())
                .unwrap_or_else(|| DEFAULT_MIME_TYPE.to_string()),
            permission_granted,
            open: false,
        }
    }

    #[cfg(test)]
    pub fn is_open(&self) -> bool {
        self.open
    }
}

impl CaptureDevice for UploadStream {
    fn open(&mut self) -> Result<(), RecorderError> {
        if !self.permission_granted {
            return Err(RecorderError::MediaAccess(
                "client reported microphone permission denied".to_string(),
            ));
        }
        if !is_valid_mime_type(&self.mime_type) {
            return Err(RecorderError::InvalidMimeType(self.mime_type.clone()));
        }
        self.open = true;
        Ok(())
    }

    fn close(&mut self) {
        self.open = false;
    }

    fn mime_type(&self) -> &str {
        &self.mime_type
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_to_webm() {
        assert_eq!(UploadStream::new(None, true).mime_type(), "audio/webm");
        assert_eq!(
            UploadStream::new(Some("  ".into()), true).mime_type(),
            "audio/webm"
        );
        assert_eq!(
            UploadStream::new(Some("audio/ogg;codecs=opus".into()), true).mime_type(),
            "audio/ogg;codecs=opus"
        );
    }

    #[test]
    fn test_denied_permission_fails_to_open() {
        let mut device = UploadStream::new(None, false);
        assert!(matches!(device.open(), Err(RecorderError::MediaAccess(_))));
        assert!(!device.is_open());
    }

    #[test]
    fn test_mime_type_that_breaks_the_data_uri_fails_to_open() {
        for mime in ["garbage", "audio/webm,x", "audio/webm; codecs=opus"] {
            let mut device = UploadStream::new(Some(mime.into()), true);
            assert!(
                matches!(device.open(), Err(RecorderError::InvalidMimeType(_))),
                "{mime} should be rejected"
            );
            assert!(!device.is_open());
        }
    }
}
