//! `data:<mime>[;params];base64,<payload>` strings carrying recorded audio.

use base64::{engine::general_purpose::STANDARD, Engine};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum DataUriError {
    #[error("data URI must start with 'data:'")]
    MissingScheme,

    #[error("data URI has no ',' separating header and payload")]
    MissingPayloadSeparator,

    #[error("data URI must declare ';base64' encoding")]
    NotBase64,

    #[error("data URI has no valid MIME type")]
    MissingMimeType,

    #[error("data URI payload is empty")]
    EmptyPayload,

    #[error("data URI payload is not valid base64: {0}")]
    InvalidBase64(String),
}

/// A validated base64 data URI.
///
/// `mime_type` keeps any parameters (e.g. `audio/webm;codecs=opus`) because
/// providers accept them and browsers emit them.
#[derive(Debug, Clone, PartialEq)]
pub struct DataUri {
    mime_type: String,
    payload: String,
}

impl DataUri {
    pub fn parse(raw: &str) -> Result<Self, DataUriError> {
        let rest = raw.strip_prefix("data:").ok_or(DataUriError::MissingScheme)?;
        let (header, payload) = rest
            .split_once(',')
            .ok_or(DataUriError::MissingPayloadSeparator)?;
        let mime_type = header
            .strip_suffix(";base64")
            .ok_or(DataUriError::NotBase64)?;

        if !is_valid_mime_type(mime_type) {
            return Err(DataUriError::MissingMimeType);
        }

        if payload.is_empty() {
            return Err(DataUriError::EmptyPayload);
        }
        STANDARD
            .decode(payload)
            .map_err(|e| DataUriError::InvalidBase64(e.to_string()))?;

        Ok(Self {
            mime_type: mime_type.to_string(),
            payload: payload.to_string(),
        })
    }

    /// Encodes raw bytes as a data URI.
    pub fn encode(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: mime_type.to_string(),
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    /// The base64 body, without the header.
    pub fn payload(&self) -> &str {
        &self.payload
    }
}

/// `type/subtype[;params]` with no whitespace and no `,`, so that it survives
/// being written into a data URI header.
pub fn is_valid_mime_type(mime_type: &str) -> bool {
    if mime_type.contains(',') || mime_type.chars().any(char::is_whitespace) {
        return false;
    }
    let essence = mime_type.split(';').next().unwrap_or_default();
    matches!(essence.split_once('/'), Some((kind, sub)) if !kind.is_empty() && !sub.is_empty())
}

impl std::fmt::Display for DataUri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "data:{};base64,{}", self.mime_type, self.payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_plain_audio_uri() {
        let uri = DataUri::parse("data:audio/webm;base64,AAA=").unwrap();
        assert_eq!(uri.mime_type(), "audio/webm");
        assert_eq!(uri.payload(), "AAA=");
    }

    #[test]
    fn test_parse_keeps_codec_parameters() {
        let uri = DataUri::parse("data:audio/webm;codecs=opus;base64,AAA=").unwrap();
        assert_eq!(uri.mime_type(), "audio/webm;codecs=opus");
    }

    #[test]
    fn test_parse_rejects_missing_scheme() {
        assert_eq!(
            DataUri::parse("audio/webm;base64,AAA="),
            Err(DataUriError::MissingScheme)
        );
    }

    #[test]
    fn test_parse_rejects_non_base64_encoding() {
        assert_eq!(
            DataUri::parse("data:audio/webm,AAA="),
            Err(DataUriError::NotBase64)
        );
    }

    #[test]
    fn test_parse_rejects_missing_mime() {
        assert_eq!(
            DataUri::parse("data:;base64,AAA="),
            Err(DataUriError::MissingMimeType)
        );
        assert_eq!(
            DataUri::parse("data:audio;base64,AAA="),
            Err(DataUriError::MissingMimeType)
        );
    }

    #[test]
    fn test_parse_rejects_empty_payload() {
        assert_eq!(
            DataUri::parse("data:audio/webm;base64,"),
            Err(DataUriError::EmptyPayload)
        );
    }

    #[test]
    fn test_parse_rejects_invalid_base64() {
        assert!(matches!(
            DataUri::parse("data:audio/webm;base64,!!not base64!!"),
            Err(DataUriError::InvalidBase64(_))
        ));
    }

    #[test]
    fn test_mime_type_must_fit_in_header() {
        assert!(is_valid_mime_type("audio/webm"));
        assert!(is_valid_mime_type("audio/ogg;codecs=opus"));
        assert!(!is_valid_mime_type("audio/webm,x"));
        assert!(!is_valid_mime_type("audio/ webm"));
        assert!(!is_valid_mime_type("audio/"));
        assert!(!is_valid_mime_type("garbage"));
    }

    #[test]
    fn test_encode_renders_full_uri() {
        let uri = DataUri::encode("audio/webm", &[0, 0]);
        assert_eq!(uri.to_string(), "data:audio/webm;base64,AAA=");
    }
}
