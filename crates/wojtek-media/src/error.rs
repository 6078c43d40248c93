use thiserror::Error;
use wojtek_core::WojtekError;

/// Errors from audio decoding, playback and image processing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MediaError {
    /// Input contained characters outside the standard base64 alphabet.
    #[error("invalid base64 payload: {0}")]
    Base64(String),

    #[error("channel count must be at least 1")]
    InvalidChannelCount,

    #[error("could not decode image: {0}")]
    ImageDecode(String),

    #[error("could not encode image: {0}")]
    ImageEncode(String),

    /// No audio output device is available.
    #[error("audio output unavailable: {0}")]
    OutputUnavailable(String),

    #[error("playback failed: {0}")]
    Playback(String),
}

impl From<MediaError> for WojtekError {
    fn from(err: MediaError) -> Self {
        WojtekError::Media(err.to_string())
    }
}

impl From<base64::DecodeError> for MediaError {
    fn from(err: base64::DecodeError) -> Self {
        MediaError::Base64(err.to_string())
    }
}
