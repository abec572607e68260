//! Error types for opusogg.

use crate::codec::ogg::OggError;
use crate::codec::opus::{DecoderError, EncoderError};

/// Result type alias for opusogg.
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for opusogg operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid stream configuration; the stream never starts.
    #[error("invalid config: {0}")]
    Config(String),

    /// The Opus encoder failed. Fatal for the stream.
    #[error("codec error: {0}")]
    Encode(#[from] EncoderError),

    /// The Opus decoder failed.
    #[error("codec error: {0}")]
    Decode(#[from] DecoderError),

    /// Malformed or unrecognized container data.
    #[error("container error: {0}")]
    Container(#[from] ContainerError),

    /// Input ended in the middle of a page.
    #[error("truncated input: {pending} bytes without a complete page")]
    TruncatedInput { pending: usize },

    /// The stream was already finished by a final call.
    #[error("stream ended")]
    StreamEnded,

    /// A previous call failed fatally; the stream must be dropped.
    #[error("stream aborted after a fatal error")]
    Aborted,
}

impl Error {
    /// Returns false for errors the stream can continue past: truncated
    /// input and a single packet failing to decode.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Error::TruncatedInput { .. } | Error::Decode(DecoderError::DecodeFailed(_))
        )
    }

    /// Returns true if the input is not an Ogg or not an Opus stream at all,
    /// as opposed to a recognized but corrupt one.
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Error::Container(ContainerError::NotOgg | ContainerError::NotOpus { .. })
        )
    }
}

/// Container-level failure kinds.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ContainerError {
    /// No Ogg page could be found in the input.
    #[error("not an ogg stream")]
    NotOgg,

    /// A header packet lacks the expected magic.
    #[error("not an opus stream: expected {expected} magic")]
    NotOpus { expected: &'static str },

    /// The ID header carries a version this crate does not understand.
    #[error("unsupported opus header version {0}")]
    UnsupportedVersion(u8),

    /// Channel layout outside mono/stereo family 0.
    #[error("unsupported channel mapping family {family} with {channels} channels")]
    UnsupportedMapping { family: u8, channels: u8 },

    /// A header was recognized but its contents are inconsistent.
    #[error("malformed {header}: {reason}")]
    Malformed { header: &'static str, reason: String },

    /// The stream ended before a mandatory header arrived.
    #[error("missing {0} header")]
    MissingHeader(&'static str),

    /// Ogg framing failure.
    #[error(transparent)]
    Ogg(#[from] OggError),
}

impl From<OggError> for Error {
    fn from(e: OggError) -> Self {
        Error::Container(ContainerError::Ogg(e))
    }
}
