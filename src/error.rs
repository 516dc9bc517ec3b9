use thiserror::Error;

use crate::format::PixelFormat;

/// Errors raised by conversion and encode sessions.
#[derive(Debug, Error)]
pub enum CodecError {
    /// No conversion is registered for the requested format pair.
    #[error("no conversion registered from {from} to {to}")]
    UnsupportedFormat { from: PixelFormat, to: PixelFormat },

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Operation invoked outside its valid lifecycle state.
    #[error("{operation} is not valid in state {state}")]
    InvalidState {
        operation: &'static str,
        state: &'static str,
    },

    /// The native encoder reported a failure while opening or encoding.
    #[error("encoder failure: {0}")]
    EncoderFailure(String),
}

impl CodecError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        CodecError::InvalidArgument(msg.into())
    }

    pub(crate) fn encoder(msg: impl Into<String>) -> Self {
        CodecError::EncoderFailure(msg.into())
    }
}

pub type Result<T> = std::result::Result<T, CodecError>;
