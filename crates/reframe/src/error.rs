use std::io;

/// Errors produced while reassembling an elementary stream.
///
/// Only [`ParseError::NegotiationConflict`] and [`ParseError::AllocationOrWrite`]
/// leave the parser. Every other kind is handled by dropping the offending
/// unit and resynchronizing.
#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    /// A syntax parser failed on a unit.
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    /// The unit violates the conformance rules of its format.
    #[error("bitstream error: {0}")]
    Bitstream(String),
    /// The unit needs state that has not been seen yet.
    #[error("missing precondition: {0}")]
    MissingPrecondition(&'static str),
    /// A non-essential element could not be decoded.
    #[error("recoverable parse error: {0}")]
    RecoverableParse(String),
    /// The declared or negotiated formats contradict each other.
    #[error("negotiation conflict: {0}")]
    NegotiationConflict(String),
    /// An output unit could not be built.
    #[error("allocation or write failure: {0}")]
    AllocationOrWrite(io::Error),
}

impl ParseError {
    /// Returns true if the error is handled inside the parser by skipping data.
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::NegotiationConflict(_) | Self::AllocationOrWrite(_))
    }

    pub(crate) fn conflict(msg: impl Into<String>) -> Self {
        Self::NegotiationConflict(msg.into())
    }

    pub(crate) fn bitstream(msg: impl Into<String>) -> Self {
        Self::Bitstream(msg.into())
    }
}
