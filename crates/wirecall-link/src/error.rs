use crate::limits::{MAX_PAYLOAD, MIN_PAYLOAD};

/// Errors from frame encoding.
///
/// The parser never returns errors; it drops damaged input and
/// resynchronizes on the next SOF.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    /// The payload length is outside the framable range.
    #[error("payload length {len} outside [{MIN_PAYLOAD}, {MAX_PAYLOAD}]")]
    PayloadSize { len: usize },
}

pub type Result<T> = std::result::Result<T, LinkError>;
