use std::time::Duration;

use crate::message::MessageError;
use crate::registry::REG_MAX;

/// Errors surfaced by the public endpoint API.
#[derive(Debug, thiserror::Error)]
pub enum RpcError {
    /// A locally supplied argument violates the call contract.
    #[error("invalid argument: {0}")]
    InvalidArgs(&'static str),

    /// A message could not be built or understood.
    #[error("message codec error: {0}")]
    Codec(#[from] MessageError),

    /// The function registry already holds its maximum of entries.
    #[error("registry full ({REG_MAX} entries)")]
    RegistryFull,

    /// Every request slot stayed occupied for the whole retry window.
    #[error("no request slot became free")]
    SlotsExhausted,

    /// No response arrived within the wait budget.
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The response body is larger than the caller's buffer.
    #[error("response of {len} bytes exceeds buffer capacity {cap}")]
    ResponseOverflow { len: usize, cap: usize },

    /// The remote endpoint answered with an error message; the tag is the
    /// short ASCII label it sent and is informational only.
    #[error("remote endpoint reported failure: {tag}")]
    Remote { tag: String },

    /// The protocol threads are gone; the endpoint can no longer send.
    #[error("link down")]
    LinkDown,

    /// `start` was called more than once on this endpoint.
    #[error("endpoint already started")]
    AlreadyStarted,

    /// Spawning a protocol thread failed.
    #[error("thread spawn failed: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, RpcError>;
