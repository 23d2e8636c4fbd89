//! Function registry.
//!
//! A bounded, append-only table of `(name, handler)` pairs. Names are
//! `&'static str` because the table never copies them; lookup is a linear
//! scan and the first match wins, so a duplicate registration shadows the
//! later entry rather than failing.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use wirecall_link::limits::{MAX_NAME, MIN_NAME};

use crate::error::{Result, RpcError};

/// Maximum number of registered functions.
pub const REG_MAX: usize = 16;

/// Failure modes a handler can report.
///
/// Each variant maps to the short ASCII tag carried in the args field of
/// the resulting error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum HandlerError {
    /// The output did not fit in the provided buffer.
    #[error("handler output overflow")]
    Overflow,
    /// The request arguments were malformed for this function.
    #[error("handler rejected arguments")]
    InvalidArgs,
    /// The handler gave up within its processing budget.
    #[error("handler timed out")]
    Timeout,
    /// Any other handler failure.
    #[error("handler failed")]
    Failed,
}

impl HandlerError {
    /// Wire tag sent in the error response.
    pub fn tag(self) -> &'static str {
        match self {
            Self::Overflow => "OVERFLOW",
            Self::InvalidArgs => "INVALID_ARGS",
            Self::Timeout => "TIMEOUT",
            Self::Failed => "FAIL",
        }
    }
}

/// What a handler returns: bytes written into the output buffer, or a
/// failure to report to the remote caller.
pub type HandlerResult = std::result::Result<usize, HandlerError>;

/// A registered function body.
///
/// Receives the request args, an output buffer, and the advisory
/// processing budget. Must write at most `out.len()` bytes and return how
/// many it wrote.
pub type HandlerFn = dyn Fn(&[u8], &mut [u8], Duration) -> HandlerResult + Send + Sync;

struct Entry {
    name: &'static str,
    handler: Arc<HandlerFn>,
}

/// Bounded name → handler table.
pub struct Registry {
    entries: Mutex<Vec<Entry>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(Vec::with_capacity(REG_MAX)),
        }
    }

    /// Append an entry. Fails when the table is full or the name violates
    /// the wire limits.
    pub fn register(&self, name: &'static str, handler: Arc<HandlerFn>) -> Result<()> {
        if !(MIN_NAME..=MAX_NAME).contains(&name.len()) {
            return Err(RpcError::InvalidArgs("function name length"));
        }
        if name.as_bytes().contains(&0) {
            return Err(RpcError::InvalidArgs("function name contains NUL"));
        }

        let mut entries = self.entries.lock().unwrap();
        if entries.len() == REG_MAX {
            return Err(RpcError::RegistryFull);
        }
        entries.push(Entry { name, handler });
        Ok(())
    }

    /// Look up a handler by exact name; first match wins.
    pub fn find(&self, name: &str) -> Option<Arc<HandlerFn>> {
        let entries = self.entries.lock().unwrap();
        entries
            .iter()
            .find(|entry| entry.name == name)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Number of registered entries.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
