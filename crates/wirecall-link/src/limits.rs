//! Protocol size limits shared by every layer of the stack.
//!
//! The payload bounds are derived from the message layout
//! `[type][seq][name…][NUL][args…]`, so the whole table lives here at the
//! bottom of the dependency chain.

/// Minimum function name length in bytes.
pub const MIN_NAME: usize = 1;

/// Maximum function name length in bytes.
pub const MAX_NAME: usize = 32;

/// Maximum argument/response body size in bytes.
pub const ARGS_MAX: usize = 64;

/// Smallest valid link payload: type + seq + one name byte + NUL.
pub const MIN_PAYLOAD: usize = 1 + 1 + MIN_NAME + 1;

/// Largest valid link payload: type + seq + full name + NUL + full args.
pub const MAX_PAYLOAD: usize = 1 + 1 + MAX_NAME + 1 + ARGS_MAX;

/// Smallest valid on-wire `len` field: SOD + payload + pkt_crc + EOF.
pub const MIN_PKT_LEN: usize = 1 + MIN_PAYLOAD + 1 + 1;

/// Largest valid on-wire `len` field.
pub const MAX_PKT_LEN: usize = 1 + MAX_PAYLOAD + 1 + 1;
