//! Byte-level framing for the wirecall protocol.
//!
//! Every message crosses the wire as one frame:
//!
//! ```text
//! ┌──────────┬────────┬────────┬─────────┬──────────┬─────────┬─────────┬──────────┐
//! │ SOF 0xFA │ len_lo │ len_hi │ hdr_crc │ SOD 0xFB │ payload │ pkt_crc │ EOF 0xFE │
//! └──────────┴────────┴────────┴─────────┴──────────┴─────────┴─────────┴──────────┘
//! ```
//!
//! `len` counts the `SOD ‖ payload ‖ pkt_crc ‖ EOF` segment, so
//! `payload_len = len - 3`. `hdr_crc` covers `SOF ‖ len_lo ‖ len_hi`;
//! `pkt_crc` covers `SOD ‖ payload`. Both CRCs are bit-serial CRC-8 with
//! init `0x00` and polynomial `0x07`.
//!
//! Encoding is a single pass into a caller buffer; decoding is a
//! resynchronizing state machine fed one byte at a time, which tolerates an
//! unreliable byte transport (noise, truncation, corruption) by dropping the
//! damaged frame and hunting for the next SOF.

pub mod crc8;
pub mod error;
pub mod frame;
pub mod limits;
pub mod parser;

pub use crc8::{crc8, CRC8_INIT, CRC8_POLY};
pub use error::{LinkError, Result};
pub use frame::{encode_frame, frame_size, EOF, SOD, SOF};
pub use limits::{
    ARGS_MAX, MAX_NAME, MAX_PAYLOAD, MAX_PKT_LEN, MIN_NAME, MIN_PAYLOAD, MIN_PKT_LEN,
};
pub use parser::FrameParser;
