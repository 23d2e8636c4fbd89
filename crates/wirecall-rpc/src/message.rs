//! Typed message codec.
//!
//! A link payload is one typed message:
//!
//! ```text
//! [type:1][seq:1][name bytes…][NUL:1][args bytes…]
//! ```
//!
//! The name is a 1..=32 byte UTF-8 token with no embedded NUL; args are
//! 0..=64 raw bytes. Parsing borrows from the input buffer — no copies, no
//! partial results.

use bytes::{BufMut, Bytes, BytesMut};

use wirecall_link::limits::{ARGS_MAX, MAX_NAME, MAX_PAYLOAD, MIN_NAME, MIN_PAYLOAD};

/// Message type discriminants as they appear on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MsgKind {
    /// Call expecting a response.
    Request = 0x0B,
    /// Fire-and-forget call; `seq` is always 0.
    Stream = 0x0C,
    /// Successful response paired to a request by `seq`.
    Response = 0x16,
    /// Failure response carrying a short tag in the args field.
    Error = 0x21,
}

impl MsgKind {
    pub fn from_byte(b: u8) -> Option<Self> {
        match b {
            0x0B => Some(Self::Request),
            0x0C => Some(Self::Stream),
            0x16 => Some(Self::Response),
            0x21 => Some(Self::Error),
            _ => None,
        }
    }

    pub fn byte(self) -> u8 {
        self as u8
    }
}

/// Codec violations.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MessageError {
    #[error("unknown message type 0x{0:02X}")]
    UnknownKind(u8),

    #[error("name length {len} outside [{MIN_NAME}, {MAX_NAME}]")]
    NameLength { len: usize },

    #[error("name contains an embedded NUL")]
    NameContainsNul,

    #[error("name is not terminated")]
    NameUnterminated,

    #[error("name is not valid UTF-8")]
    NameNotUtf8,

    #[error("args length {len} exceeds {ARGS_MAX}")]
    ArgsLength { len: usize },

    #[error("payload length {len} outside [{MIN_PAYLOAD}, {MAX_PAYLOAD}]")]
    PayloadSize { len: usize },
}

/// One typed message, borrowing name and args from the decode buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Message<'a> {
    pub kind: MsgKind,
    pub seq: u8,
    pub name: &'a str,
    pub args: &'a [u8],
}

impl<'a> Message<'a> {
    /// Wire size of this message.
    pub fn encoded_len(&self) -> usize {
        1 + 1 + self.name.len() + 1 + self.args.len()
    }

    /// Serialize into `dst`. Nothing is written on error.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), MessageError> {
        let name = self.name.as_bytes();
        if !(MIN_NAME..=MAX_NAME).contains(&name.len()) {
            return Err(MessageError::NameLength { len: name.len() });
        }
        if name.contains(&0) {
            return Err(MessageError::NameContainsNul);
        }
        if self.args.len() > ARGS_MAX {
            return Err(MessageError::ArgsLength {
                len: self.args.len(),
            });
        }

        dst.reserve(self.encoded_len());
        dst.put_u8(self.kind.byte());
        dst.put_u8(self.seq);
        dst.put_slice(name);
        dst.put_u8(0);
        dst.put_slice(self.args);
        Ok(())
    }

    /// Parse one message from a complete link payload.
    pub fn decode(buf: &'a [u8]) -> Result<Self, MessageError> {
        if !(MIN_PAYLOAD..=MAX_PAYLOAD).contains(&buf.len()) {
            return Err(MessageError::PayloadSize { len: buf.len() });
        }

        let kind = MsgKind::from_byte(buf[0]).ok_or(MessageError::UnknownKind(buf[0]))?;
        let seq = buf[1];

        let name_region = &buf[2..];
        let nul = name_region
            .iter()
            .position(|&b| b == 0)
            .ok_or(MessageError::NameUnterminated)?;
        if !(MIN_NAME..=MAX_NAME).contains(&nul) {
            return Err(MessageError::NameLength { len: nul });
        }
        let name =
            std::str::from_utf8(&name_region[..nul]).map_err(|_| MessageError::NameNotUtf8)?;

        let args = &name_region[nul + 1..];
        if args.len() > ARGS_MAX {
            return Err(MessageError::ArgsLength { len: args.len() });
        }

        Ok(Self {
            kind,
            seq,
            name,
            args,
        })
    }
}

/// Build a ready-to-queue payload for one message.
pub fn encode_payload(
    kind: MsgKind,
    seq: u8,
    name: &str,
    args: &[u8],
) -> Result<Bytes, MessageError> {
    let msg = Message {
        kind,
        seq,
        name,
        args,
    };
    let mut buf = BytesMut::with_capacity(msg.encoded_len());
    msg.encode(&mut buf)?;
    Ok(buf.freeze())
}
