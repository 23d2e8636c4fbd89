//! Physical byte channel for the wirecall stack.
//!
//! The stack consumes a duplex channel as two independent halves: a send
//! half implementing [`std::io::Write`] and a receive half implementing
//! [`std::io::Read`]. A read of `Ok(0)` means the channel closed; any
//! `io::Error` is a channel fault. Opening the channel is the
//! implementation's constructor and closing is `Drop`.
//!
//! Any `Read`/`Write` pair works — a `UnixStream` and its clone, a serial
//! port, a socket. The reference implementation here is a pair of named
//! pipes, one per direction, with the two endpoints opening the paths
//! cross-wired.

pub mod error;
pub mod fifo;

pub use error::{PhyError, Result};
pub use fifo::{open_pair, FifoReceiver, FifoSender};
