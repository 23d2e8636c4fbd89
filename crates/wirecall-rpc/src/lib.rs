//! Transport core of the wirecall RPC stack.
//!
//! One [`Rpc`] value owns everything a single endpoint needs: the function
//! registry, the table of callers waiting on responses, and the bounded
//! queues between the protocol threads. [`Rpc::start`] connects the value
//! to a physical duplex channel and spawns the four long-lived thread
//! roles:
//!
//! - the RX pump reads channel bytes and feeds the frame parser;
//! - the dispatcher parses inbound payloads, wakes waiting callers for
//!   RESP/ERR, and hands REQ/STREAM work to the pool;
//! - the workers invoke registered handlers and produce responses;
//! - the TX pump frames outbound payloads and writes them to the channel.
//!
//! Any number of user threads may then call [`Rpc::request`] and
//! [`Rpc::stream`] concurrently through clones of the handle; responses
//! are demultiplexed back to the right caller by an 8-bit sequence number.

pub mod config;
pub mod error;
pub mod message;
pub mod registry;

mod dispatch;
mod pump;
mod rpc;
mod waiter;
mod worker;

pub use config::RpcConfig;
pub use error::{Result, RpcError};
pub use message::{Message, MessageError, MsgKind};
pub use registry::{HandlerError, HandlerResult};
pub use rpc::Rpc;

pub use wirecall_link::limits;
