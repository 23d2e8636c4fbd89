//! Handler worker pool.
//!
//! Every worker blocks on the shared request queue, runs the registered
//! handler, and for request messages enqueues the response. Stream
//! messages invoke the handler and produce nothing.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, warn};
use wirecall_osal::queue::{QueueRx, QueueTx};

use wirecall_link::limits::ARGS_MAX;

use crate::message::{encode_payload, MsgKind};
use crate::registry::{HandlerError, Registry};

/// One inbound REQ/STREAM, copied out of the wire buffer with bounded
/// name and args.
#[derive(Debug)]
pub(crate) struct WorkItem {
    pub kind: MsgKind,
    pub seq: u8,
    pub name: String,
    pub args: Vec<u8>,
}

/// Why a request produced an error response instead of a result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Fault {
    NoFunc,
    Handler(HandlerError),
}

impl Fault {
    fn tag(self) -> &'static str {
        match self {
            Self::NoFunc => "NOFUNC",
            Self::Handler(err) => err.tag(),
        }
    }
}

pub(crate) fn run(
    work_rx: QueueRx<WorkItem>,
    registry: Arc<Registry>,
    tx_q: QueueTx<Bytes>,
    handler_timeout: Duration,
) {
    debug!("worker started");
    let mut out = [0u8; ARGS_MAX];
    while let Ok(item) = work_rx.recv() {
        let result = execute(&item, &registry, &mut out, handler_timeout);

        match item.kind {
            MsgKind::Request => respond(&item, result, &out, &tx_q),
            // Streams carry no seq to answer on.
            _ => {}
        }
    }
    debug!("worker stopped");
}

fn execute(
    item: &WorkItem,
    registry: &Registry,
    out: &mut [u8],
    timeout: Duration,
) -> Result<usize, Fault> {
    let Some(handler) = registry.find(&item.name) else {
        debug!(name = %item.name, "no handler registered");
        return Err(Fault::NoFunc);
    };

    match handler(&item.args, out, timeout) {
        Ok(len) if len <= out.len() => Ok(len),
        Ok(len) => {
            warn!(
                name = %item.name,
                len,
                cap = out.len(),
                "handler reported more output than its buffer holds"
            );
            Err(Fault::Handler(HandlerError::Overflow))
        }
        Err(err) => Err(Fault::Handler(err)),
    }
}

fn respond(item: &WorkItem, result: Result<usize, Fault>, out: &[u8], tx_q: &QueueTx<Bytes>) {
    let payload = match result {
        Ok(len) => encode_payload(MsgKind::Response, item.seq, &item.name, &out[..len]),
        Err(fault) => encode_payload(MsgKind::Error, item.seq, &item.name, fault.tag().as_bytes()),
    };

    match payload {
        Ok(payload) => {
            if tx_q.send(payload).is_err() {
                debug!("tx queue closed, dropping response");
            }
        }
        Err(err) => warn!(%err, seq = item.seq, "failed to build response"),
    }
}
