//! Inbound dispatch: the transport thread body.
//!
//! Pulls validated link payloads off the RX queue, parses the typed
//! message, and routes it: RESP/ERR wake the waiting caller, REQ/STREAM
//! become work items for the pool. Malformed payloads are logged and
//! dropped; a full worker queue drops the request (the remote caller will
//! time out and may retry).

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, trace, warn};
use wirecall_osal::queue::{QueueRx, QueueTx, TrySendError};

use crate::message::{Message, MsgKind};
use crate::waiter::{Delivery, WaiterTable};
use crate::worker::WorkItem;

pub(crate) fn run(rx_q: QueueRx<Bytes>, waiters: Arc<WaiterTable>, work_tx: QueueTx<WorkItem>) {
    debug!("dispatcher started");
    while let Ok(payload) = rx_q.recv() {
        handle_payload(&payload, &waiters, &work_tx);
    }
    debug!("dispatcher stopped");
}

fn handle_payload(payload: &[u8], waiters: &WaiterTable, work_tx: &QueueTx<WorkItem>) {
    let msg = match Message::decode(payload) {
        Ok(msg) => msg,
        Err(err) => {
            warn!(%err, len = payload.len(), "dropping malformed payload");
            return;
        }
    };
    trace!(
        kind = ?msg.kind,
        seq = msg.seq,
        name = msg.name,
        args_len = msg.args.len(),
        "inbound message"
    );

    match msg.kind {
        MsgKind::Response | MsgKind::Error => {
            let success = msg.kind == MsgKind::Response;
            match waiters.complete(msg.seq, success, msg.args) {
                Delivery::Completed => {}
                Delivery::NoWaiter => {
                    debug!(seq = msg.seq, "no waiter for response, dropping")
                }
                Delivery::Duplicate => {
                    warn!(seq = msg.seq, "duplicate response for live request, dropping")
                }
            }
        }
        MsgKind::Request | MsgKind::Stream => {
            let item = WorkItem {
                kind: msg.kind,
                seq: msg.seq,
                name: msg.name.to_owned(),
                args: msg.args.to_vec(),
            };
            match work_tx.try_send(item) {
                Ok(()) => {}
                Err(TrySendError::Full) => {
                    warn!(name = msg.name, "worker queue full, dropping request")
                }
                Err(TrySendError::Disconnected) => {
                    debug!("worker queue closed, dropping request")
                }
            }
        }
    }
}
