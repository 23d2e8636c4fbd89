//! The endpoint façade.

use std::io::{Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;
use tracing::info;
use wirecall_osal::queue::{self, QueueRx, QueueTx};
use wirecall_osal::thread;

use wirecall_link::limits::{ARGS_MAX, MAX_NAME, MIN_NAME};

use crate::config::RpcConfig;
use crate::dispatch;
use crate::error::{Result, RpcError};
use crate::message::{encode_payload, MsgKind};
use crate::pump;
use crate::registry::{HandlerResult, Registry};
use crate::waiter::WaiterTable;
use crate::worker;

/// One RPC endpoint.
///
/// Owns the registry, waiter table, and outbound queue. Clones share the
/// same endpoint, so any number of threads can issue calls concurrently;
/// the handle is `Send + Sync`.
///
/// Typical lifecycle: [`Rpc::new`], [`Rpc::register`] the served
/// functions, [`Rpc::start`] with the two halves of a duplex byte channel,
/// then [`Rpc::request`] / [`Rpc::stream`] from any thread.
#[derive(Clone)]
pub struct Rpc {
    shared: Arc<Shared>,
}

struct Shared {
    config: RpcConfig,
    registry: Arc<Registry>,
    waiters: Arc<WaiterTable>,
    tx_q: QueueTx<Bytes>,
    // Consumed by `start`; present only between `new` and `start`.
    tx_rx: Mutex<Option<QueueRx<Bytes>>>,
    started: AtomicBool,
}

impl Rpc {
    /// Build an endpoint. No threads run until [`Rpc::start`].
    pub fn new(config: RpcConfig) -> Self {
        let (tx_q, tx_rx) = queue::bounded(config.queue_depth);
        Self {
            shared: Arc::new(Shared {
                config,
                registry: Arc::new(Registry::new()),
                waiters: Arc::new(WaiterTable::new()),
                tx_q,
                tx_rx: Mutex::new(Some(tx_rx)),
                started: AtomicBool::new(false),
            }),
        }
    }

    /// The configuration this endpoint was built with.
    pub fn config(&self) -> &RpcConfig {
        &self.shared.config
    }

    /// Register a served function.
    ///
    /// Allowed before or after `start`. The name must be a 1..=32 byte
    /// token without NUL bytes; lookups match it byte for byte.
    pub fn register<F>(&self, name: &'static str, handler: F) -> Result<()>
    where
        F: Fn(&[u8], &mut [u8], Duration) -> HandlerResult + Send + Sync + 'static,
    {
        self.shared.registry.register(name, Arc::new(handler))?;
        info!(name, "function registered");
        Ok(())
    }

    /// Spawn the protocol threads on a duplex channel.
    ///
    /// `phy_send` and `phy_recv` are the two directions of the channel;
    /// each is owned by exactly one pump thread from here on. The threads
    /// live until the channel closes or the endpoint is torn down, and may
    /// be started only once.
    pub fn start<W, R>(&self, phy_send: W, phy_recv: R) -> Result<()>
    where
        W: Write + Send + 'static,
        R: Read + Send + 'static,
    {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(RpcError::AlreadyStarted);
        }
        let tx_rx = self
            .shared
            .tx_rx
            .lock()
            .unwrap()
            .take()
            .ok_or(RpcError::AlreadyStarted)?;

        let depth = self.shared.config.queue_depth;
        let (rx_q_tx, rx_q_rx) = queue::bounded(depth);
        let (work_tx, work_rx) = queue::bounded(depth);

        thread::spawn("rpc-rx", move || pump::run_rx(phy_recv, rx_q_tx))?;
        thread::spawn("rpc-tx", move || pump::run_tx(phy_send, tx_rx))?;

        let waiters = Arc::clone(&self.shared.waiters);
        thread::spawn("rpc-dispatch", move || {
            dispatch::run(rx_q_rx, waiters, work_tx)
        })?;

        for n in 0..self.shared.config.worker_count {
            let work_rx = work_rx.clone();
            let registry = Arc::clone(&self.shared.registry);
            let tx_q = self.shared.tx_q.clone();
            let handler_timeout = self.shared.config.handler_timeout;
            thread::spawn(&format!("rpc-worker-{n}"), move || {
                worker::run(work_rx, registry, tx_q, handler_timeout)
            })?;
        }

        info!(
            workers = self.shared.config.worker_count,
            "endpoint started"
        );
        Ok(())
    }

    /// Call a remote function and wait for its response.
    ///
    /// `resp` must be at least [`ARGS_MAX`] bytes — the response body can
    /// be up to that size and the dispatcher copies without allocating.
    /// On success returns the number of bytes written into `resp`; `resp`
    /// is untouched on every error path. `timeout` of `None` applies
    /// [`RpcConfig::request_timeout`].
    pub fn request(
        &self,
        name: &str,
        args: &[u8],
        resp: &mut [u8],
        timeout: Option<Duration>,
    ) -> Result<usize> {
        if !(MIN_NAME..=MAX_NAME).contains(&name.len()) {
            return Err(RpcError::InvalidArgs("function name length"));
        }
        if resp.len() < ARGS_MAX {
            return Err(RpcError::InvalidArgs("response buffer below ARGS_MAX"));
        }

        let ticket = self.shared.waiters.alloc(resp.len())?;

        let payload = match encode_payload(MsgKind::Request, ticket.seq, name, args) {
            Ok(payload) => payload,
            Err(err) => {
                self.shared.waiters.free(&ticket);
                return Err(err.into());
            }
        };

        if self.shared.tx_q.send(payload).is_err() {
            self.shared.waiters.free(&ticket);
            return Err(RpcError::LinkDown);
        }

        let timeout = timeout.unwrap_or(self.shared.config.request_timeout);
        if !ticket.done.take(timeout) {
            self.shared.waiters.free(&ticket);
            return Err(RpcError::Timeout(timeout));
        }

        self.shared.waiters.take_result(&ticket, resp)
    }

    /// Send a fire-and-forget message. Returns once the message is queued
    /// for transmission; no response will ever arrive.
    pub fn stream(&self, name: &str, args: &[u8]) -> Result<()> {
        if !(MIN_NAME..=MAX_NAME).contains(&name.len()) {
            return Err(RpcError::InvalidArgs("function name length"));
        }

        let payload = encode_payload(MsgKind::Stream, 0, name, args)?;
        self.shared
            .tx_q
            .send(payload)
            .map_err(|_| RpcError::LinkDown)
    }
}
