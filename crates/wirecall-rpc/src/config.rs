use std::time::Duration;

/// Tunable parameters for one endpoint.
///
/// The compile-time protocol limits (name/args/payload sizes) live in
/// [`wirecall_link::limits`]; everything negotiable at construction time is
/// here.
#[derive(Debug, Clone)]
pub struct RpcConfig {
    /// Number of handler worker threads sharing the request queue.
    pub worker_count: usize,
    /// Depth of each inter-stage queue (RX, TX, worker).
    pub queue_depth: usize,
    /// Semaphore wait applied when `request` is called without an explicit
    /// timeout.
    pub request_timeout: Duration,
    /// Advisory processing budget passed to handlers.
    pub handler_timeout: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            worker_count: 1,
            queue_depth: 16,
            request_timeout: Duration::from_millis(200),
            handler_timeout: Duration::from_millis(150),
        }
    }
}
