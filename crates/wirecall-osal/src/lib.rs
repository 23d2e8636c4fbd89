//! Concurrency primitives the wirecall stack is written against.
//!
//! The protocol layers never touch `std::thread` or a channel crate
//! directly; they consume named threads, bounded blocking queues, and
//! binary semaphores from here. Porting the stack to another runtime means
//! porting this crate only.

pub mod queue;
pub mod sem;
pub mod thread;

pub use queue::{bounded, QueueRx, QueueTx, RecvError, SendError, TrySendError};
pub use sem::BinarySemaphore;
pub use thread::spawn;

/// Block the calling thread for `ms` milliseconds.
pub fn sleep_ms(ms: u64) {
    std::thread::sleep(std::time::Duration::from_millis(ms));
}
