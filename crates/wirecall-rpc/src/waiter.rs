//! Request waiter table.
//!
//! A fixed pool of rendezvous slots pairing each in-flight request with
//! the response that will carry its sequence number. The allocating caller
//! blocks on the slot's binary semaphore; the inbound dispatcher fills the
//! slot and gives the semaphore.
//!
//! Slots are identified locally by `(index, generation)`; the generation
//! is bumped at every allocation so a stale ticket (from a timed-out call)
//! and a duplicate completion can never touch a reused slot. On the wire a
//! response is still matched by the 8-bit `seq` alone.

use std::sync::{Arc, Mutex};

use tracing::warn;
use wirecall_osal::sem::BinarySemaphore;

use wirecall_link::limits::ARGS_MAX;

use crate::error::{Result, RpcError};

/// Number of concurrently outstanding requests per endpoint.
pub(crate) const WAITER_MAX: usize = 8;

/// Allocation retry budget: attempts × 1 ms sleep.
const ALLOC_ATTEMPTS: usize = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
    Pending,
    Done { len: usize },
    RemoteError { len: usize },
    Overflow { needed: usize },
}

struct Slot {
    in_use: bool,
    seq: u8,
    gen: u32,
    outcome: Outcome,
    cap: usize,
    buf: [u8; ARGS_MAX],
    done: Arc<BinarySemaphore>,
}

impl Slot {
    fn new() -> Self {
        Self {
            in_use: false,
            seq: 0,
            gen: 0,
            outcome: Outcome::Pending,
            cap: 0,
            buf: [0; ARGS_MAX],
            done: Arc::new(BinarySemaphore::new()),
        }
    }
}

struct Inner {
    slots: Vec<Slot>,
    next_seq: u8,
}

/// Claim on one slot, held by the caller for the lifetime of its request.
#[derive(Debug)]
pub(crate) struct Ticket {
    pub seq: u8,
    pub done: Arc<BinarySemaphore>,
    index: usize,
    gen: u32,
}

/// Result of delivering an inbound response to the table.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Delivery {
    /// A pending waiter was filled and woken.
    Completed,
    /// No in-use slot carries this seq; the response is stale.
    NoWaiter,
    /// The slot was already completed this allocation; dropped.
    Duplicate,
}

pub(crate) struct WaiterTable {
    inner: Mutex<Inner>,
}

impl WaiterTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                slots: (0..WAITER_MAX).map(|_| Slot::new()).collect(),
                next_seq: 1,
            }),
        }
    }

    /// Claim a free slot under a fresh sequence number.
    ///
    /// `cap` is the caller's response capacity, checked against the body
    /// length at delivery. When every slot is busy the claim is retried
    /// with a 1 ms sleep for up to [`ALLOC_ATTEMPTS`] rounds.
    pub fn alloc(&self, cap: usize) -> Result<Ticket> {
        for _ in 0..ALLOC_ATTEMPTS {
            {
                let mut inner = self.inner.lock().unwrap();

                let seq = inner.next_seq;
                inner.next_seq = match inner.next_seq.wrapping_add(1) {
                    0 => 1, // 0 is reserved for streams
                    next => next,
                };

                if let Some(index) = inner.slots.iter().position(|slot| !slot.in_use) {
                    let slot = &mut inner.slots[index];
                    slot.in_use = true;
                    slot.seq = seq;
                    slot.gen = slot.gen.wrapping_add(1);
                    slot.outcome = Outcome::Pending;
                    slot.cap = cap;
                    // Drain a permit left behind by a completion that lost
                    // the race against its caller's timeout.
                    slot.done.try_take();

                    return Ok(Ticket {
                        seq,
                        done: Arc::clone(&slot.done),
                        index,
                        gen: slot.gen,
                    });
                }
            }
            wirecall_osal::sleep_ms(1);
        }
        Err(RpcError::SlotsExhausted)
    }

    /// Deliver an inbound RESP/ERR body to the waiter with this seq.
    ///
    /// The semaphore is given with the table lock released; a slot is
    /// signaled at most once per allocation.
    pub fn complete(&self, seq: u8, success: bool, body: &[u8]) -> Delivery {
        let sem = {
            let mut inner = self.inner.lock().unwrap();
            let Some(slot) = inner
                .slots
                .iter_mut()
                .find(|slot| slot.in_use && slot.seq == seq)
            else {
                return Delivery::NoWaiter;
            };

            if slot.outcome != Outcome::Pending {
                return Delivery::Duplicate;
            }

            if body.len() > slot.cap {
                slot.outcome = Outcome::Overflow { needed: body.len() };
            } else {
                slot.buf[..body.len()].copy_from_slice(body);
                slot.outcome = if success {
                    Outcome::Done { len: body.len() }
                } else {
                    Outcome::RemoteError { len: body.len() }
                };
            }
            Arc::clone(&slot.done)
        };

        sem.give();
        Delivery::Completed
    }

    /// Copy the delivered outcome into `resp` and release the slot.
    ///
    /// Called by the allocating caller after its semaphore wait succeeded.
    pub fn take_result(&self, ticket: &Ticket, resp: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let slot = &mut inner.slots[ticket.index];
        debug_assert!(slot.in_use && slot.gen == ticket.gen);

        let outcome = slot.outcome;
        let result = match outcome {
            Outcome::Done { len } => {
                resp[..len].copy_from_slice(&slot.buf[..len]);
                Ok(len)
            }
            Outcome::RemoteError { len } => Err(RpcError::Remote {
                tag: String::from_utf8_lossy(&slot.buf[..len]).into_owned(),
            }),
            Outcome::Overflow { needed } => Err(RpcError::ResponseOverflow {
                len: needed,
                cap: slot.cap,
            }),
            Outcome::Pending => {
                warn!(seq = ticket.seq, "woken without a delivered outcome");
                Err(RpcError::LinkDown)
            }
        };

        slot.in_use = false;
        result
    }

    /// Release a slot without reading it (timeout and send-failure paths).
    ///
    /// A completion that raced in after the caller gave up is discarded; a
    /// ticket from an older generation is ignored.
    pub fn free(&self, ticket: &Ticket) {
        let mut inner = self.inner.lock().unwrap();
        let slot = &mut inner.slots[ticket.index];
        if slot.gen == ticket.gen {
            slot.in_use = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use super::*;

    #[test]
    fn live_seqs_are_unique_and_nonzero() {
        let table = WaiterTable::new();
        let tickets: Vec<_> = (0..WAITER_MAX).map(|_| table.alloc(64).unwrap()).collect();

        let seqs: HashSet<u8> = tickets.iter().map(|t| t.seq).collect();
        assert_eq!(seqs.len(), WAITER_MAX);
        assert!(!seqs.contains(&0));
    }

    #[test]
    fn seq_counter_skips_zero_across_wrap() {
        let table = WaiterTable::new();
        let mut seen_zero = false;
        for _ in 0..300 {
            let ticket = table.alloc(64).unwrap();
            seen_zero |= ticket.seq == 0;
            table.free(&ticket);
        }
        assert!(!seen_zero);
    }

    #[test]
    fn alloc_fails_when_table_stays_full() {
        let table = WaiterTable::new();
        let _held: Vec<_> = (0..WAITER_MAX).map(|_| table.alloc(64).unwrap()).collect();

        let err = table.alloc(64).unwrap_err();
        assert!(matches!(err, RpcError::SlotsExhausted));
    }

    #[test]
    fn alloc_succeeds_after_free() {
        let table = WaiterTable::new();
        let tickets: Vec<_> = (0..WAITER_MAX).map(|_| table.alloc(64).unwrap()).collect();
        table.free(&tickets[3]);

        let ticket = table.alloc(64).unwrap();
        assert_ne!(ticket.seq, 0);
    }

    #[test]
    fn successful_delivery_reaches_the_caller() {
        let table = WaiterTable::new();
        let ticket = table.alloc(64).unwrap();

        assert_eq!(table.complete(ticket.seq, true, b"pong"), Delivery::Completed);
        assert!(ticket.done.take(Duration::from_millis(100)));

        let mut resp = [0u8; 64];
        let len = table.take_result(&ticket, &mut resp).unwrap();
        assert_eq!(&resp[..len], b"pong");
    }

    #[test]
    fn error_delivery_carries_the_tag() {
        let table = WaiterTable::new();
        let ticket = table.alloc(64).unwrap();

        table.complete(ticket.seq, false, b"NOFUNC");
        assert!(ticket.done.take(Duration::from_millis(100)));

        let mut resp = [0u8; 64];
        let err = table.take_result(&ticket, &mut resp).unwrap_err();
        assert!(matches!(err, RpcError::Remote { tag } if tag == "NOFUNC"));
    }

    #[test]
    fn oversized_delivery_leaves_buffer_unwritten() {
        let table = WaiterTable::new();
        let ticket = table.alloc(4).unwrap();

        table.complete(ticket.seq, true, b"more-than-four");
        assert!(ticket.done.take(Duration::from_millis(100)));

        let mut resp = [0xEEu8; 8];
        let err = table.take_result(&ticket, &mut resp).unwrap_err();
        assert!(matches!(
            err,
            RpcError::ResponseOverflow { len: 14, cap: 4 }
        ));
        assert_eq!(resp, [0xEEu8; 8]);
    }

    #[test]
    fn unknown_seq_is_reported_stale() {
        let table = WaiterTable::new();
        assert_eq!(table.complete(42, true, b"late"), Delivery::NoWaiter);
    }

    #[test]
    fn duplicate_completion_is_dropped() {
        let table = WaiterTable::new();
        let ticket = table.alloc(64).unwrap();

        assert_eq!(table.complete(ticket.seq, true, b"one"), Delivery::Completed);
        assert_eq!(table.complete(ticket.seq, true, b"two"), Delivery::Duplicate);

        assert!(ticket.done.take(Duration::from_millis(100)));
        let mut resp = [0u8; 64];
        let len = table.take_result(&ticket, &mut resp).unwrap();
        assert_eq!(&resp[..len], b"one");
    }

    #[test]
    fn completion_after_timeout_free_is_stale() {
        let table = WaiterTable::new();
        let ticket = table.alloc(64).unwrap();
        let seq = ticket.seq;

        // Caller timed out and released the slot.
        table.free(&ticket);
        assert_eq!(table.complete(seq, true, b"late"), Delivery::NoWaiter);
    }

    #[test]
    fn racing_completion_does_not_leak_a_permit_into_reuse() {
        let table = WaiterTable::new();
        let ticket = table.alloc(64).unwrap();

        // Completion lands, then the caller times out anyway and frees.
        table.complete(ticket.seq, true, b"raced");
        table.free(&ticket);

        // The reused slot must not wake instantly from the residual permit.
        let fresh = table.alloc(64).unwrap();
        assert!(!fresh.done.take(Duration::from_millis(20)));
    }

    #[test]
    fn stale_ticket_free_does_not_release_reused_slot() {
        let table = WaiterTable::new();
        let first = table.alloc(64).unwrap();
        table.free(&first);

        // Same physical slot, new generation.
        let second = table.alloc(64).unwrap();
        table.free(&first); // stale: must be a no-op

        assert_eq!(
            table.complete(second.seq, true, b"ok"),
            Delivery::Completed
        );
    }
}
