use std::time::Duration;

use crossbeam_channel as channel;

/// Sending on a queue whose receivers are all gone.
#[derive(Debug, PartialEq, Eq)]
pub struct SendError;

/// Non-blocking send outcome when the item could not be queued.
#[derive(Debug, PartialEq, Eq)]
pub enum TrySendError {
    /// The queue is at capacity right now.
    Full,
    /// All receivers are gone; the queue will never drain.
    Disconnected,
}

/// Receiving on a queue whose senders are all gone and which is empty.
#[derive(Debug, PartialEq, Eq)]
pub struct RecvError;

/// Create a bounded blocking FIFO with `depth` slots.
///
/// Both halves are cloneable: the worker pool shares one receiver between
/// several threads, and the transport entry points share one sender.
pub fn bounded<T>(depth: usize) -> (QueueTx<T>, QueueRx<T>) {
    let (tx, rx) = channel::bounded(depth);
    (QueueTx { tx }, QueueRx { rx })
}

/// Producer half of a bounded queue.
#[derive(Debug)]
pub struct QueueTx<T> {
    tx: channel::Sender<T>,
}

impl<T> Clone for QueueTx<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

impl<T> QueueTx<T> {
    /// Block until the item is queued (or all receivers are gone).
    pub fn send(&self, item: T) -> Result<(), SendError> {
        self.tx.send(item).map_err(|_| SendError)
    }

    /// Queue the item only if a slot is free right now.
    pub fn try_send(&self, item: T) -> Result<(), TrySendError> {
        self.tx.try_send(item).map_err(|err| match err {
            channel::TrySendError::Full(_) => TrySendError::Full,
            channel::TrySendError::Disconnected(_) => TrySendError::Disconnected,
        })
    }

    /// Block for at most `timeout` waiting for a free slot.
    pub fn send_timeout(&self, item: T, timeout: Duration) -> Result<(), TrySendError> {
        self.tx.send_timeout(item, timeout).map_err(|err| match err {
            channel::SendTimeoutError::Timeout(_) => TrySendError::Full,
            channel::SendTimeoutError::Disconnected(_) => TrySendError::Disconnected,
        })
    }
}

/// Consumer half of a bounded queue.
#[derive(Debug)]
pub struct QueueRx<T> {
    rx: channel::Receiver<T>,
}

impl<T> Clone for QueueRx<T> {
    fn clone(&self) -> Self {
        Self {
            rx: self.rx.clone(),
        }
    }
}

impl<T> QueueRx<T> {
    /// Block until an item arrives (or all senders are gone).
    pub fn recv(&self) -> Result<T, RecvError> {
        self.rx.recv().map_err(|_| RecvError)
    }

    /// Block for at most `timeout` waiting for an item.
    ///
    /// Returns `Err(RecvError)` both on timeout and on disconnect; callers
    /// in this stack treat the two the same way (give up on the item).
    pub fn recv_timeout(&self, timeout: Duration) -> Result<T, RecvError> {
        self.rx.recv_timeout(timeout).map_err(|_| RecvError)
    }

    /// Number of items currently queued.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    /// Whether the queue is currently empty.
    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn send_recv_in_order() {
        let (tx, rx) = bounded(4);
        tx.send(1u32).unwrap();
        tx.send(2).unwrap();
        assert_eq!(rx.recv(), Ok(1));
        assert_eq!(rx.recv(), Ok(2));
    }

    #[test]
    fn try_send_reports_full() {
        let (tx, _rx) = bounded(1);
        tx.try_send(1u32).unwrap();
        assert_eq!(tx.try_send(2), Err(TrySendError::Full));
    }

    #[test]
    fn try_send_reports_disconnected() {
        let (tx, rx) = bounded::<u32>(1);
        drop(rx);
        assert_eq!(tx.try_send(1), Err(TrySendError::Disconnected));
    }

    #[test]
    fn recv_fails_once_senders_gone_and_drained() {
        let (tx, rx) = bounded(2);
        tx.send(7u32).unwrap();
        drop(tx);
        assert_eq!(rx.recv(), Ok(7));
        assert_eq!(rx.recv(), Err(RecvError));
    }

    #[test]
    fn send_timeout_expires_on_full_queue() {
        let (tx, _rx) = bounded(1);
        tx.send(1u32).unwrap();
        assert_eq!(
            tx.send_timeout(2, Duration::from_millis(10)),
            Err(TrySendError::Full)
        );
    }

    #[test]
    fn recv_timeout_expires() {
        let (_tx, rx) = bounded::<u32>(1);
        let err = rx.recv_timeout(Duration::from_millis(10));
        assert_eq!(err, Err(RecvError));
    }

    #[test]
    fn blocked_send_completes_when_slot_frees() {
        let (tx, rx) = bounded(1);
        tx.send(1u32).unwrap();

        let sender = std::thread::spawn(move || tx.send(2));
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(rx.recv(), Ok(1));
        sender.join().unwrap().unwrap();
        assert_eq!(rx.recv(), Ok(2));
    }

    #[test]
    fn shared_receiver_hands_each_item_to_one_consumer() {
        let (tx, rx) = bounded(16);
        let rx2 = rx.clone();

        let a = std::thread::spawn(move || {
            let mut got = Vec::new();
            while let Ok(v) = rx.recv() {
                got.push(v);
            }
            got
        });
        let b = std::thread::spawn(move || {
            let mut got = Vec::new();
            while let Ok(v) = rx2.recv() {
                got.push(v);
            }
            got
        });

        for i in 0..32u32 {
            tx.send(i).unwrap();
        }
        drop(tx);

        let mut all = a.join().unwrap();
        all.extend(b.join().unwrap());
        all.sort_unstable();
        assert_eq!(all, (0..32).collect::<Vec<_>>());
    }
}
