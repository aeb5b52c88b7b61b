//! Transfer queue between the Receiver and Parser stages
//!
//! An unbounded crossbeam channel. Each handle keeps both endpoints, so the
//! channel can never become disconnected while a handle is alive and
//! `enqueue` cannot fail.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};
use std::fmt;

/// Unbounded, thread-safe FIFO. Cloning yields another handle to the same queue.
pub struct TransferQueue<T> {
    tx: Sender<T>,
    rx: Receiver<T>,
}

impl<T> TransferQueue<T> {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }

    /// Append an item. Never blocks.
    pub fn enqueue(&self, item: T) {
        // Disconnection is impossible: `self.rx` outlives this call.
        let _ = self.tx.send(item);
    }

    /// Take the oldest item, or `None` if the queue is currently empty.
    pub fn try_dequeue(&self) -> Option<T> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    /// Number of items currently queued
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

impl<T> Clone for TransferQueue<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            rx: self.rx.clone(),
        }
    }
}

impl<T> Default for TransferQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for TransferQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "TransferQueue[len={}]", self.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_fifo_order() {
        let queue = TransferQueue::new();
        for i in 0..5 {
            queue.enqueue(i);
        }
        assert_eq!(queue.len(), 5);

        let drained: Vec<_> = std::iter::from_fn(|| queue.try_dequeue()).collect();
        assert_eq!(drained, vec![0, 1, 2, 3, 4]);
        assert!(queue.is_empty());
        assert_eq!(queue.try_dequeue(), None);
    }

    #[test]
    fn test_concurrent_producer_consumer_preserves_order() {
        let queue = TransferQueue::new();
        let producer_queue = queue.clone();

        let producer = thread::spawn(move || {
            for i in 0..10_000u32 {
                producer_queue.enqueue(i);
            }
        });

        let mut received = Vec::with_capacity(10_000);
        while received.len() < 10_000 {
            match queue.try_dequeue() {
                Some(v) => received.push(v),
                None => thread::yield_now(),
            }
        }
        producer.join().unwrap();

        assert!(received.windows(2).all(|w| w[0] + 1 == w[1]));
        assert!(queue.is_empty());
    }

    #[test]
    fn test_clone_shares_storage() {
        let queue = TransferQueue::new();
        let other = queue.clone();
        queue.enqueue("a");
        assert_eq!(other.len(), 1);
        assert_eq!(other.try_dequeue(), Some("a"));
        assert!(queue.is_empty());
    }
}
