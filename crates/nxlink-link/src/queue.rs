use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard};

use nxlink_frame::Message;
use tracing::trace;

/// Outbound messages waiting for the link to go idle.
///
/// FIFO for [`push_back`](Self::push_back); ACKs, retries and urgent sends go
/// to the head with [`push_front`](Self::push_front). Unbounded, no duplicate
/// suppression. Clones share the same queue.
#[derive(Debug, Clone, Default)]
pub struct TransmitQueue {
    inner: Arc<Mutex<VecDeque<Message>>>,
}

impl TransmitQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message behind everything already queued.
    pub fn push_back(&self, message: Message) {
        self.lock().push_back(message);
    }

    /// Put a message ahead of everything already queued.
    pub fn push_front(&self, message: Message) {
        self.lock().push_front(message);
    }

    /// Take the head message, or `None` right away if the queue is empty.
    pub fn pop_front(&self) -> Option<Message> {
        self.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Drop every queued message, returning how many were discarded.
    pub fn clear(&self) -> usize {
        let mut queue = self.lock();
        let dropped = queue.len();
        queue.clear();
        dropped
    }

    // A producer panicking mid-push cannot leave a VecDeque half-updated, so
    // a poisoned lock is still safe to use.
    fn lock(&self) -> MutexGuard<'_, VecDeque<Message>> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// Producer handle for a link's transmit queue.
///
/// Cheap to clone and safe to use from any thread, including from inside a
/// listener callback.
#[derive(Debug, Clone, Default)]
pub struct LinkSender {
    queue: TransmitQueue,
}

impl LinkSender {
    pub fn new(queue: TransmitQueue) -> Self {
        Self { queue }
    }

    /// Queue a command behind any pending sends.
    pub fn send(&self, message: Message) {
        trace!(message = %message, "queueing message");
        self.queue.push_back(message);
    }

    /// Queue a message ahead of any pending sends.
    pub fn send_priority(&self, message: Message) {
        trace!(message = %message, "queueing priority message");
        self.queue.push_front(message);
    }

    /// Number of messages not yet written.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    pub fn queue(&self) -> &TransmitQueue {
        &self.queue
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;

    fn msg(kind: u8) -> Message {
        Message::new(kind, &[])
    }

    #[test]
    fn head_pushes_jump_the_line() {
        let queue = TransmitQueue::new();
        queue.push_back(msg(0x21));
        queue.push_back(msg(0x22));
        queue.push_front(msg(0x1D));

        let order: Vec<u8> = std::iter::from_fn(|| queue.pop_front())
            .map(|m| m.message_type())
            .collect();
        assert_eq!(order, vec![0x1D, 0x21, 0x22]);
    }

    #[test]
    fn pop_on_empty_returns_none_immediately() {
        let queue = TransmitQueue::new();
        assert!(queue.pop_front().is_none());
        assert!(queue.is_empty());
    }

    #[test]
    fn duplicates_are_kept() {
        let queue = TransmitQueue::new();
        queue.push_back(msg(0x28));
        queue.push_back(msg(0x28));
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.clear(), 2);
        assert!(queue.is_empty());
    }

    #[test]
    fn sender_shares_the_queue() {
        let queue = TransmitQueue::new();
        let sender = LinkSender::new(queue.clone());

        sender.send(msg(0x24));
        sender.send_priority(msg(0x1D));

        assert_eq!(sender.pending(), 2);
        assert_eq!(queue.pop_front().unwrap().message_type(), 0x1D);
        assert_eq!(queue.pop_front().unwrap().message_type(), 0x24);
    }

    #[test]
    fn concurrent_producers_lose_nothing() {
        let queue = TransmitQueue::new();
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let sender = LinkSender::new(queue.clone());
                thread::spawn(move || {
                    for _ in 0..100 {
                        sender.send(msg(0x28));
                        sender.send_priority(msg(0x1D));
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(queue.len(), 800);
    }

    #[test]
    fn survives_poisoned_lock() {
        let queue = TransmitQueue::new();
        let shared = queue.clone();
        let _ = thread::spawn(move || {
            let _guard = shared.inner.lock().unwrap();
            panic!("poison");
        })
        .join();

        queue.push_back(msg(0x21));
        assert_eq!(queue.len(), 1);
    }
}
