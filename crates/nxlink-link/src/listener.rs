use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, RwLock};

use nxlink_frame::Message;
use tracing::error;

use crate::queue::LinkSender;

/// Receives every checksum-valid message the panel sends.
///
/// Called on the link worker thread; a slow listener delays the next cycle.
/// Use the sender to answer a panel prompt ahead of queued commands.
pub trait MessageListener: Send + Sync {
    fn on_message(&self, link: &LinkSender, message: &Message);
}

impl<F> MessageListener for F
where
    F: Fn(&LinkSender, &Message) + Send + Sync,
{
    fn on_message(&self, link: &LinkSender, message: &Message) {
        self(link, message)
    }
}

/// Ordered set of listeners, shared between the link handle and its worker.
#[derive(Clone, Default)]
pub struct ListenerRegistry {
    listeners: Arc<RwLock<Vec<Arc<dyn MessageListener>>>>,
}

impl ListenerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a listener. Registering the same instance again is a no-op
    /// and returns `false`.
    pub fn subscribe(&self, listener: Arc<dyn MessageListener>) -> bool {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        if listeners.iter().any(|known| Arc::ptr_eq(known, &listener)) {
            return false;
        }
        listeners.push(listener);
        true
    }

    pub fn len(&self) -> usize {
        self.snapshot().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deliver `message` to every listener in registration order.
    ///
    /// A panicking listener is logged and skipped; the rest still run.
    /// Returns how many listeners completed normally.
    pub fn notify(&self, link: &LinkSender, message: &Message) -> usize {
        // Listeners may subscribe from inside a callback, so deliver from a
        // snapshot rather than under the lock.
        let listeners = self.snapshot();
        let mut delivered = 0;
        for (index, listener) in listeners.iter().enumerate() {
            let outcome =
                panic::catch_unwind(AssertUnwindSafe(|| listener.on_message(link, message)));
            match outcome {
                Ok(()) => delivered += 1,
                Err(payload) => error!(
                    listener = index,
                    message = %message,
                    panic = panic_message(payload.as_ref()),
                    "listener panicked"
                ),
            }
        }
        delivered
    }

    fn snapshot(&self) -> Vec<Arc<dyn MessageListener>> {
        self.listeners
            .read()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl fmt::Debug for ListenerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRegistry")
            .field("listeners", &self.len())
            .finish()
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> &str {
    if let Some(text) = payload.downcast_ref::<&str>() {
        text
    } else if let Some(text) = payload.downcast_ref::<String>() {
        text
    } else {
        "<non-string panic>"
    }
}
