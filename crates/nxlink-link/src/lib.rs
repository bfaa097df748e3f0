//! Half-duplex link driver for NX-584 alarm panels.
//!
//! The panel and host share one serial line and only one command may await
//! a reply at a time. A [`Link`] owns the stream and runs two threads:
//! a reader that decodes frames and hands each one over a rendezvous, and a
//! worker that sends queued commands, waits for replies, retries on silence,
//! acknowledges panel messages that ask for it and fans valid messages out
//! to listeners.

pub mod config;
pub mod connector;
pub mod error;
pub mod link;
pub mod listener;
pub mod machine;
pub mod queue;
pub mod receiver;

pub use config::{BridgeConfig, LinkConfig, DEFAULT_TIMEOUT};
pub use connector::{connect, connect_with_listeners};
pub use error::{LinkError, Result};
pub use link::Link;
pub use listener::{ListenerRegistry, MessageListener};
pub use machine::{CycleOutcome, LinkMachine};
pub use queue::{LinkSender, TransmitQueue};
