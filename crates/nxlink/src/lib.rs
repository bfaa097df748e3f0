//! Host-side driver for the NX-584 alarm panel serial protocol.
//!
//! The panel and host exchange byte-stuffed, checksum-protected frames over a
//! half-duplex line. nxlink decodes that stream, keeps at most one command in
//! flight, retries commands the panel ignores, acknowledges panel messages
//! that ask for it and hands every valid message to your listeners.
//!
//! # Crate Structure
//!
//! - [`transport`]: Duplex byte streams to the panel (TCP and Unix socket bridges)
//! - [`frame`]: Frame codec, messages and the message-type catalogue
//! - [`link`]: Transmit queue, listeners and the link state machine (behind `link` feature)
//! - [`logging`]: `tracing-subscriber` setup for binaries (behind `logging` feature)

/// Re-export transport types.
pub mod transport {
    pub use nxlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use nxlink_frame::*;
}

/// Re-export link types (requires `link` feature).
#[cfg(feature = "link")]
pub mod link {
    pub use nxlink_link::*;
}

#[cfg(feature = "logging")]
pub mod logging;

pub use nxlink_frame::Message;

#[cfg(feature = "link")]
pub use nxlink_link::{connect, BridgeConfig, Link, LinkConfig, LinkError, LinkSender};
