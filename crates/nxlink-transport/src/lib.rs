//! Duplex byte-stream transports for the panel link.
//!
//! Alarm panels speak over an RS-232 line that usually reaches the host
//! through a bridge: a ser2net-style TCP socket, or a pty exposed through a
//! Unix domain socket. This is the lowest layer of nxlink; everything else
//! builds on the [`LinkStream`] type provided here.

pub mod endpoint;
pub mod error;
pub mod tcp;
pub mod traits;

#[cfg(unix)]
pub mod uds;

pub use endpoint::Endpoint;
pub use error::{Result, TransportError};
pub use traits::LinkStream;
