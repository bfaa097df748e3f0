//! Byte-stuffed, checksum-protected framing for the NX-584 serial protocol.
//!
//! Every message travels as:
//! - a `0x7E` start byte for stream synchronization
//! - a one-byte length counting the unstuffed payload
//! - the payload (message-type byte first), with `0x7E`/`0x7D` escaped
//! - a two-byte Fletcher-style checksum over length and payload
//!
//! The decoder is incremental: it can be fed one byte at a time as bytes
//! arrive on the serial line, and recovers from corruption by discarding
//! everything up to the next start byte.

pub mod codec;
pub mod error;
pub mod message;
pub mod reader;
pub mod types;
pub mod writer;

#[cfg(feature = "async")]
pub mod async_codec;

pub use codec::{
    checksum, encode_frame, FrameDecoder, CHECKSUM_SIZE, ESCAPE_BYTE, MAX_PAYLOAD, START_BYTE,
};
pub use error::{FrameError, Result};
pub use message::Message;
pub use reader::FrameReader;
pub use writer::FrameWriter;

#[cfg(feature = "async")]
pub use async_codec::PanelCodec;

/// Stream timeouts applied by the `with_config_stream` constructors.
#[derive(Debug, Clone, Default)]
pub struct FrameConfig {
    /// Read timeout for blocking operations. `None` blocks until data arrives.
    pub read_timeout: Option<std::time::Duration>,
    /// Write timeout for blocking operations.
    pub write_timeout: Option<std::time::Duration>,
}

fn transport_to_frame_error(err: nxlink_transport::TransportError) -> FrameError {
    match err {
        nxlink_transport::TransportError::Io(io) => FrameError::Io(io),
        nxlink_transport::TransportError::Connect { source, .. } => FrameError::Io(source),
        other => FrameError::Io(std::io::Error::other(other.to_string())),
    }
}
