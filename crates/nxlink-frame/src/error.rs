/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds what the one-byte length field can describe.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// A frame must carry at least the message-type byte.
    #[error("empty payload (a frame needs a message-type byte)")]
    EmptyPayload,

    /// A frame announced a zero length and was discarded.
    #[error("empty frame discarded")]
    EmptyFrame,

    /// Raw frame contents are shorter than message type plus checksum.
    #[error("truncated frame ({len} bytes, need at least 3)")]
    Truncated { len: usize },

    /// An I/O error occurred while reading or writing frames.
    #[error("frame I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The stream was closed.
    #[error("connection closed")]
    ConnectionClosed,
}

pub type Result<T> = std::result::Result<T, FrameError>;
