use std::io::{ErrorKind, Write};

use bytes::BytesMut;
use nxlink_transport::LinkStream;

use crate::codec::MAX_PAYLOAD;
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::FrameConfig;

/// Writes complete frames to any `Write` stream.
pub struct FrameWriter<T> {
    inner: T,
    buf: BytesMut,
}

impl<T: Write> FrameWriter<T> {
    /// Create a new frame writer.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(2 * (MAX_PAYLOAD + 4)),
        }
    }

    /// Encode a message, write the whole frame and flush (blocking).
    ///
    /// Encoding errors are reported before anything reaches the stream.
    /// Only `Interrupted` is retried; the stream is expected to be blocking,
    /// so `WouldBlock` or `TimedOut` means the write timeout expired and is
    /// returned as `FrameError::Io`.
    pub fn write_message(&mut self, message: &Message) -> Result<()> {
        self.buf.clear();
        message.encode(&mut self.buf)?;

        let mut offset = 0usize;
        while offset < self.buf.len() {
            match self.inner.write(&self.buf[offset..]) {
                Ok(0) => return Err(FrameError::ConnectionClosed),
                Ok(n) => offset += n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }

        self.flush()
    }

    /// Flush the underlying stream.
    pub fn flush(&mut self) -> Result<()> {
        loop {
            match self.inner.flush() {
                Ok(()) => return Ok(()),
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) => return Err(FrameError::Io(err)),
            }
        }
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameWriter<LinkStream> {
    /// Create a frame writer for `LinkStream` and apply write timeout from config.
    pub fn with_config_stream(inner: LinkStream, config: &FrameConfig) -> Result<Self> {
        inner
            .set_write_timeout(config.write_timeout)
            .map_err(crate::transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}
