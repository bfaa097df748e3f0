use std::io::{ErrorKind, Read};

use bytes::{Buf, BytesMut};
use nxlink_transport::LinkStream;
use tracing::warn;

use crate::codec::FrameDecoder;
use crate::error::{FrameError, Result};
use crate::message::Message;
use crate::FrameConfig;

const READ_CHUNK_SIZE: usize = 512;

/// Reads complete messages from any `Read` stream.
///
/// Handles partial reads internally; callers always get complete messages.
/// Bytes read past the end of a frame are kept for the next call.
pub struct FrameReader<T> {
    inner: T,
    pending: BytesMut,
    decoder: FrameDecoder,
}

impl<T: Read> FrameReader<T> {
    /// Create a new frame reader.
    pub fn new(inner: T) -> Self {
        Self {
            inner,
            pending: BytesMut::with_capacity(READ_CHUNK_SIZE),
            decoder: FrameDecoder::new(),
        }
    }

    /// Read the next complete message (blocking).
    ///
    /// Bytes before a start byte are discarded and zero-length frames are
    /// dropped with a warning. A read timeout (`WouldBlock` or `TimedOut`)
    /// is returned as `FrameError::Io` with the partial frame kept, so the
    /// next call resumes it. Any other I/O error abandons the partial frame
    /// and the next call starts with a fresh start-byte search. Returns
    /// `Err(FrameError::ConnectionClosed)` when EOF is reached.
    pub fn read_message(&mut self) -> Result<Message> {
        loop {
            while !self.pending.is_empty() {
                let (result, used) = self.decoder.feed_slice(&self.pending);
                self.pending.advance(used);
                match result {
                    Ok(Some(message)) => return Ok(message),
                    Ok(None) => {}
                    Err(FrameError::EmptyFrame) => warn!("discarding zero-length frame"),
                    Err(err) => return Err(err),
                }
            }

            let mut chunk = [0u8; READ_CHUNK_SIZE];
            let read = match self.inner.read(&mut chunk) {
                Ok(n) => n,
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) => {
                    return Err(FrameError::Io(err));
                }
                Err(err) => {
                    self.decoder.reset();
                    return Err(FrameError::Io(err));
                }
            };

            if read == 0 {
                self.decoder.reset();
                return Err(FrameError::ConnectionClosed);
            }

            self.pending.extend_from_slice(&chunk[..read]);
        }
    }

    /// Whether a frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.decoder.in_frame()
    }

    /// Borrow the underlying stream.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying stream.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the reader and return the inner stream.
    pub fn into_inner(self) -> T {
        self.inner
    }
}

impl FrameReader<LinkStream> {
    /// Create a frame reader for `LinkStream` and apply read timeout from config.
    pub fn with_config_stream(inner: LinkStream, config: &FrameConfig) -> Result<Self> {
        inner
            .set_read_timeout(config.read_timeout)
            .map_err(crate::transport_to_frame_error)?;
        Ok(Self::new(inner))
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;
    use crate::codec::START_BYTE;

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut out = BytesMut::new();
        for message in messages {
            message.encode(&mut out).unwrap();
        }
        out.to_vec()
    }

    #[test]
    fn read_single_message() {
        let bytes = wire(&[Message::new(0x28, &[])]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        let message = reader.read_message().unwrap();
        assert_eq!(message.message_type(), 0x28);
        assert!(message.is_checksum_correct());
    }

    #[test]
    fn read_multiple_messages_from_one_chunk() {
        let bytes = wire(&[
            Message::new(0x04, &[0x01, 0x00]),
            Message::new(0x06, &[0x00]),
            Message::new(0x08, &[0x7E, 0x7D]),
        ]);
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_message().unwrap().message_type(), 0x04);
        assert_eq!(reader.read_message().unwrap().message_type(), 0x06);
        let third = reader.read_message().unwrap();
        assert_eq!(third.data(), &[0x7E, 0x7D]);
    }

    #[test]
    fn partial_read_handling() {
        let bytes = wire(&[Message::new(0x01, &[0x7D, 0x20, 0x7D])]);
        let mut reader = FrameReader::new(ByteByByteReader { bytes, pos: 0 });

        let message = reader.read_message().unwrap();
        assert_eq!(message.message_type(), 0x01);
        assert_eq!(message.data(), &[0x7D, 0x20, 0x7D]);
        assert!(message.is_checksum_correct());
    }

    #[test]
    fn zero_length_frame_skipped() {
        let mut bytes = vec![START_BYTE, 0x00];
        bytes.extend(wire(&[Message::new(0x0A, &[0x01])]));
        let mut reader = FrameReader::new(Cursor::new(bytes));

        assert_eq!(reader.read_message().unwrap().message_type(), 0x0A);
    }

    #[test]
    fn connection_closed_cleanly() {
        let mut reader = FrameReader::new(Cursor::new(Vec::<u8>::new()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
    }

    #[test]
    fn connection_closed_mid_frame() {
        let bytes = wire(&[Message::new(0x05, &[1, 2, 3, 4])]);
        let mut reader = FrameReader::new(Cursor::new(bytes[..5].to_vec()));
        let err = reader.read_message().unwrap_err();
        assert!(matches!(err, FrameError::ConnectionClosed));
        assert!(!reader.in_frame());
    }

    #[test]
    fn io_error_mid_frame_rearms_decoder() {
        let first = wire(&[Message::new(0x04, &[0x01, 0x02, 0x03])]);
        let second = wire(&[Message::new(0x06, &[0x00])]);

        let reader = FailingMidFrame {
            chunks: vec![first[..4].to_vec(), first[4..].to_vec(), second],
            failed: false,
        };
        let mut framed = FrameReader::new(reader);

        let err = framed.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::BrokenPipe));
        assert!(!framed.in_frame());

        // The tail of the aborted frame is ignored until the next start byte.
        let message = framed.read_message().unwrap();
        assert_eq!(message.message_type(), 0x06);
    }

    #[test]
    fn read_timeout_mid_frame_keeps_partial_frame() {
        let bytes = wire(&[Message::new(0x04, &[0x01, 0x02, 0x03])]);
        let mut framed = FrameReader::new(Scripted {
            steps: vec![
                Ok(bytes[..3].to_vec()),
                Err(ErrorKind::WouldBlock),
                Err(ErrorKind::TimedOut),
                Ok(bytes[3..].to_vec()),
            ],
        });

        let err = framed.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::WouldBlock));
        assert!(framed.in_frame());

        let err = framed.read_message().unwrap_err();
        assert!(matches!(err, FrameError::Io(ref e) if e.kind() == ErrorKind::TimedOut));
        assert!(framed.in_frame());

        let message = framed.read_message().unwrap();
        assert_eq!(message.message_type(), 0x04);
        assert_eq!(message.data(), &[0x01, 0x02, 0x03]);
        assert!(message.is_checksum_correct());
    }

    #[test]
    fn read_timeout_keeps_buffered_frames() {
        let split = wire(&[Message::new(0x08, &[0x7E])]);
        let mut bytes = wire(&[Message::new(0x06, &[0x00])]);
        bytes.extend_from_slice(&split[..2]);
        let tail = split[2..].to_vec();
        let mut framed = FrameReader::new(Scripted {
            steps: vec![Ok(bytes), Err(ErrorKind::WouldBlock), Ok(tail)],
        });

        assert_eq!(framed.read_message().unwrap().message_type(), 0x06);
        assert!(framed.read_message().is_err());
        let second = framed.read_message().unwrap();
        assert_eq!(second.message_type(), 0x08);
        assert_eq!(second.data(), &[0x7E]);
    }

    #[test]
    fn interrupted_read_retries() {
        let bytes = wire(&[Message::new(0x08, &[])]);
        let reader = InterruptedThenData {
            interrupted: false,
            inner: Cursor::new(bytes),
        };
        let mut framed = FrameReader::new(reader);
        assert_eq!(framed.read_message().unwrap().message_type(), 0x08);
    }

    #[test]
    #[cfg(unix)]
    fn roundtrip_over_pipe() {
        let (left, right) = LinkStream::pair().unwrap();
        let mut writer = crate::writer::FrameWriter::new(left);
        let mut reader = FrameReader::new(right);

        writer.write_message(&Message::new(0x21, &[])).unwrap();
        writer.write_message(&Message::ack()).unwrap();

        assert_eq!(reader.read_message().unwrap().message_type(), 0x21);
        assert_eq!(reader.read_message().unwrap().message_type(), 0x1D);
    }

    #[test]
    #[cfg(unix)]
    fn applies_read_timeout_for_link_stream() {
        let (left, _right) = LinkStream::pair().unwrap();
        let cfg = FrameConfig {
            read_timeout: Some(std::time::Duration::from_millis(10)),
            ..FrameConfig::default()
        };

        let mut reader = FrameReader::with_config_stream(left, &cfg).unwrap();
        let err = reader.read_message().unwrap_err();
        assert!(matches!(
            err,
            FrameError::Io(ref e) if matches!(e.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut)
        ));
    }

    #[test]
    fn accessors_and_into_inner() {
        let cursor = Cursor::new(Vec::<u8>::new());
        let mut reader = FrameReader::new(cursor);

        let _ = reader.get_ref();
        let _ = reader.get_mut();
        let _inner = reader.into_inner();
    }

    struct ByteByByteReader {
        bytes: Vec<u8>,
        pos: usize,
    }

    impl Read for ByteByByteReader {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.pos >= self.bytes.len() || buf.is_empty() {
                return Ok(0);
            }
            buf[0] = self.bytes[self.pos];
            self.pos += 1;
            Ok(1)
        }
    }

    struct FailingMidFrame {
        chunks: Vec<Vec<u8>>,
        failed: bool,
    }

    impl Read for FailingMidFrame {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.chunks.len() == 2 && !self.failed {
                self.failed = true;
                return Err(std::io::Error::from(ErrorKind::BrokenPipe));
            }
            if self.chunks.is_empty() {
                return Ok(0);
            }
            let chunk = self.chunks.remove(0);
            buf[..chunk.len()].copy_from_slice(&chunk);
            Ok(chunk.len())
        }
    }

    /// Replays a fixed script of chunks and errors, then reports EOF.
    struct Scripted {
        steps: Vec<std::result::Result<Vec<u8>, ErrorKind>>,
    }

    impl Read for Scripted {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if self.steps.is_empty() {
                return Ok(0);
            }
            match self.steps.remove(0) {
                Ok(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                Err(kind) => Err(std::io::Error::from(kind)),
            }
        }
    }

    struct InterruptedThenData {
        interrupted: bool,
        inner: Cursor<Vec<u8>>,
    }

    impl Read for InterruptedThenData {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(std::io::Error::from(ErrorKind::Interrupted));
            }
            self.inner.read(buf)
        }
    }
}
