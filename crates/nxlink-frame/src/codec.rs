use bytes::{BufMut, BytesMut};
use tracing::{debug, trace};

use crate::error::{FrameError, Result};
use crate::message::Message;

/// Start-of-frame byte.
pub const START_BYTE: u8 = 0x7E;

/// Escape byte introducing a stuffed payload byte.
pub const ESCAPE_BYTE: u8 = 0x7D;

/// Bit cleared in a stuffed byte and restored when de-stuffing.
pub const ESCAPE_MASK: u8 = 0x20;

/// Checksum trailer: low then high running sum.
pub const CHECKSUM_SIZE: usize = 2;

/// Largest payload the one-byte length field can describe.
pub const MAX_PAYLOAD: usize = u8::MAX as usize;

/// Compute the panel's Fletcher-style checksum over the length byte and
/// payload.
///
/// Both running sums use end-around carry, so the arithmetic is mod 255 with
/// `0xFF` folded to zero. Returns `[low, high]` in wire order.
pub fn checksum(length: u8, payload: &[u8]) -> [u8; CHECKSUM_SIZE] {
    let mut sum1 = 0u8;
    let mut sum2 = 0u8;
    for &byte in std::iter::once(&length).chain(payload) {
        sum1 = add_end_around(sum1, byte);
        sum2 = add_end_around(sum2, sum1);
    }
    [sum1, sum2]
}

fn add_end_around(acc: u8, value: u8) -> u8 {
    let (sum, carry) = acc.overflowing_add(value);
    let sum = if carry { sum.wrapping_add(1) } else { sum };
    if sum == u8::MAX {
        0
    } else {
        sum
    }
}

/// Encode a payload (message-type byte first) into the wire format.
///
/// Wire format:
/// ```text
/// ┌───────┬────────┬──────────────────────┬──────────┬──────────┐
/// │ 0x7E  │ Length │ Payload (stuffed)    │ Sum low  │ Sum high │
/// │ start │ (1B)   │ 0x7E→7D 5E 0x7D→7D 5D│ (1B)     │ (1B)     │
/// └───────┴────────┴──────────────────────┴──────────┴──────────┘
/// ```
/// The length counts unstuffed payload bytes. Length and checksum bytes are
/// written as-is.
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.is_empty() {
        return Err(FrameError::EmptyPayload);
    }
    if payload.len() > MAX_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_PAYLOAD,
        });
    }

    let length = payload.len() as u8;
    let sum = checksum(length, payload);

    dst.reserve(2 + payload.len() * 2 + CHECKSUM_SIZE);
    dst.put_u8(START_BYTE);
    dst.put_u8(length);
    for &byte in payload {
        if byte == START_BYTE || byte == ESCAPE_BYTE {
            dst.put_u8(ESCAPE_BYTE);
            dst.put_u8(byte & !ESCAPE_MASK);
        } else {
            dst.put_u8(byte);
        }
    }
    dst.put_slice(&sum);
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DecodeState {
    /// Discarding bytes until a start byte.
    WaitingForStart,
    /// Got a start byte, the next byte is the length.
    WaitingForLength,
    /// Collecting `expected` unstuffed bytes (payload then checksum).
    Reading { expected: usize },
}

/// Incremental frame decoder.
///
/// Bytes are fed one at a time as they arrive; a [`Message`] is produced
/// once the announced payload and both checksum bytes are in. Checksum
/// mismatches are not errors here: the message is surfaced with
/// [`Message::is_checksum_correct`] returning false.
#[derive(Debug, Clone)]
pub struct FrameDecoder {
    state: DecodeState,
    buf: BytesMut,
    unstuff: bool,
}

impl Default for FrameDecoder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDecoder {
    /// Create a decoder waiting for a start byte.
    pub fn new() -> Self {
        Self {
            state: DecodeState::WaitingForStart,
            buf: BytesMut::with_capacity(MAX_PAYLOAD + CHECKSUM_SIZE),
            unstuff: false,
        }
    }

    /// Abandon any partial frame and wait for the next start byte.
    pub fn reset(&mut self) {
        self.state = DecodeState::WaitingForStart;
        self.buf.clear();
        self.unstuff = false;
    }

    /// Whether a frame is partially assembled.
    pub fn in_frame(&self) -> bool {
        self.state != DecodeState::WaitingForStart
    }

    /// Feed a single byte.
    ///
    /// Returns `Ok(Some(message))` when a frame completes, `Ok(None)` when
    /// more bytes are needed, and `Err(FrameError::EmptyFrame)` when a
    /// zero-length frame was discarded (the decoder is re-armed either way).
    pub fn feed(&mut self, byte: u8) -> Result<Option<Message>> {
        match self.state {
            DecodeState::WaitingForStart => {
                if byte == START_BYTE {
                    trace!("start byte");
                    self.state = DecodeState::WaitingForLength;
                }
                Ok(None)
            }
            DecodeState::WaitingForLength => {
                if byte == 0 {
                    self.reset();
                    return Err(FrameError::EmptyFrame);
                }
                self.buf.clear();
                self.unstuff = false;
                self.state = DecodeState::Reading {
                    expected: byte as usize + CHECKSUM_SIZE,
                };
                Ok(None)
            }
            DecodeState::Reading { expected } => {
                let mut byte = byte;

                // Checksum positions are taken verbatim.
                if self.buf.len() < expected - CHECKSUM_SIZE {
                    if byte == START_BYTE {
                        debug!(
                            collected = self.buf.len(),
                            expected, "start byte inside frame, resynchronising"
                        );
                        self.buf.clear();
                        self.unstuff = false;
                        self.state = DecodeState::WaitingForLength;
                        return Ok(None);
                    }
                    if byte == ESCAPE_BYTE {
                        self.unstuff = true;
                        return Ok(None);
                    }
                    if self.unstuff {
                        byte |= ESCAPE_MASK;
                        self.unstuff = false;
                    }
                }

                self.buf.put_u8(byte);
                if self.buf.len() < expected {
                    return Ok(None);
                }

                let message = Message::from_wire(&self.buf)?;
                self.reset();
                Ok(Some(message))
            }
        }
    }

    /// Feed bytes until a frame completes.
    ///
    /// Returns the message and how many bytes were consumed; bytes after a
    /// completed frame are left for the next call.
    pub fn feed_slice(&mut self, bytes: &[u8]) -> (Result<Option<Message>>, usize) {
        for (index, &byte) in bytes.iter().enumerate() {
            match self.feed(byte) {
                Ok(None) => {}
                other => return (other, index + 1),
            }
        }
        (Ok(None), bytes.len())
    }
}
