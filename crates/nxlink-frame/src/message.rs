use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::codec::{checksum, encode_frame, CHECKSUM_SIZE, MAX_PAYLOAD, START_BYTE};
use crate::error::{FrameError, Result};
use crate::types::{self, ACK_REQUIRED_FLAG, MESSAGE_TYPE_MASK, POSITIVE_ACKNOWLEDGE};

/// One panel message, immutable once built.
///
/// Inbound messages come from [`Message::from_wire`] with checksum validity
/// computed; outbound messages come from [`Message::new`] with a valid
/// checksum, or none at all when the payload is too large to frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    payload: Bytes,
    checksum: Option<[u8; CHECKSUM_SIZE]>,
    checksum_ok: bool,
    reply_types: Vec<u8>,
}

impl Message {
    /// Build an outbound message from a message type and its data bytes.
    ///
    /// The expected reply types come from the message-type catalogue; use
    /// [`Message::with_reply_types`] to override them. A payload longer than
    /// [`MAX_PAYLOAD`] gets no checksum and fails to encode; use
    /// [`Message::try_new`] to reject it up front.
    pub fn new(kind: u8, data: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(1 + data.len());
        payload.push(kind);
        payload.extend_from_slice(data);

        let sum = u8::try_from(payload.len())
            .ok()
            .map(|length| checksum(length, &payload));
        Self {
            checksum_ok: sum.is_some(),
            checksum: sum,
            payload: Bytes::from(payload),
            reply_types: types::reply_types(kind).to_vec(),
        }
    }

    /// Like [`Message::new`], but fails when the payload cannot be framed.
    pub fn try_new(kind: u8, data: &[u8]) -> Result<Self> {
        let size = 1 + data.len();
        if size > MAX_PAYLOAD {
            return Err(FrameError::PayloadTooLarge {
                size,
                max: MAX_PAYLOAD,
            });
        }
        Ok(Self::new(kind, data))
    }

    /// The host's positive acknowledgment frame.
    pub fn ack() -> Self {
        Self::new(POSITIVE_ACKNOWLEDGE, &[])
    }

    /// Build an inbound message from unstuffed frame contents: payload
    /// followed by the two checksum bytes.
    pub fn from_wire(body: &[u8]) -> Result<Self> {
        if body.len() < 1 + CHECKSUM_SIZE {
            return Err(FrameError::Truncated { len: body.len() });
        }

        let split = body.len() - CHECKSUM_SIZE;
        let payload = &body[..split];
        let received = [body[split], body[split + 1]];
        let computed = checksum(payload.len() as u8, payload);

        Ok(Self {
            payload: Bytes::copy_from_slice(payload),
            checksum: Some(received),
            checksum_ok: received == computed,
            reply_types: Vec::new(),
        })
    }

    /// Replace the set of reply types that complete this command.
    ///
    /// An empty set makes the send fire-and-forget. Duplicates are dropped,
    /// first occurrence wins.
    pub fn with_reply_types(mut self, reply_types: &[u8]) -> Self {
        let mut unique = Vec::with_capacity(reply_types.len());
        for &kind in reply_types {
            let kind = kind & MESSAGE_TYPE_MASK;
            if !unique.contains(&kind) {
                unique.push(kind);
            }
        }
        self.reply_types = unique;
        self
    }

    /// The message number (low six bits of the first payload byte).
    pub fn message_type(&self) -> u8 {
        self.raw_type() & MESSAGE_TYPE_MASK
    }

    /// The first payload byte, flags included.
    pub fn raw_type(&self) -> u8 {
        self.payload[0]
    }

    /// Whether the panel requires the host to acknowledge this message.
    pub fn has_acknowledgement_flag(&self) -> bool {
        self.raw_type() & ACK_REQUIRED_FLAG != 0
    }

    /// Whether the trailing checksum matched the payload.
    pub fn is_checksum_correct(&self) -> bool {
        self.checksum_ok
    }

    /// The payload, message-type byte first.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// The payload after the message-type byte.
    pub fn data(&self) -> &[u8] {
        &self.payload[1..]
    }

    /// The checksum as carried on the wire (`[low, high]`); `None` for an
    /// outbound payload too large to frame.
    pub fn checksum(&self) -> Option<[u8; CHECKSUM_SIZE]> {
        self.checksum
    }

    /// Message types accepted as the reply to this command.
    pub fn expected_reply_types(&self) -> &[u8] {
        &self.reply_types
    }

    /// Whether sending this message opens a reply window.
    pub fn expects_reply(&self) -> bool {
        !self.reply_types.is_empty()
    }

    /// Whether `reply` completes this command.
    pub fn accepts_reply(&self, reply: &Message) -> bool {
        self.reply_types.contains(&reply.message_type())
    }

    /// Human-readable message-type name.
    pub fn name(&self) -> &'static str {
        types::message_name(self.raw_type())
    }

    /// Append this message's wire bytes to `dst`.
    pub fn encode(&self, dst: &mut BytesMut) -> Result<()> {
        encode_frame(&self.payload, dst)
    }

    /// This message's wire bytes.
    pub fn to_wire(&self) -> Result<Bytes> {
        let mut buf = BytesMut::with_capacity(2 + self.payload.len() * 2 + CHECKSUM_SIZE);
        self.encode(&mut buf)?;
        debug_assert_eq!(buf[0], START_BYTE);
        Ok(buf.freeze())
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "0x{:02X} {}{} len={} data=[",
            self.message_type(),
            self.name(),
            if self.has_acknowledgement_flag() {
                " (ack)"
            } else {
                ""
            },
            self.payload.len(),
        )?;
        for (i, byte) in self.data().iter().enumerate() {
            if i > 0 {
                f.write_str(" ")?;
            }
            write!(f, "{byte:02X}")?;
        }
        match self.checksum {
            Some([low, high]) => write!(
                f,
                "] checksum={low:02X}{high:02X}{}",
                if self.checksum_ok { "" } else { " (bad)" }
            ),
            None => f.write_str("] checksum=none (oversized)"),
        }
    }
}
