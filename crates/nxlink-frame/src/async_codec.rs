use bytes::{Buf, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::warn;

use crate::codec::FrameDecoder;
use crate::error::{FrameError, Result};
use crate::message::Message;

/// `tokio_util` codec for panel frames.
///
/// Wraps the same incremental [`FrameDecoder`] the blocking reader uses, so
/// resynchronization and checksum semantics are identical. Zero-length frames
/// are dropped with a warning instead of failing the stream.
#[derive(Debug, Default)]
pub struct PanelCodec {
    decoder: FrameDecoder,
}

impl PanelCodec {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Decoder for PanelCodec {
    type Item = Message;
    type Error = FrameError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Message>> {
        while !src.is_empty() {
            let (result, used) = self.decoder.feed_slice(&src[..]);
            src.advance(used);
            match result {
                Ok(Some(message)) => return Ok(Some(message)),
                Ok(None) => {}
                Err(FrameError::EmptyFrame) => warn!("discarding zero-length frame"),
                Err(err) => return Err(err),
            }
        }
        Ok(None)
    }
}

impl Encoder<&Message> for PanelCodec {
    type Error = FrameError;

    fn encode(&mut self, item: &Message, dst: &mut BytesMut) -> Result<()> {
        item.encode(dst)
    }
}

impl Encoder<Message> for PanelCodec {
    type Error = FrameError;

    fn encode(&mut self, item: Message, dst: &mut BytesMut) -> Result<()> {
        item.encode(dst)
    }
}
