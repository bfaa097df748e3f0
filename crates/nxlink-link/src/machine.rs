use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError};
use nxlink_frame::{FrameError, FrameWriter, Message};
use tracing::{debug, error, trace, warn};

use crate::error::{LinkError, Result};
use crate::listener::ListenerRegistry;
use crate::queue::{LinkSender, TransmitQueue};

/// What one pass through the link cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CycleOutcome {
    /// Nothing was awaited and nothing arrived.
    Idle,
    /// A message arrived while no reply was pending.
    Unsolicited { acknowledged: bool },
    /// The pending command got one of its reply types.
    Replied,
    /// The pending command timed out and was put back at the head.
    NoReply,
    /// Something other than the awaited reply arrived; the command was put
    /// back and the next cycle will not transmit.
    UnexpectedReply,
}

/// The half-duplex send/await/classify/dispatch loop.
///
/// Owns the write half of the stream and the receiving end of the hand-off
/// from the reader thread. Only one command is ever awaiting a reply.
pub struct LinkMachine<W> {
    writer: FrameWriter<W>,
    inbound: Receiver<Message>,
    queue: TransmitQueue,
    sender: LinkSender,
    listeners: ListenerRegistry,
    reply_timeout: Duration,
    skip_transmit: bool,
}

impl<W: Write> LinkMachine<W> {
    pub fn new(
        writer: FrameWriter<W>,
        inbound: Receiver<Message>,
        queue: TransmitQueue,
        listeners: ListenerRegistry,
        reply_timeout: Duration,
    ) -> Self {
        Self {
            writer,
            inbound,
            sender: LinkSender::new(queue.clone()),
            queue,
            listeners,
            reply_timeout,
            skip_transmit: false,
        }
    }

    /// Run one cycle: transmit the head of the queue (unless draining an
    /// unexpected reply), wait up to the reply timeout for an inbound
    /// message, apply the ACK/retry policy and dispatch valid messages.
    ///
    /// Errors are fatal for the link: a failed write or a vanished reader.
    pub fn cycle(&mut self) -> Result<CycleOutcome> {
        let awaiting = if self.skip_transmit {
            trace!("draining unexpected reply, not transmitting");
            self.skip_transmit = false;
            None
        } else {
            self.transmit_next()?
        };

        let received = match self.inbound.recv_timeout(self.reply_timeout) {
            Ok(message) => Some(message),
            Err(RecvTimeoutError::Timeout) => None,
            Err(RecvTimeoutError::Disconnected) => {
                return Err(LinkError::ReaderStopped(
                    "inbound hand-off disconnected".to_string(),
                ));
            }
        };

        let outcome = match (awaiting, &received) {
            (None, None) => CycleOutcome::Idle,
            (None, Some(message)) => {
                let acknowledged = message.has_acknowledgement_flag();
                if acknowledged {
                    // Owed even when the checksum is bad.
                    debug!(message = %message, "acknowledging panel message");
                    self.queue.push_front(Message::ack());
                }
                CycleOutcome::Unsolicited { acknowledged }
            }
            (Some(command), None) => {
                warn!(command = %command, "no reply from panel, retrying");
                self.queue.push_front(command);
                CycleOutcome::NoReply
            }
            (Some(command), Some(reply)) if command.accepts_reply(reply) => {
                trace!(command = %command, reply = %reply, "command answered");
                CycleOutcome::Replied
            }
            (Some(command), Some(reply)) => {
                warn!(
                    command = %command,
                    received = %reply,
                    "unexpected reply, requeueing command"
                );
                self.queue.push_front(command);
                self.skip_transmit = true;
                CycleOutcome::UnexpectedReply
            }
        };

        if let Some(message) = received {
            if message.is_checksum_correct() {
                self.listeners.notify(&self.sender, &message);
            } else {
                warn!(message = %message, "checksum mismatch, not dispatching");
            }
        }

        Ok(outcome)
    }

    /// Cycle until `cancel` is set or a fatal error occurs.
    ///
    /// An error seen after cancellation was requested is the shutdown itself
    /// and is not reported. A fatal error sets `cancel`.
    pub fn run(&mut self, cancel: &AtomicBool) -> Result<()> {
        while !cancel.load(Ordering::Acquire) {
            if let Err(err) = self.cycle() {
                if cancel.swap(true, Ordering::AcqRel) {
                    debug!(error = %err, "link worker stopping");
                    return Ok(());
                }
                error!(error = %err, "link worker failed");
                return Err(err);
            }
        }
        debug!("link worker cancelled");
        Ok(())
    }

    /// Whether the next cycle will skip transmitting.
    pub fn skips_next_transmit(&self) -> bool {
        self.skip_transmit
    }

    pub fn writer(&self) -> &FrameWriter<W> {
        &self.writer
    }

    /// Pop and write the head of the queue. Returns the command when it
    /// opens a reply window.
    fn transmit_next(&mut self) -> Result<Option<Message>> {
        let Some(message) = self.queue.pop_front() else {
            return Ok(None);
        };

        match self.writer.write_message(&message) {
            Ok(()) => {}
            Err(err @ (FrameError::PayloadTooLarge { .. } | FrameError::EmptyPayload)) => {
                warn!(message = %message, error = %err, "dropping unencodable message");
                return Ok(None);
            }
            Err(err) => return Err(err.into()),
        }
        debug!(message = %message, "sent");

        Ok(message.expects_reply().then_some(message))
    }
}
