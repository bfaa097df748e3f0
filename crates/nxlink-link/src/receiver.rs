use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{SendTimeoutError, Sender};
use nxlink_frame::{FrameError, FrameReader, Message};
use tracing::{debug, error, trace, warn};

use crate::error::Result;

/// Decode frames off the stream and hand each one to the link worker.
///
/// The hand-off waits at most `handoff_timeout` for the worker; a frame
/// nobody takes in time is dropped so reception never stalls. Read timeouts
/// are only a chance to check `cancel`. Returns when cancelled, when the
/// worker is gone or on a fatal read error; any error seen after `cancel`
/// was set is reported as a clean stop.
pub fn run_receiver<R: Read>(
    reader: &mut FrameReader<R>,
    handoff: &Sender<Message>,
    handoff_timeout: Duration,
    cancel: &AtomicBool,
) -> Result<()> {
    while !cancel.load(Ordering::Acquire) {
        let message = match reader.read_message() {
            Ok(message) => message,
            Err(FrameError::Io(err))
                if matches!(err.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut) =>
            {
                trace!("read timeout");
                continue;
            }
            Err(err) if cancel.load(Ordering::Acquire) => {
                debug!(error = %err, "link reader stopping");
                return Ok(());
            }
            Err(err) => {
                error!(error = %err, "link reader failed");
                return Err(err.into());
            }
        };

        debug!(message = %message, "received");
        match handoff.send_timeout(message, handoff_timeout) {
            Ok(()) => {}
            Err(SendTimeoutError::Timeout(message)) => {
                warn!(message = %message, "link worker busy, dropping frame");
            }
            Err(SendTimeoutError::Disconnected(_)) => {
                debug!("link worker gone, reader exiting");
                return Ok(());
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use bytes::BytesMut;
    use crossbeam_channel::bounded;

    use super::*;
    use crate::error::LinkError;

    fn wire(messages: &[Message]) -> Vec<u8> {
        let mut out = BytesMut::new();
        for message in messages {
            message.encode(&mut out).unwrap();
        }
        out.to_vec()
    }

    #[test]
    fn hands_off_every_frame_then_reports_eof() {
        let bytes = wire(&[Message::new(0x04, &[0x00]), Message::new(0x06, &[0x01])]);
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let (tx, rx) = bounded(4);

        let err = run_receiver(&mut reader, &tx, Duration::from_millis(50), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, LinkError::Frame(FrameError::ConnectionClosed)));

        let types: Vec<u8> = rx.try_iter().map(|m| m.message_type()).collect();
        assert_eq!(types, vec![0x04, 0x06]);
    }

    #[test]
    fn drops_frame_when_nobody_takes_it() {
        let bytes = wire(&[Message::new(0x04, &[0x00]), Message::new(0x06, &[0x01])]);
        let mut reader = FrameReader::new(Cursor::new(bytes));
        // Zero capacity and no receiver waiting: every hand-off times out.
        let (tx, rx) = bounded::<Message>(0);

        let err = run_receiver(&mut reader, &tx, Duration::from_millis(10), &AtomicBool::new(false))
            .unwrap_err();
        assert!(matches!(err, LinkError::Frame(FrameError::ConnectionClosed)));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn exits_cleanly_when_worker_is_gone() {
        let bytes = wire(&[Message::new(0x04, &[0x00])]);
        let mut reader = FrameReader::new(Cursor::new(bytes));
        let (tx, rx) = bounded::<Message>(0);
        drop(rx);

        assert!(run_receiver(&mut reader, &tx, Duration::from_millis(10), &AtomicBool::new(false))
            .is_ok());
    }

    #[test]
    fn eof_after_cancel_is_a_clean_stop() {
        let cancel = AtomicBool::new(false);
        let (tx, _rx) = bounded::<Message>(0);
        let mut reader = FrameReader::new(CancelOnRead { cancel: &cancel });

        assert!(run_receiver(&mut reader, &tx, Duration::from_millis(10), &cancel).is_ok());
    }

    #[test]
    #[cfg(unix)]
    fn read_timeouts_only_poll_cancel() {
        use std::sync::Arc;

        use nxlink_frame::FrameConfig;
        use nxlink_transport::LinkStream;

        let (left, _right) = LinkStream::pair().unwrap();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_stream(left, &config).unwrap();
        let (tx, _rx) = bounded::<Message>(0);
        let cancel = Arc::new(AtomicBool::new(false));
        let stop = Arc::clone(&cancel);

        let stopper = std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(50));
            stop.store(true, Ordering::SeqCst);
        });

        assert!(run_receiver(&mut reader, &tx, Duration::from_millis(10), &cancel).is_ok());
        stopper.join().unwrap();
    }

    #[test]
    #[cfg(unix)]
    fn frame_split_across_read_timeouts_is_delivered() {
        use std::io::Write;
        use std::sync::Arc;

        use nxlink_frame::FrameConfig;
        use nxlink_transport::LinkStream;

        let (host, mut panel) = LinkStream::pair().unwrap();
        let config = FrameConfig {
            read_timeout: Some(Duration::from_millis(10)),
            ..FrameConfig::default()
        };
        let mut reader = FrameReader::with_config_stream(host, &config).unwrap();
        let (tx, rx) = bounded::<Message>(1);
        let cancel = Arc::new(AtomicBool::new(false));
        let reader_cancel = Arc::clone(&cancel);

        let receiver = std::thread::spawn(move || {
            run_receiver(&mut reader, &tx, Duration::from_millis(500), &reader_cancel)
        });

        let bytes = wire(&[Message::new(0x84, &[0x01, 0x7E, 0x02, 0x00, 0x00, 0x00])]);
        let half = bytes.len() / 2;
        panel.write_all(&bytes[..half]).unwrap();
        // Several read timeouts fire while the frame is half assembled.
        std::thread::sleep(Duration::from_millis(30));
        panel.write_all(&bytes[half..]).unwrap();

        let message = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!(message.message_type(), 0x04);
        assert!(message.has_acknowledgement_flag());
        assert_eq!(message.data(), &[0x01, 0x7E, 0x02, 0x00, 0x00, 0x00]);
        assert!(message.is_checksum_correct());

        cancel.store(true, Ordering::SeqCst);
        assert!(receiver.join().unwrap().is_ok());
    }

    /// Simulates `stop()` shutting the stream down under a pending read.
    struct CancelOnRead<'a> {
        cancel: &'a AtomicBool,
    }

    impl Read for CancelOnRead<'_> {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            self.cancel.store(true, Ordering::SeqCst);
            Ok(0)
        }
    }
}
