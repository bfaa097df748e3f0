use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use nxlink_frame::{FrameReader, FrameWriter, Message};
use nxlink_transport::LinkStream;
use tracing::{debug, info, warn};

use crate::config::LinkConfig;
use crate::error::{LinkError, Result};
use crate::listener::{ListenerRegistry, MessageListener};
use crate::machine::LinkMachine;
use crate::queue::{LinkSender, TransmitQueue};
use crate::receiver::run_receiver;

/// A half-duplex link to one panel.
///
/// Messages can be queued and listeners registered before or after
/// [`start`](Self::start). Once started, a reader thread decodes frames and a
/// worker thread drives the send/await/acknowledge cycle until [`stop`]
/// is called or the stream fails. A failed link is not reconnected; stop it
/// and start a new stream.
///
/// [`stop`]: Self::stop
pub struct Link {
    config: LinkConfig,
    queue: TransmitQueue,
    sender: LinkSender,
    listeners: ListenerRegistry,
    running: Option<Running>,
}

struct Running {
    stream: LinkStream,
    cancel: Arc<AtomicBool>,
    reader: JoinHandle<Result<()>>,
    worker: JoinHandle<Result<()>>,
}

impl Link {
    pub fn new(config: LinkConfig) -> Self {
        let queue = TransmitQueue::new();
        Self {
            config,
            sender: LinkSender::new(queue.clone()),
            queue,
            listeners: ListenerRegistry::new(),
            running: None,
        }
    }

    /// Subscribe to every checksum-valid inbound message.
    ///
    /// Returns `false` if this listener instance is already registered.
    pub fn on_message(&self, listener: Arc<dyn MessageListener>) -> bool {
        self.listeners.subscribe(listener)
    }

    /// Queue a command behind any pending sends.
    pub fn send(&self, message: Message) {
        self.sender.send(message);
    }

    /// Queue a message ahead of any pending sends.
    pub fn send_priority(&self, message: Message) {
        self.sender.send_priority(message);
    }

    /// A producer handle that outlives borrows of the link.
    pub fn sender(&self) -> LinkSender {
        self.sender.clone()
    }

    pub fn config(&self) -> &LinkConfig {
        &self.config
    }

    /// Messages queued but not yet written.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Take ownership of `stream` and spawn the reader and worker threads.
    ///
    /// Fails with [`LinkError::AlreadyRunning`] until a previous run has been
    /// reaped with [`stop`](Self::stop), even if it already died.
    pub fn start(&mut self, stream: LinkStream) -> Result<()> {
        if self.running.is_some() {
            return Err(LinkError::AlreadyRunning);
        }

        let frame_config = self.config.frame_config();
        let mut reader = FrameReader::with_config_stream(stream.try_clone()?, &frame_config)?;
        let writer = FrameWriter::with_config_stream(stream.try_clone()?, &frame_config)?;

        let (handoff, inbound) = crossbeam_channel::bounded::<Message>(0);
        let cancel = Arc::new(AtomicBool::new(false));
        let handoff_timeout = self.config.handoff_timeout;

        let reader_name = format!("{}-reader", self.config.thread_name);
        let reader_cancel = Arc::clone(&cancel);
        let reader_thread = thread::Builder::new()
            .name(reader_name.clone())
            .spawn(move || run_receiver(&mut reader, &handoff, handoff_timeout, &reader_cancel))
            .map_err(|source| LinkError::Spawn {
                name: reader_name,
                source,
            })?;

        let mut machine = LinkMachine::new(
            writer,
            inbound,
            self.queue.clone(),
            self.listeners.clone(),
            self.config.reply_timeout,
        );
        let worker_name = format!("{}-worker", self.config.thread_name);
        let worker_cancel = Arc::clone(&cancel);
        let spawned = thread::Builder::new()
            .name(worker_name.clone())
            .spawn(move || {
                let result = machine.run(&worker_cancel);
                if result.is_err() {
                    // Unblock the reader so the whole link winds down.
                    let _ = machine.writer().get_ref().shutdown();
                }
                result
            });

        let worker_thread = match spawned {
            Ok(handle) => handle,
            Err(source) => {
                cancel.store(true, Ordering::Release);
                let _ = stream.shutdown();
                let _ = reader_thread.join();
                return Err(LinkError::Spawn {
                    name: worker_name,
                    source,
                });
            }
        };

        info!(
            transport = stream.transport_name(),
            reply_timeout_ms = self.config.reply_timeout.as_millis() as u64,
            "link started"
        );
        self.running = Some(Running {
            stream,
            cancel,
            reader: reader_thread,
            worker: worker_thread,
        });
        Ok(())
    }

    /// Whether the link threads are up and no stop or failure has occurred.
    pub fn is_running(&self) -> bool {
        self.running.as_ref().is_some_and(|running| {
            !running.cancel.load(Ordering::Acquire)
                && !running.worker.is_finished()
                && !running.reader.is_finished()
        })
    }

    /// Stop the link and wait for both threads to exit.
    ///
    /// Safe to call repeatedly; calls after the first return `Ok(())`.
    /// If the link had already failed on its own, returns the cause.
    /// A worker blocked in a reply wait notices within one reply timeout at
    /// most; usually the reader exiting wakes it at once.
    pub fn stop(&mut self) -> Result<()> {
        let Some(running) = self.running.take() else {
            return Ok(());
        };

        running.cancel.store(true, Ordering::Release);
        if let Err(err) = running.stream.shutdown() {
            debug!(error = %err, "stream shutdown failed");
        }

        // Errors hit after the cancel flag was set are reported as Ok by the
        // threads, so anything left here happened before `stop`.
        let worker = join(running.worker, "worker");
        let reader = join(running.reader, "reader");
        info!("link stopped");

        match (worker, reader) {
            // The worker only noticed the reader going away; report why it did.
            (Err(LinkError::ReaderStopped(_)), Err(cause)) => Err(cause),
            (Err(err), _) | (Ok(()), Err(err)) => Err(err),
            (Ok(()), Ok(())) => Ok(()),
        }
    }
}

impl Drop for Link {
    fn drop(&mut self) {
        if let Err(err) = self.stop() {
            warn!(error = %err, "link failed before drop");
        }
    }
}

fn join(handle: JoinHandle<Result<()>>, role: &str) -> Result<()> {
    handle
        .join()
        .unwrap_or_else(|_| Err(LinkError::WorkerPanicked(role.to_string())))
}
