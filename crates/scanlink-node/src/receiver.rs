use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};

use scanlink_frame::{
    Delivery, FrameConfig, FrameError, FrameReader, Phase, ReadEvent, ReceivedIdentifier,
};
use scanlink_transport::{SerialLink, TransportError};

use crate::error::{NodeError, Result};
use crate::event::{StatusKind, StatusSink};

/// Deliveries buffered between the receive loop and the dispatcher.
pub const DEFAULT_QUEUE_CAPACITY: usize = 8;

#[derive(Debug, Clone)]
pub struct ReceiverConfig {
    pub frame: FrameConfig,
    /// Bound of the delivery queue. A full queue drops new deliveries.
    pub queue_capacity: usize,
}

impl Default for ReceiverConfig {
    fn default() -> Self {
        Self {
            frame: FrameConfig::default(),
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }
}

/// Counters kept by a [`Receiver`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReceiverStats {
    /// Frames handed to the delivery queue.
    pub frames: usize,
    /// Payload bytes in those frames.
    pub bytes: usize,
    pub timeouts: usize,
    pub oversized: usize,
    pub unreadable_identifiers: usize,
    /// Frames dropped because the queue was full.
    pub dropped: usize,
}

/// Host-side receive loop.
///
/// Owns the link for its whole lifetime. Reassembled frames go onto a bounded
/// queue for a [`Dispatcher`](crate::Dispatcher); every state change is
/// reported through the [`StatusSink`].
pub struct Receiver<L> {
    reader: FrameReader<L>,
    events: StatusSink,
    queue: SyncSender<Delivery>,
    stats: ReceiverStats,
}

impl<L: SerialLink> Receiver<L> {
    /// Wrap `link` with default limits. Returns the receiver and its queue.
    pub fn new(link: L, events: StatusSink) -> (Self, mpsc::Receiver<Delivery>) {
        Self::with_config(link, events, ReceiverConfig::default())
    }

    pub fn with_config(
        link: L,
        events: StatusSink,
        config: ReceiverConfig,
    ) -> (Self, mpsc::Receiver<Delivery>) {
        let (queue, deliveries) = mpsc::sync_channel(config.queue_capacity.max(1));
        let receiver = Self {
            reader: FrameReader::with_config(link, config.frame),
            events,
            queue,
            stats: ReceiverStats::default(),
        };
        (receiver, deliveries)
    }

    /// Advance by one read. Returns `false` when the link had nothing to offer.
    ///
    /// Fails on a link error, or with [`NodeError::QueueClosed`] once the
    /// dispatcher is gone.
    pub fn step(&mut self) -> Result<bool> {
        let event = self.reader.poll()?;
        match event {
            ReadEvent::Idle => return Ok(false),
            ReadEvent::ShortRead { got, wanted } => {
                self.events.emit(
                    StatusKind::ShortRead,
                    format!("short read on length prefix: {got} of {wanted} bytes"),
                );
            }
            ReadEvent::FrameStarted { length } => {
                self.events.emit(
                    StatusKind::FrameStarted,
                    format!("expecting image: {length} bytes"),
                );
                // An empty payload is complete as soon as its prefix is read.
                if length == 0 {
                    self.payload_received(0);
                }
            }
            ReadEvent::Progress { .. } => {}
            ReadEvent::PayloadComplete { length } => self.payload_received(length),
            ReadEvent::OversizedLength { length, max } => {
                self.stats.oversized += 1;
                self.events.emit(
                    StatusKind::OversizedLength,
                    format!("length prefix {length} exceeds maximum {max}, discarded"),
                );
            }
            ReadEvent::TimedOut {
                phase: Phase::Payload,
                received,
                expected,
            } => {
                self.stats.timeouts += 1;
                self.events.emit(
                    StatusKind::PayloadTimeout,
                    format!(
                        "image receive timed out at {received} of {expected} bytes; \
                         late bytes may desynchronize the stream"
                    ),
                );
            }
            ReadEvent::TimedOut { phase, .. } => {
                self.stats.timeouts += 1;
                self.events.emit(
                    StatusKind::PayloadTimeout,
                    format!("{phase:?} receive timed out"),
                );
            }
            ReadEvent::Delivered(delivery) => self.deliver(delivery)?,
        }
        Ok(true)
    }

    fn payload_received(&self, length: usize) {
        self.events.emit(
            StatusKind::PayloadReceived,
            format!("received image: {length} bytes"),
        );
    }

    fn deliver(&mut self, delivery: Delivery) -> Result<()> {
        match &delivery.identifier {
            ReceivedIdentifier::Text(text) => {
                self.events.emit(
                    StatusKind::IdentifierReceived,
                    format!("received identifier: {text}"),
                );
            }
            ReceivedIdentifier::Unreadable { reason, .. } => {
                self.stats.unreadable_identifiers += 1;
                self.events.emit(
                    StatusKind::IdentifierDecodeError,
                    format!("identifier unreadable: {reason}"),
                );
            }
        }

        let bytes = delivery.payload.len();
        match self.queue.try_send(delivery) {
            Ok(()) => {
                self.stats.frames += 1;
                self.stats.bytes += bytes;
            }
            Err(TrySendError::Full(delivery)) => {
                self.stats.dropped += 1;
                self.events.emit(
                    StatusKind::QueueFull,
                    format!(
                        "decode queue full, dropping image for {}",
                        delivery.identifier.as_str()
                    ),
                );
            }
            Err(TrySendError::Disconnected(_)) => {
                self.stats.dropped += 1;
                return Err(NodeError::QueueClosed);
            }
        }
        Ok(())
    }

    /// Receive until `running` is cleared or the link closes.
    ///
    /// A peer closing the link ends the loop normally. A dropped delivery
    /// queue ends it with [`NodeError::QueueClosed`]. Any other link failure
    /// is reported and returned.
    pub fn run(mut self, running: &AtomicBool) -> Result<ReceiverStats> {
        let name = self.reader.get_ref().name().to_string();
        self.events
            .emit(StatusKind::LinkOpened, format!("listening on {name}"));

        let poll_interval = self.reader.config().poll_interval;
        while running.load(Ordering::SeqCst) {
            match self.step() {
                Ok(true) => {}
                Ok(false) => std::thread::sleep(poll_interval),
                Err(NodeError::Frame(FrameError::Transport(TransportError::Closed))) => break,
                Err(NodeError::QueueClosed) => {
                    self.events.emit(
                        StatusKind::LinkClosed,
                        format!("decoder stopped, releasing {name}"),
                    );
                    return Err(NodeError::QueueClosed);
                }
                Err(err) => {
                    self.events
                        .emit(StatusKind::LinkFailure, format!("serial link failed: {err}"));
                    return Err(err);
                }
            }
        }

        self.events
            .emit(StatusKind::LinkClosed, format!("serial link {name} closed"));
        Ok(self.stats)
    }

    pub fn stats(&self) -> ReceiverStats {
        self.stats
    }

    pub fn reader(&self) -> &FrameReader<L> {
        &self.reader
    }
}
