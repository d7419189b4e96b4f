use std::time::{Duration, Instant};

use bytes::{Bytes, BytesMut};
use scanlink_transport::SerialLink;
use tracing::{debug, trace, warn};

use crate::codec::{FrameConfig, LENGTH_PREFIX_SIZE};
use crate::error::Result;
use crate::identifier::{Identifier, IDENTIFIER_LEN, IDENTIFIER_PLACEHOLDER};

/// Which part of a frame a progress or timeout report refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Payload,
    Identifier,
}

/// Observable state of the reassembly state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReaderState {
    AwaitingLength,
    AwaitingPayload,
    AwaitingIdentifier,
}

/// The identifier block of a delivered frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReceivedIdentifier {
    /// All 13 bytes arrived and decoded as ASCII.
    Text(String),
    /// The block was truncated or not ASCII. The payload is still good.
    Unreadable { raw: Vec<u8>, reason: String },
}

impl ReceivedIdentifier {
    /// The identifier text, or [`IDENTIFIER_PLACEHOLDER`].
    pub fn as_str(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Unreadable { .. } => IDENTIFIER_PLACEHOLDER,
        }
    }

    pub fn is_readable(&self) -> bool {
        matches!(self, Self::Text(_))
    }
}

/// A reassembled frame, ready for downstream decoding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub payload: Bytes,
    pub identifier: ReceivedIdentifier,
}

/// Outcome of one [`FrameReader::poll`] step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadEvent {
    /// Nothing to do right now; back off before polling again.
    Idle,
    /// The link returned fewer prefix bytes than it reported available.
    ShortRead { got: usize, wanted: usize },
    /// A length prefix was read; the payload phase has started.
    FrameStarted { length: usize },
    /// Bytes were accumulated for the current phase.
    Progress {
        phase: Phase,
        received: usize,
        expected: usize,
    },
    /// The payload reached its declared length.
    PayloadComplete { length: usize },
    /// A length prefix exceeded the configured maximum and was dropped.
    OversizedLength { length: usize, max: usize },
    /// The frame deadline passed; partial bytes were discarded.
    ///
    /// Whatever of this frame is still in flight will be parsed as the next
    /// length prefix. Without a sync marker the stream may stay misaligned.
    TimedOut {
        phase: Phase,
        received: usize,
        expected: usize,
    },
    /// A frame was fully reassembled.
    Delivered(Delivery),
}

enum State {
    AwaitingLength {
        prefix: [u8; LENGTH_PREFIX_SIZE],
        filled: usize,
    },
    AwaitingPayload {
        expected: usize,
        buf: BytesMut,
        deadline: Instant,
    },
    AwaitingIdentifier {
        payload: Bytes,
        raw: [u8; IDENTIFIER_LEN],
        filled: usize,
        deadline: Instant,
    },
}

impl State {
    fn awaiting_length() -> Self {
        Self::AwaitingLength {
            prefix: [0u8; LENGTH_PREFIX_SIZE],
            filled: 0,
        }
    }
}

/// Reassembles frames from a serial link one non-blocking step at a time.
///
/// The link may hand out any number of bytes per read, including none.
/// The payload deadline is wall-clock from the length prefix, not idle time:
/// a frame that keeps trickling in is still abandoned once it runs out.
pub struct FrameReader<L> {
    inner: L,
    state: State,
    scratch: Vec<u8>,
    config: FrameConfig,
}

impl<L: SerialLink> FrameReader<L> {
    /// Create a new frame reader with default configuration.
    pub fn new(inner: L) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame reader with explicit configuration.
    pub fn with_config(inner: L, config: FrameConfig) -> Self {
        let chunk_cap = config.chunk_cap.max(1);
        Self {
            inner,
            state: State::awaiting_length(),
            scratch: vec![0u8; chunk_cap],
            config,
        }
    }

    /// Advance the state machine by at most one read.
    ///
    /// Only link failures are returned as errors. Every per-frame problem is
    /// reported as a [`ReadEvent`] and the reader keeps going.
    pub fn poll(&mut self) -> Result<ReadEvent> {
        match self.state {
            State::AwaitingLength { .. } => self.poll_length(),
            State::AwaitingPayload { .. } => self.poll_payload(),
            State::AwaitingIdentifier { .. } => self.poll_identifier(),
        }
    }

    /// Poll until a frame is delivered, sleeping `poll_interval` when idle.
    ///
    /// Timeouts and other per-frame events are skipped.
    pub fn next_delivery(&mut self) -> Result<Delivery> {
        loop {
            match self.poll()? {
                ReadEvent::Delivered(delivery) => return Ok(delivery),
                ReadEvent::Idle => std::thread::sleep(self.config.poll_interval),
                _ => {}
            }
        }
    }

    /// Current state machine position.
    pub fn state(&self) -> ReaderState {
        match self.state {
            State::AwaitingLength { .. } => ReaderState::AwaitingLength,
            State::AwaitingPayload { .. } => ReaderState::AwaitingPayload,
            State::AwaitingIdentifier { .. } => ReaderState::AwaitingIdentifier,
        }
    }

    /// Drop any partial frame and go back to scanning for a length prefix.
    pub fn reset(&mut self) {
        self.state = State::awaiting_length();
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the reader and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Current frame reader configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }

    fn poll_length(&mut self) -> Result<ReadEvent> {
        let State::AwaitingLength { prefix, filled } = &mut self.state else {
            return Ok(ReadEvent::Idle);
        };

        let wanted = LENGTH_PREFIX_SIZE - *filled;
        if self.inner.bytes_available()? < wanted {
            return Ok(ReadEvent::Idle);
        }

        let got = self.inner.read(&mut prefix[*filled..])?;
        *filled += got;
        if *filled < LENGTH_PREFIX_SIZE {
            trace!(got, wanted, "short read on length prefix");
            return Ok(ReadEvent::ShortRead { got, wanted });
        }

        let length = u32::from_le_bytes(*prefix) as usize;
        if length > self.config.max_payload_size {
            let max = self.config.max_payload_size;
            warn!(length, max, "length prefix exceeds maximum, dropping it");
            self.state = State::awaiting_length();
            return Ok(ReadEvent::OversizedLength { length, max });
        }

        debug!(length, "frame started");
        let now = Instant::now();
        self.state = if length == 0 {
            State::AwaitingIdentifier {
                payload: Bytes::new(),
                raw: [0u8; IDENTIFIER_LEN],
                filled: 0,
                deadline: now + self.config.identifier_timeout,
            }
        } else {
            State::AwaitingPayload {
                expected: length,
                buf: BytesMut::with_capacity(length.min(self.config.chunk_cap * 64)),
                deadline: now + self.config.payload_timeout,
            }
        };
        Ok(ReadEvent::FrameStarted { length })
    }

    fn poll_payload(&mut self) -> Result<ReadEvent> {
        let State::AwaitingPayload {
            expected,
            buf,
            deadline,
        } = &mut self.state
        else {
            return Ok(ReadEvent::Idle);
        };
        let expected = *expected;

        if Instant::now() > *deadline {
            let received = buf.len();
            warn!(
                received,
                expected,
                timeout = ?self.config.payload_timeout,
                "payload timed out, frame discarded; stream may be misaligned"
            );
            self.state = State::awaiting_length();
            return Ok(ReadEvent::TimedOut {
                phase: Phase::Payload,
                received,
                expected,
            });
        }

        let want = self.scratch.len().min(expected - buf.len());
        let n = self.inner.read(&mut self.scratch[..want])?;
        if n == 0 {
            return Ok(ReadEvent::Idle);
        }
        buf.extend_from_slice(&self.scratch[..n]);

        let received = buf.len();
        if received < expected {
            trace!(received, expected, "payload progress");
            return Ok(ReadEvent::Progress {
                phase: Phase::Payload,
                received,
                expected,
            });
        }

        let payload = std::mem::take(buf).freeze();
        debug!(length = expected, "payload complete");
        self.state = State::AwaitingIdentifier {
            payload,
            raw: [0u8; IDENTIFIER_LEN],
            filled: 0,
            deadline: Instant::now() + self.config.identifier_timeout,
        };
        Ok(ReadEvent::PayloadComplete { length: expected })
    }

    fn poll_identifier(&mut self) -> Result<ReadEvent> {
        let State::AwaitingIdentifier {
            payload,
            raw,
            filled,
            deadline,
        } = &mut self.state
        else {
            return Ok(ReadEvent::Idle);
        };

        if Instant::now() > *deadline {
            let received = *filled;
            warn!(
                received,
                expected = IDENTIFIER_LEN,
                "identifier block incomplete, delivering payload with placeholder"
            );
            let identifier = ReceivedIdentifier::Unreadable {
                raw: raw[..received].to_vec(),
                reason: format!("identifier truncated ({received} of {IDENTIFIER_LEN} bytes)"),
            };
            return Ok(self.deliver(identifier));
        }

        let n = self.inner.read(&mut raw[*filled..])?;
        if n == 0 {
            return Ok(ReadEvent::Idle);
        }
        *filled += n;
        if *filled < IDENTIFIER_LEN {
            return Ok(ReadEvent::Progress {
                phase: Phase::Identifier,
                received: *filled,
                expected: IDENTIFIER_LEN,
            });
        }

        let block = Identifier::from_bytes(*raw);
        let identifier = match block.to_text() {
            Ok(text) => ReceivedIdentifier::Text(text.to_string()),
            Err(err) => {
                warn!(error = %err, payload = payload.len(), "identifier decode failed");
                ReceivedIdentifier::Unreadable {
                    raw: raw.to_vec(),
                    reason: err.to_string(),
                }
            }
        };
        Ok(self.deliver(identifier))
    }

    fn deliver(&mut self, identifier: ReceivedIdentifier) -> ReadEvent {
        let previous = std::mem::replace(&mut self.state, State::awaiting_length());
        let payload = match previous {
            State::AwaitingIdentifier { payload, .. } => payload,
            _ => Bytes::new(),
        };
        debug!(
            payload = payload.len(),
            identifier = identifier.as_str(),
            "frame delivered"
        );
        ReadEvent::Delivered(Delivery {
            payload,
            identifier,
        })
    }
}

impl<L> FrameReader<L> {
    /// Time left before the current frame is abandoned, if one is in progress.
    pub fn time_remaining(&self) -> Option<Duration> {
        match &self.state {
            State::AwaitingLength { .. } => None,
            State::AwaitingPayload { deadline, .. }
            | State::AwaitingIdentifier { deadline, .. } => {
                Some(deadline.saturating_duration_since(Instant::now()))
            }
        }
    }
}
