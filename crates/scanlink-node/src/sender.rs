use std::sync::{Mutex, MutexGuard};

use scanlink_frame::{FrameConfig, FrameError, FrameWriter, Identifier, IDENTIFIER_LEN};
use scanlink_transport::SerialLink;
use tracing::{debug, info};

use crate::dedup::DedupSet;
use crate::error::Result;
use crate::imaging::{Imaging, Indicator};

/// Sender behavior configuration.
#[derive(Debug, Clone, Default)]
pub struct SenderConfig {
    /// Forget the oldest sent identifier beyond this many. `None` never forgets.
    pub dedup_capacity: Option<usize>,
    /// Framing limits applied before writing.
    pub frame: FrameConfig,
}

/// What happened to one capture offered to the sender.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// A frame was written.
    Sent { identifier: Identifier, bytes: usize },
    /// No barcode in the capture.
    NoTrigger,
    /// The barcode was not 13 bytes long.
    RejectedLength { code: String },
    /// The barcode was already sent.
    Duplicate { identifier: Identifier },
}

struct SendState<L, N> {
    writer: FrameWriter<L>,
    dedup: DedupSet,
    indicator: N,
}

/// Camera-side trigger filter and framer.
///
/// `offer` holds one lock from the dedup check until the frame is flushed,
/// so concurrent triggers go out strictly one frame after another.
pub struct Sender<L, I, N> {
    imaging: I,
    state: Mutex<SendState<L, N>>,
}

impl<L, I, N> Sender<L, I, N>
where
    L: SerialLink,
    I: Imaging,
    N: Indicator,
{
    pub fn new(link: L, imaging: I, indicator: N) -> Self {
        Self::with_config(link, imaging, indicator, SenderConfig::default())
    }

    pub fn with_config(link: L, imaging: I, indicator: N, config: SenderConfig) -> Self {
        let dedup = match config.dedup_capacity {
            Some(capacity) => DedupSet::bounded(capacity),
            None => DedupSet::new(),
        };
        Self {
            imaging,
            state: Mutex::new(SendState {
                writer: FrameWriter::with_config(link, config.frame),
                dedup,
                indicator,
            }),
        }
    }

    /// Run one capture through detection, qualification and transmission.
    ///
    /// Only link and imaging failures are errors; rejected captures are
    /// reported through [`Outcome`].
    pub fn offer(&self, capture: &I::Capture) -> Result<Outcome> {
        let Some(trigger) = self.imaging.detect_trigger(capture) else {
            return Ok(Outcome::NoTrigger);
        };

        let identifier = match Identifier::parse(&trigger.code) {
            Ok(identifier) => identifier,
            Err(_) => {
                debug!(code = %trigger.code, expected = IDENTIFIER_LEN, "barcode length rejected");
                return Ok(Outcome::RejectedLength { code: trigger.code });
            }
        };

        let mut state = self.lock();
        if state.dedup.contains(&identifier) {
            debug!(%identifier, "barcode already sent");
            return Ok(Outcome::Duplicate { identifier });
        }

        info!(%identifier, "barcode recognized");
        let payload = self.imaging.extract_payload(capture, trigger.region)?;

        let max = state.writer.config().max_payload_size;
        if payload.len() > max {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max,
            }
            .into());
        }

        state.dedup.insert(identifier);
        let bytes = state.writer.send(&payload, &identifier)?;
        state.indicator.acknowledge(&identifier);

        Ok(Outcome::Sent { identifier, bytes })
    }

    /// Whether `code` has already been transmitted.
    pub fn was_sent(&self, code: &str) -> bool {
        Identifier::parse(code)
            .map(|identifier| self.lock().dedup.contains(&identifier))
            .unwrap_or(false)
    }

    /// Number of distinct identifiers sent (and still remembered).
    pub fn sent_count(&self) -> usize {
        self.lock().dedup.len()
    }

    pub fn imaging(&self) -> &I {
        &self.imaging
    }

    /// Consume the sender and return the link.
    pub fn into_link(self) -> L {
        let state = self
            .state
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.writer.into_inner()
    }

    fn lock(&self) -> MutexGuard<'_, SendState<L, N>> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
