use std::sync::mpsc;
use std::thread::JoinHandle;

use scanlink_frame::Delivery;

use crate::decode::Decoder;
use crate::event::{StatusKind, StatusSink};
use crate::record::ResultRecord;
use crate::store::{Insert, RecordStore};

/// Counters kept by a [`Dispatcher`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub decoded: usize,
    pub failed: usize,
    pub stored: usize,
    pub duplicates: usize,
}

/// Turns reassembled frames into stored records.
///
/// Runs the decoder on its own thread so a slow OCR pass never stalls the
/// receive loop. A decoder failure produces a stand-in record, never a panic
/// or an early exit.
pub struct Dispatcher<D> {
    decoder: D,
    store: RecordStore,
    events: StatusSink,
    stats: DispatchStats,
}

impl<D: Decoder> Dispatcher<D> {
    pub fn new(decoder: D, store: RecordStore, events: StatusSink) -> Self {
        Self {
            decoder,
            store,
            events,
            stats: DispatchStats::default(),
        }
    }

    /// Decode one delivery into a record.
    pub fn process(&mut self, delivery: &Delivery) -> ResultRecord {
        let identifier = delivery.identifier.as_str();
        match self.decoder.decode(&delivery.payload) {
            Ok(decoded) => {
                self.stats.decoded += 1;
                self.events
                    .emit(StatusKind::DecodeComplete, format!("decoded image for {identifier}"));
                ResultRecord::from_text(decoded.text, identifier)
            }
            Err(err) => {
                self.stats.failed += 1;
                self.events.emit(
                    StatusKind::DecodeFailure,
                    format!("image for {identifier} could not be decoded: {err}"),
                );
                ResultRecord::decode_failed(&err.to_string(), identifier)
            }
        }
    }

    /// Decode, store and forward every delivery until the queue closes.
    ///
    /// Duplicate records are stored once and forwarded once.
    pub fn run(
        &mut self,
        queue: &mpsc::Receiver<Delivery>,
        out: Option<&mpsc::Sender<ResultRecord>>,
    ) -> DispatchStats {
        while let Ok(delivery) = queue.recv() {
            let record = self.process(&delivery);

            match self.store.insert(record.clone()) {
                Ok(Insert::Stored) => {
                    self.stats.stored += 1;
                    self.events.emit(
                        StatusKind::RecordStored,
                        format!(
                            "new record: {} - {} - {}",
                            record.name, record.phone, record.identifier
                        ),
                    );
                }
                Ok(Insert::Duplicate) => {
                    self.stats.duplicates += 1;
                    self.events
                        .emit(StatusKind::DuplicateRecord, "record already exists");
                    continue;
                }
                Err(err) => {
                    self.events
                        .emit(StatusKind::StoreFailure, format!("record not saved: {err}"));
                }
            }

            if let Some(out) = out {
                if out.send(record).is_err() {
                    tracing::debug!("record listener gone");
                }
            }
        }
        self.stats
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    pub fn into_store(self) -> RecordStore {
        self.store
    }
}

impl<D: Decoder + 'static> Dispatcher<D> {
    /// Run on a new thread. The thread ends when every queue sender is dropped.
    pub fn spawn(
        mut self,
        queue: mpsc::Receiver<Delivery>,
        out: Option<mpsc::Sender<ResultRecord>>,
    ) -> std::io::Result<JoinHandle<Self>> {
        std::thread::Builder::new()
            .name("scanlink-dispatch".to_string())
            .spawn(move || {
                self.run(&queue, out.as_ref());
                self
            })
    }
}
