//! Camera-side sender and host-side receiver for scanlink frames.
//!
//! This is the "just works" layer. The [`Sender`] decides which barcode
//! captures go on the wire and writes them one at a time. The [`Receiver`]
//! drains the link into frames and hands them to a [`Dispatcher`], which runs
//! the slow decode step on its own thread and stores the results.

pub mod decode;
pub mod dedup;
pub mod dispatch;
pub mod error;
pub mod event;
pub mod fields;
pub mod imaging;
pub mod receiver;
pub mod record;
pub mod sender;
pub mod store;

pub use decode::{CommandDecoder, Decoded, Decoder, NullDecoder};
pub use dedup::DedupSet;
pub use dispatch::{DispatchStats, Dispatcher};
pub use error::{NodeError, Result};
pub use event::{StatusEvent, StatusKind, StatusSink};
pub use fields::{extract_fields, Fields, NAME_NOT_FOUND, PHONE_NOT_FOUND};
pub use imaging::{
    DirectoryImaging, FileCapture, Imaging, Indicator, LogIndicator, Region, Trigger,
};
pub use receiver::{Receiver, ReceiverConfig, ReceiverStats, DEFAULT_QUEUE_CAPACITY};
pub use record::ResultRecord;
pub use sender::{Outcome, Sender, SenderConfig};
pub use store::{Insert, RecordStore};
