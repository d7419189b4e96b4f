//! Length-prefixed image+identifier framing over byte-serial links.
//!
//! Every message on the wire is:
//! - A 4-byte little-endian payload length
//! - The payload (opaque compressed image bytes)
//! - A 13-byte identifier (the barcode that triggered the capture)
//!
//! There is no magic, no checksum and no message type. [`FrameReader`] turns
//! an arbitrarily fragmented byte stream back into frames under a deadline.

pub mod codec;
pub mod error;
pub mod identifier;
pub mod reader;
pub mod writer;

pub use codec::{
    decode_frame, encode_frame, Frame, FrameConfig, DEFAULT_CHUNK_CAP, DEFAULT_IDENTIFIER_TIMEOUT,
    DEFAULT_MAX_PAYLOAD, DEFAULT_PAYLOAD_TIMEOUT, DEFAULT_POLL_INTERVAL, LENGTH_PREFIX_SIZE,
};
pub use error::{FrameError, Result};
pub use identifier::{Identifier, IDENTIFIER_LEN, IDENTIFIER_PLACEHOLDER};
pub use reader::{Delivery, FrameReader, Phase, ReadEvent, ReaderState, ReceivedIdentifier};
pub use writer::FrameWriter;
