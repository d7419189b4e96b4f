//! Byte-serial link abstraction.
//!
//! Provides a unified interface over the byte pipes a scanlink node talks through:
//! - UART / USB-serial ports (via `serialport`)
//! - In-memory loopback pairs (tests and host-side simulation)
//!
//! This is the lowest layer of scanlink. Everything else builds on top of
//! the [`SerialLink`] trait provided here.

pub mod error;
pub mod link;
pub mod memory;
pub mod serial;

pub use error::{Result, TransportError};
pub use link::SerialLink;
pub use memory::MemoryLink;
pub use serial::{LinkConfig, SerialPortLink, DEFAULT_BAUD_RATE};
