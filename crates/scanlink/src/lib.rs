//! Framed image and identifier transfer over a byte-serial link.
//!
//! A barcode camera sends `[u32 LE length][image][13-byte identifier]` frames;
//! the host reassembles them under timeouts, decodes each image and keeps a
//! record store.
//!
//! # Crate Structure
//!
//! - [`transport`]: serial link abstraction (hardware ports, in-memory pairs)
//! - [`frame`]: wire format and the receive state machine
//! - [`node`]: camera-side sender, host-side receiver and dispatch (behind `node` feature)

/// Re-export transport types.
pub mod transport {
    pub use scanlink_transport::*;
}

/// Re-export frame types.
pub mod frame {
    pub use scanlink_frame::*;
}

/// Re-export sender and receiver types (requires `node` feature).
#[cfg(feature = "node")]
pub mod node {
    pub use scanlink_node::*;
}
