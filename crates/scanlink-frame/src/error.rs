use scanlink_transport::TransportError;

/// Errors that can occur during frame encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: usize, max: usize },

    /// An identifier was not exactly 13 bytes long.
    #[error("identifier must be 13 bytes, got {len}")]
    InvalidIdentifierLength { len: usize },

    /// The identifier bytes are not printable ASCII.
    #[error("identifier is not ASCII (byte 0x{byte:02x} at offset {offset})")]
    IdentifierNotAscii { byte: u8, offset: usize },

    /// The link failed underneath the framer.
    #[error("link error: {0}")]
    Transport(#[from] TransportError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
