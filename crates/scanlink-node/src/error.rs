use std::path::PathBuf;

/// Errors that can occur in sender and receiver operations.
#[derive(Debug, thiserror::Error)]
pub enum NodeError {
    /// Link-level error.
    #[error("transport error: {0}")]
    Transport(#[from] scanlink_transport::TransportError),

    /// Frame-level error.
    #[error("frame error: {0}")]
    Frame(#[from] scanlink_frame::FrameError),

    /// The imaging source could not produce a payload.
    #[error("imaging failed: {0}")]
    Imaging(String),

    /// The decode collaborator failed on one image.
    #[error("decode failed: {0}")]
    Decode(String),

    /// Reading or writing the record store failed.
    #[error("record store {path}: {source}")]
    Store {
        path: PathBuf,
        source: std::io::Error,
    },

    /// JSON serialization/deserialization error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The other side of the dispatch queue is gone.
    #[error("dispatch queue closed")]
    QueueClosed,
}

pub type Result<T> = std::result::Result<T, NodeError>;
