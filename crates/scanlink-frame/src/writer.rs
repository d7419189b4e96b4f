use bytes::BytesMut;
use scanlink_transport::SerialLink;
use tracing::debug;

use crate::codec::{encode_frame, Frame, FrameConfig};
use crate::error::{FrameError, Result};
use crate::identifier::Identifier;

const INITIAL_BUFFER_CAPACITY: usize = 64 * 1024;

/// Writes complete frames to a serial link.
///
/// Each frame is encoded into one buffer and handed to the link in a single
/// `write_all`, so prefix, payload and identifier are never interleaved with
/// another write through the same writer.
pub struct FrameWriter<L> {
    inner: L,
    buf: BytesMut,
    config: FrameConfig,
}

impl<L: SerialLink> FrameWriter<L> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: L) -> Self {
        Self::with_config(inner, FrameConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: L, config: FrameConfig) -> Self {
        Self {
            inner,
            buf: BytesMut::with_capacity(INITIAL_BUFFER_CAPACITY),
            config,
        }
    }

    /// Write a complete frame (blocking).
    pub fn write_frame(&mut self, frame: &Frame) -> Result<usize> {
        self.send(frame.payload.as_ref(), &frame.identifier)
    }

    /// Encode and send a payload with its identifier.
    ///
    /// Returns the number of bytes put on the wire.
    pub fn send(&mut self, payload: &[u8], identifier: &Identifier) -> Result<usize> {
        if payload.len() > self.config.max_payload_size {
            return Err(FrameError::PayloadTooLarge {
                size: payload.len(),
                max: self.config.max_payload_size,
            });
        }

        self.buf.clear();
        encode_frame(payload, identifier, &mut self.buf)?;

        self.inner.write_all(&self.buf)?;
        self.inner.flush()?;

        debug!(
            link = self.inner.name(),
            %identifier,
            payload = payload.len(),
            wire = self.buf.len(),
            "frame written"
        );
        Ok(self.buf.len())
    }

    /// Borrow the underlying link.
    pub fn get_ref(&self) -> &L {
        &self.inner
    }

    /// Mutably borrow the underlying link.
    pub fn get_mut(&mut self) -> &mut L {
        &mut self.inner
    }

    /// Consume the writer and return the inner link.
    pub fn into_inner(self) -> L {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &FrameConfig {
        &self.config
    }
}
