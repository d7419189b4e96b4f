use std::time::Duration;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::error::{FrameError, Result};
use crate::identifier::{Identifier, IDENTIFIER_LEN};

/// Length prefix: 4-byte little-endian payload size.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Default maximum payload size: 16 MiB.
pub const DEFAULT_MAX_PAYLOAD: usize = 16 * 1024 * 1024;

/// Wall-clock budget for one frame's payload phase.
pub const DEFAULT_PAYLOAD_TIMEOUT: Duration = Duration::from_secs(5);

/// Budget for the 13 identifier bytes once the payload is complete.
pub const DEFAULT_IDENTIFIER_TIMEOUT: Duration = Duration::from_secs(1);

/// Largest single read issued while accumulating a payload.
pub const DEFAULT_CHUNK_CAP: usize = 2048;

/// Backoff after a poll that made no progress.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

/// One captured image and the barcode that triggered it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Compressed image bytes, opaque to the framer.
    pub payload: Bytes,
    /// The barcode value.
    pub identifier: Identifier,
}

impl Frame {
    /// Create a new frame.
    pub fn new(payload: impl Into<Bytes>, identifier: Identifier) -> Self {
        Self {
            payload: payload.into(),
            identifier,
        }
    }

    /// The total wire size of this frame (prefix + payload + identifier).
    pub fn wire_size(&self) -> usize {
        LENGTH_PREFIX_SIZE + self.payload.len() + IDENTIFIER_LEN
    }
}

/// Encode a frame into the wire format.
///
/// Wire format:
/// ```text
/// ┌──────────────┬──────────────────┬─────────────────┐
/// │ Length       │ Payload          │ Identifier      │
/// │ (4B LE)      │ (Length bytes)   │ (13B ASCII)     │
/// └──────────────┴──────────────────┴─────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], identifier: &Identifier, dst: &mut BytesMut) -> Result<()> {
    if payload.len() > u32::MAX as usize {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: u32::MAX as usize,
        });
    }
    dst.reserve(LENGTH_PREFIX_SIZE + payload.len() + IDENTIFIER_LEN);
    dst.put_u32_le(payload.len() as u32);
    dst.put_slice(payload);
    dst.put_slice(identifier.as_bytes());
    Ok(())
}

/// Decode a frame from a buffer that holds the stream from a frame boundary.
///
/// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
/// On success, consumes the frame bytes from the buffer.
pub fn decode_frame(src: &mut BytesMut, max_payload: usize) -> Result<Option<Frame>> {
    if src.len() < LENGTH_PREFIX_SIZE {
        return Ok(None);
    }

    let mut prefix = [0u8; LENGTH_PREFIX_SIZE];
    prefix.copy_from_slice(&src[..LENGTH_PREFIX_SIZE]);
    let payload_len = u32::from_le_bytes(prefix) as usize;

    if payload_len > max_payload {
        return Err(FrameError::PayloadTooLarge {
            size: payload_len,
            max: max_payload,
        });
    }

    let total = LENGTH_PREFIX_SIZE + payload_len + IDENTIFIER_LEN;
    if src.len() < total {
        return Ok(None);
    }

    src.advance(LENGTH_PREFIX_SIZE);
    let payload = src.split_to(payload_len).freeze();
    let mut raw = [0u8; IDENTIFIER_LEN];
    src.copy_to_slice(&mut raw);

    Ok(Some(Frame {
        payload,
        identifier: Identifier::from_bytes(raw),
    }))
}

/// Configuration for framing and reassembly.
#[derive(Debug, Clone)]
pub struct FrameConfig {
    /// Maximum payload size in bytes. Default: 16 MiB.
    pub max_payload_size: usize,
    /// Deadline for the payload phase, measured from the length prefix. Default: 5 s.
    pub payload_timeout: Duration,
    /// Deadline for the identifier block after the payload completes. Default: 1 s.
    pub identifier_timeout: Duration,
    /// Upper bound for a single payload read. Default: 2048.
    pub chunk_cap: usize,
    /// Sleep between polls that returned nothing. Default: 10 ms.
    pub poll_interval: Duration,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            max_payload_size: DEFAULT_MAX_PAYLOAD,
            payload_timeout: DEFAULT_PAYLOAD_TIMEOUT,
            identifier_timeout: DEFAULT_IDENTIFIER_TIMEOUT,
            chunk_cap: DEFAULT_CHUNK_CAP,
            poll_interval: DEFAULT_POLL_INTERVAL,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(code: &str) -> Identifier {
        Identifier::parse(code).unwrap()
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let mut buf = BytesMut::new();
        let payload = b"\xff\xd8jpeg-bytes\xff\xd9";

        encode_frame(payload, &id("1234567890123"), &mut buf).unwrap();

        assert_eq!(buf.len(), LENGTH_PREFIX_SIZE + payload.len() + IDENTIFIER_LEN);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();

        assert_eq!(frame.payload.as_ref(), payload);
        assert_eq!(frame.identifier, id("1234567890123"));
        assert!(buf.is_empty());
    }

    #[test]
    fn test_reference_frame_layout() {
        let payload = vec![0u8; 1000];
        let mut buf = BytesMut::new();
        encode_frame(&payload, &id("1234567890123"), &mut buf).unwrap();

        assert_eq!(&buf[..4], &[0xE8, 0x03, 0x00, 0x00]);
        assert!(buf[4..1004].iter().all(|b| *b == 0));
        assert_eq!(&buf[1004..], b"1234567890123");
    }

    #[test]
    fn test_decode_incomplete_prefix() {
        let mut buf = BytesMut::from(&[0x05, 0x00][..]);
        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
        assert_eq!(buf.len(), 2);
    }

    #[test]
    fn test_decode_missing_identifier() {
        let mut buf = BytesMut::new();
        encode_frame(b"hello", &id("1234567890123"), &mut buf).unwrap();
        buf.truncate(LENGTH_PREFIX_SIZE + 5 + 12);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD).unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn test_decode_payload_too_large() {
        let mut buf = BytesMut::new();
        buf.put_u32_le(1024 * 1024 * 32);

        let result = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD);
        assert!(matches!(result, Err(FrameError::PayloadTooLarge { .. })));
    }

    #[test]
    fn test_multiple_frames() {
        let mut buf = BytesMut::new();
        encode_frame(b"first", &id("1111111111111"), &mut buf).unwrap();
        encode_frame(b"second", &id("2222222222222"), &mut buf).unwrap();

        let f1 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f1.payload.as_ref(), b"first");
        assert_eq!(f1.identifier, id("1111111111111"));

        let f2 = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert_eq!(f2.payload.as_ref(), b"second");
        assert_eq!(f2.identifier, id("2222222222222"));

        assert!(buf.is_empty());
    }

    #[test]
    fn test_empty_payload() {
        let mut buf = BytesMut::new();
        encode_frame(b"", &id("0000000000000"), &mut buf).unwrap();
        assert_eq!(buf.len(), LENGTH_PREFIX_SIZE + IDENTIFIER_LEN);

        let frame = decode_frame(&mut buf, DEFAULT_MAX_PAYLOAD)
            .unwrap()
            .unwrap();
        assert!(frame.payload.is_empty());
    }

    #[test]
    fn test_frame_wire_size() {
        let frame = Frame::new(Bytes::from_static(b"test"), id("1234567890123"));
        assert_eq!(frame.wire_size(), 4 + 4 + 13);
    }

    #[test]
    fn test_default_config() {
        let cfg = FrameConfig::default();
        assert_eq!(cfg.payload_timeout, Duration::from_secs(5));
        assert_eq!(cfg.chunk_cap, 2048);
        assert_eq!(cfg.max_payload_size, DEFAULT_MAX_PAYLOAD);
    }
}
