use std::fmt;
use std::str::FromStr;

use crate::error::{FrameError, Result};

/// Size of the identifier block that trails every payload.
pub const IDENTIFIER_LEN: usize = 13;

/// Text substituted for an identifier block that could not be decoded.
pub const IDENTIFIER_PLACEHOLDER: &str = "<unreadable>";

/// A fixed 13-byte frame identifier (an EAN-13 style barcode value).
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Identifier([u8; IDENTIFIER_LEN]);

impl Identifier {
    /// Accept a candidate code only if it is exactly [`IDENTIFIER_LEN`] bytes.
    pub fn parse(code: &str) -> Result<Self> {
        let raw: [u8; IDENTIFIER_LEN] = code
            .as_bytes()
            .try_into()
            .map_err(|_| FrameError::InvalidIdentifierLength { len: code.len() })?;
        Ok(Self(raw))
    }

    /// Wrap a raw identifier block as received from the wire.
    pub fn from_bytes(raw: [u8; IDENTIFIER_LEN]) -> Self {
        Self(raw)
    }

    pub fn as_bytes(&self) -> &[u8; IDENTIFIER_LEN] {
        &self.0
    }

    /// Decode the block as ASCII text.
    pub fn to_text(&self) -> Result<&str> {
        if let Some(offset) = self.0.iter().position(|b| !b.is_ascii()) {
            return Err(FrameError::IdentifierNotAscii {
                byte: self.0[offset],
                offset,
            });
        }
        // ASCII is always valid UTF-8.
        std::str::from_utf8(&self.0).map_err(|err| FrameError::IdentifierNotAscii {
            byte: self.0[err.valid_up_to()],
            offset: err.valid_up_to(),
        })
    }
}

impl FromStr for Identifier {
    type Err = FrameError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_text() {
            Ok(text) => f.write_str(text),
            Err(_) => f.write_str(&String::from_utf8_lossy(&self.0)),
        }
    }
}

impl fmt::Debug for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identifier({self})")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_thirteen_digits() {
        let id = Identifier::parse("1234567890123").unwrap();
        assert_eq!(id.as_bytes(), b"1234567890123");
        assert_eq!(id.to_text().unwrap(), "1234567890123");
        assert_eq!(id.to_string(), "1234567890123");
    }

    #[test]
    fn parse_rejects_other_lengths() {
        for code in ["", "123456789012", "12345678901234", "EAN8CODE"] {
            let err = Identifier::parse(code).unwrap_err();
            assert!(
                matches!(err, FrameError::InvalidIdentifierLength { len } if len == code.len()),
                "{code:?} should be rejected"
            );
        }
    }

    #[test]
    fn from_str_matches_parse() {
        let id: Identifier = "9787115428028".parse().unwrap();
        assert_eq!(id, Identifier::parse("9787115428028").unwrap());
    }

    #[test]
    fn non_ascii_block_fails_to_decode() {
        let mut raw = *b"1234567890123";
        raw[5] = 0xC3;
        let id = Identifier::from_bytes(raw);

        let err = id.to_text().unwrap_err();
        assert!(matches!(
            err,
            FrameError::IdentifierNotAscii {
                byte: 0xC3,
                offset: 5
            }
        ));
        // Display stays lossy rather than failing.
        assert!(id.to_string().starts_with("12345"));
    }
}
