use serde::{Deserialize, Serialize};

use crate::fields::{extract_fields, Fields};

/// One decoded label, as stored and displayed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub name: String,
    pub phone: String,
    #[serde(default)]
    pub raw_text: String,
    pub identifier: String,
}

impl ResultRecord {
    /// Build a record from recognized text.
    pub fn from_text(text: String, identifier: impl Into<String>) -> Self {
        let Fields { name, phone } = extract_fields(&text);
        Self {
            name,
            phone,
            raw_text: text,
            identifier: identifier.into(),
        }
    }

    /// Stand-in record for an image the decoder could not handle.
    pub fn decode_failed(reason: &str, identifier: impl Into<String>) -> Self {
        Self {
            name: format!("decode error: {reason}"),
            phone: "decode error".to_string(),
            raw_text: String::new(),
            identifier: identifier.into(),
        }
    }

    /// Whether two records describe the same delivery.
    pub fn same_delivery(&self, other: &Self) -> bool {
        self.name == other.name && self.phone == other.phone && self.identifier == other.identifier
    }

    /// Case-insensitive substring match on name, phone or identifier.
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        [&self.name, &self.phone, &self.identifier]
            .iter()
            .any(|field| field.to_lowercase().contains(&query))
    }
}
