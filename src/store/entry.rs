//! Entry types
//!
//! Every payload in the store carries a metadata sidecar describing what it
//! is. The category tag is the whole dispatch mechanism: it decides whether
//! a retrieved payload is literal content or a fragment list pointing at
//! more keys.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Discriminates how a payload is interpreted on retrieval.
///
/// The serialized names are wire-visible and must stay stable: clients
/// match on them to route fragment lists through reassembly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    /// Literal text deposited through the messages endpoint.
    #[serde(rename = "__message__")]
    Message,
    /// Literal bytes deposited through the files endpoint (whole file or
    /// one chunk of a larger one).
    #[serde(rename = "__file__")]
    File,
    /// Control record: an ordered list of chunk keys plus the original
    /// file name. Never nested; chunk keys always denote literal entries.
    #[serde(rename = "file-fragment-list")]
    FragmentList,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Message => "__message__",
            Category::File => "__file__",
            Category::FragmentList => "file-fragment-list",
        }
    }

    /// Parse a wire tag. Returns `None` for anything outside the closed set.
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "__message__" => Some(Category::Message),
            "__file__" => Some(Category::File),
            "file-fragment-list" => Some(Category::FragmentList),
            _ => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metadata sidecar record, stored as JSON under `{key}:meta` with the same
/// TTL as the payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntryMetadata {
    pub category: Category,
    /// Payload length in bytes.
    pub size: u64,
    /// Redacted key source the entry's key was derived from; message
    /// content is starred out, file names are kept.
    pub key_source: String,
    /// TTL in seconds as of the last put or touch.
    pub ttl: u64,
    pub stored_at: DateTime<Utc>,
}

/// A retrieved entry: the payload plus its sidecar, if one survived.
///
/// A missing sidecar is a torn state (crash or expiry race between the two
/// writes); the entry degrades to category-less literal content rather than
/// disappearing.
#[derive(Debug, Clone)]
pub struct Entry {
    pub payload: Vec<u8>,
    pub metadata: Option<EntryMetadata>,
}

impl Entry {
    pub fn category(&self) -> Option<Category> {
        self.metadata.as_ref().map(|m| m.category)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_wire_tags_round_trip() {
        for category in [Category::Message, Category::File, Category::FragmentList] {
            assert_eq!(Category::parse(category.as_str()), Some(category));
        }
        assert_eq!(Category::parse("__bogus__"), None);
    }

    #[test]
    fn metadata_serializes_with_wire_tags() {
        let meta = EntryMetadata {
            category: Category::FragmentList,
            size: 42,
            key_source: "notes.txt:123".to_string(),
            ttl: 60,
            stored_at: Utc::now(),
        };
        let json = serde_json::to_string(&meta).unwrap();
        assert!(json.contains("\"file-fragment-list\""));

        let back: EntryMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(back.category, Category::FragmentList);
        assert_eq!(back.size, 42);
    }
}
