//! Key derivation
//!
//! Every stored entry is addressed by a short hex key derived from a key
//! source: the message content (or file name) joined with a nanosecond
//! timestamp. The timestamp salt guarantees that depositing identical
//! content twice yields two independent entries; the store never
//! deduplicates. Derivation is a plain SHA-256 truncated to the configured
//! width, with no existence check against the store: a colliding key
//! overwrites the previous entry.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

use sha2::{Digest, Sha256};

/// Default digest width in bytes; keys are twice as many hex characters.
pub const DEFAULT_KEY_WIDTH: usize = 4;

/// Placeholder stored in metadata instead of message plaintext.
const REDACTED_CONTENT: &str = "****";

/// Opaque fixed-width hex identifier for one stored entry.
///
/// Possession of a key is the only access control; treat it as a
/// capability token.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Key(String);

impl Key {
    /// Parse an externally supplied key (CLI argument or fragment-list
    /// field). Keys are non-empty lowercase hex; anything else is rejected
    /// before it reaches the wire.
    pub fn parse(s: &str) -> Result<Self, InvalidKey> {
        if s.is_empty() || !s.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()) {
            return Err(InvalidKey(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Rejected key string.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid key {0:?}: expected lowercase hex")]
pub struct InvalidKey(pub String);

/// The pre-hash string a key is derived from.
///
/// Carries two renditions: `raw` feeds the hash, `redacted` is what the
/// metadata sidecar records for traceability. For messages the content
/// portion is starred out so plaintext is not stored a second time; file
/// names are kept as-is.
#[derive(Debug, Clone)]
pub struct KeySource {
    raw: String,
    redacted: String,
}

impl KeySource {
    /// Key source for a message deposit: `{content}:{nanos}`.
    pub fn for_message(content: &str) -> Self {
        let salt = timestamp_nanos();
        Self {
            raw: format!("{content}:{salt}"),
            redacted: format!("{REDACTED_CONTENT}:{salt}"),
        }
    }

    /// Key source for a file or chunk deposit: `{filename}:{nanos}`.
    pub fn for_file(filename: &str) -> Self {
        let raw = format!("{}:{}", filename, timestamp_nanos());
        Self {
            redacted: raw.clone(),
            raw,
        }
    }

    /// The rendition safe to persist in metadata.
    pub fn redacted(&self) -> &str {
        &self.redacted
    }

    #[cfg(test)]
    fn raw(&self) -> &str {
        &self.raw
    }
}

/// Derives fixed-width keys from key sources.
#[derive(Debug, Clone, Copy)]
pub struct KeyDeriver {
    width: usize,
}

impl KeyDeriver {
    /// Width is clamped to the SHA-256 output size.
    pub fn new(width: usize) -> Self {
        Self {
            width: width.clamp(1, Sha256::output_size()),
        }
    }

    /// Hash the raw key source and hex-encode the first `width` bytes.
    pub fn derive(&self, source: &KeySource) -> Key {
        let digest = Sha256::digest(source.raw.as_bytes());
        Key(hex::encode(&digest[..self.width]))
    }
}

impl Default for KeyDeriver {
    fn default() -> Self {
        Self::new(DEFAULT_KEY_WIDTH)
    }
}

fn timestamp_nanos() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos()
}
