//! Fragment list control records
//!
//! A file too large for one entry is stored as N chunk entries plus one
//! fragment list: `urlencode(name):key1:key2:...:keyN`. The name is
//! percent-encoded so the `:` delimiter never collides with it, and the
//! keys are lowercase hex, which never contains `:` either.

use thiserror::Error;

use crate::keys::Key;

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("fragment list is empty")]
    Empty,
    #[error("fragment list name is not valid percent-encoded utf-8")]
    BadName(#[source] std::string::FromUtf8Error),
    #[error("fragment list key #{index} ({token:?}) is not a valid key")]
    BadKey { index: usize, token: String },
}

/// Ordered chunk keys plus the original file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FragmentList {
    name: String,
    keys: Vec<Key>,
}

impl FragmentList {
    pub fn new(name: impl Into<String>, keys: Vec<Key>) -> Self {
        Self {
            name: name.into(),
            keys,
        }
    }

    /// Original file name, decoded.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Chunk keys in upload order.
    pub fn keys(&self) -> &[Key] {
        &self.keys
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    /// Render the wire form stored as the fragment list entry's payload.
    pub fn serialize(&self) -> String {
        let mut parts = Vec::with_capacity(self.keys.len() + 1);
        parts.push(urlencoding::encode(&self.name).into_owned());
        parts.extend(self.keys.iter().map(|key| key.as_str().to_string()));
        parts.join(":")
    }

    /// Parse a wire form back into name and keys.
    ///
    /// A zero-chunk list (just an encoded name) is valid and denotes an
    /// empty file. Any malformed key token fails the whole parse.
    pub fn parse(record: &str) -> Result<Self, FragmentError> {
        let mut tokens = record.split(':');
        let encoded_name = match tokens.next() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(FragmentError::Empty),
        };
        let name = urlencoding::decode(encoded_name)
            .map_err(FragmentError::BadName)?
            .into_owned();

        let mut keys = Vec::new();
        for (index, token) in tokens.enumerate() {
            let key = Key::parse(token).map_err(|_| FragmentError::BadKey {
                index,
                token: token.to_string(),
            })?;
            keys.push(key);
        }

        Ok(Self { name, keys })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(hex: &str) -> Key {
        Key::parse(hex).unwrap()
    }

    #[test]
    fn serializes_name_and_keys_colon_separated() {
        let list = FragmentList::new("notes.txt", vec![key("0a1b2c3d"), key("deadbeef")]);
        assert_eq!(list.serialize(), "notes.txt:0a1b2c3d:deadbeef");
    }

    #[test]
    fn percent_encodes_hostile_names() {
        let list = FragmentList::new("my notes:final.txt", vec![key("deadbeef")]);
        let wire = list.serialize();
        assert_eq!(wire, "my%20notes%3Afinal.txt:deadbeef");

        let back = FragmentList::parse(&wire).unwrap();
        assert_eq!(back.name(), "my notes:final.txt");
        assert_eq!(back.keys(), &[key("deadbeef")]);
    }

    #[test]
    fn round_trips_zero_chunk_lists() {
        let list = FragmentList::new("empty.bin", vec![]);
        let wire = list.serialize();
        assert_eq!(wire, "empty.bin");

        let back = FragmentList::parse(&wire).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.name(), "empty.bin");
    }

    #[test]
    fn rejects_malformed_key_tokens() {
        let err = FragmentList::parse("notes.txt:deadbeef:NOTHEX").unwrap_err();
        assert!(matches!(err, FragmentError::BadKey { index: 1, .. }));

        let err = FragmentList::parse("notes.txt:").unwrap_err();
        assert!(matches!(err, FragmentError::BadKey { index: 0, .. }));
    }

    #[test]
    fn rejects_empty_records() {
        assert!(matches!(
            FragmentList::parse(""),
            Err(FragmentError::Empty)
        ));
    }
}
