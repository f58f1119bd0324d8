//! Sending messages and files
//!
//! Files up to one chunk travel as a single entry. Anything larger is
//! sliced into windows of `chunk_size` bytes, each stored as its own file
//! entry, and tied together by a fragment list entry whose key is what the
//! sender hands out. Only one window is held in memory at a time.

use std::collections::HashSet;
use std::path::Path;

use tokio::fs::File;
use tokio::io::AsyncReadExt;

use crate::fragment::FragmentList;
use crate::keys::Key;
use crate::store::Category;

use super::api::{ApiClient, StoredEntry};
use super::{ClientError, ClientResult};

/// Upload window size used when nothing else is configured.
pub const DEFAULT_CHUNK_SIZE: usize = 1_000_000;

#[derive(Debug, Clone)]
pub struct SendOptions {
    /// TTL in seconds for every entry of the transfer, chunks and fragment
    /// list alike. `None` leaves the server defaults in charge.
    pub ttl: Option<u64>,
    pub chunk_size: usize,
}

impl Default for SendOptions {
    fn default() -> Self {
        Self {
            ttl: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }
}

/// Receipt for an uploaded file.
#[derive(Debug, Clone)]
pub struct FileReceipt {
    /// The key to hand out: the file entry for small files, the fragment
    /// list entry for chunked ones.
    pub key: String,
    pub name: String,
    pub size: u64,
    pub chunks: usize,
    pub chunked: bool,
}

/// Store literal text under a derived key.
pub async fn send_text(
    api: &ApiClient,
    content: &str,
    ttl: Option<u64>,
) -> ClientResult<StoredEntry> {
    api.store_message(content, Category::Message, ttl).await
}

/// Upload a file, chunking it when it exceeds `options.chunk_size`.
///
/// The upload aborts on the first failed chunk; entries already stored are
/// left to expire on their own.
pub async fn send_file(
    api: &ApiClient,
    path: &Path,
    options: &SendOptions,
) -> ClientResult<FileReceipt> {
    if options.chunk_size == 0 {
        return Err(ClientError::Validation(
            "chunk size must be positive".to_string(),
        ));
    }
    let name = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| {
            ClientError::Validation(format!("{} has no usable file name", path.display()))
        })?
        .to_string();

    let mut file = File::open(path).await.map_err(|source| ClientError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let total = file
        .metadata()
        .await
        .map_err(|source| ClientError::Io {
            path: path.to_path_buf(),
            source,
        })?
        .len();

    if total <= options.chunk_size as u64 {
        let mut bytes = Vec::with_capacity(total as usize);
        file.read_to_end(&mut bytes)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let stored = api.store_file(&name, bytes, options.ttl).await?;
        tracing::info!(key = %stored.key, name = %name, size = total, "File stored whole");
        return Ok(FileReceipt {
            key: stored.key,
            name,
            size: total,
            chunks: 1,
            chunked: false,
        });
    }

    let mut keys: Vec<Key> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut buf = Vec::with_capacity(options.chunk_size);
    let mut sent: u64 = 0;

    loop {
        buf.clear();
        let read = (&mut file)
            .take(options.chunk_size as u64)
            .read_to_end(&mut buf)
            .await
            .map_err(|source| ClientError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        if read == 0 {
            break;
        }
        sent += read as u64;

        let index = keys.len();
        let stored = api
            .store_file(&name, buf.clone(), options.ttl)
            .await
            .map_err(|source| ClientError::ChunkTransfer {
                index,
                source: Box::new(source),
            })?;
        tracing::debug!(chunk = index, key = %stored.key, size = read, "Chunk stored");

        // Derived keys are short; a collision inside one transfer would
        // silently overwrite an earlier chunk.
        if !seen.insert(stored.key.clone()) {
            return Err(ClientError::Validation(format!(
                "chunk {} collided with an earlier chunk key {}",
                index, stored.key
            )));
        }
        let key = Key::parse(&stored.key).map_err(|_| {
            ClientError::Validation(format!("server returned malformed key {:?}", stored.key))
        })?;
        keys.push(key);
    }

    let chunks = keys.len();
    let list = FragmentList::new(name.clone(), keys);
    let stored = api
        .store_message(&list.serialize(), Category::FragmentList, options.ttl)
        .await?;
    tracing::info!(
        key = %stored.key,
        name = %name,
        chunks,
        size = sent,
        "File stored as fragment list"
    );

    Ok(FileReceipt {
        key: stored.key,
        name,
        size: sent,
        chunks,
        chunked: true,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api() -> ApiClient {
        ApiClient::new("http://localhost:9").unwrap()
    }

    #[tokio::test]
    async fn rejects_zero_chunk_size() {
        let options = SendOptions {
            chunk_size: 0,
            ..Default::default()
        };
        let err = send_file(&api(), Path::new("whatever.bin"), &options)
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Validation(_)));
    }

    #[tokio::test]
    async fn missing_source_file_is_an_io_error() {
        let err = send_file(
            &api(),
            Path::new("/definitely/not/here.bin"),
            &SendOptions::default(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, ClientError::Io { .. }));
    }
}
