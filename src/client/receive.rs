//! Receiving and reassembly
//!
//! Receiving starts from one key and ends as either literal text or a file
//! on disk. Fragment lists are reassembled in key order into a temp file
//! beside the destination, which is renamed into place only when every
//! chunk arrived. A broken transfer leaves neither the destination nor the
//! temp file behind and reports every chunk that failed, not just the
//! first one.

use std::path::{Path, PathBuf};

use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;

use crate::fragment::FragmentList;
use crate::store::Category;

use super::api::ApiClient;
use super::dispatch::{resolve, Resolved};
use super::{ChunkFailure, ClientError, ClientResult};

#[derive(Debug, Clone, Default)]
pub struct ReceiveOptions {
    /// Destination path; defaults to the stored file name in the current
    /// directory.
    pub output: Option<PathBuf>,
    /// Overwrite an existing destination.
    pub force: bool,
}

/// What came back for a key.
#[derive(Debug)]
pub enum Received {
    Text {
        content: String,
        category: Option<Category>,
    },
    File {
        path: PathBuf,
        size: u64,
        chunks: usize,
    },
}

/// Fetch a key and materialize whatever it names.
pub async fn receive(
    api: &ApiClient,
    key: &str,
    options: &ReceiveOptions,
) -> ClientResult<Received> {
    match api.fetch_message(key).await {
        Ok(message) => match resolve(message)? {
            Resolved::Literal { content, category } => Ok(Received::Text { content, category }),
            Resolved::Fragments(list) => reassemble(api, &list, options).await,
        },
        // The messages endpoint refuses file entries; fetch those directly.
        Err(ClientError::Forbidden { .. }) => receive_single_file(api, key, options).await,
        Err(err) => Err(err),
    }
}

async fn receive_single_file(
    api: &ApiClient,
    key: &str,
    options: &ReceiveOptions,
) -> ClientResult<Received> {
    let (bytes, name) = api.fetch_file(key).await?;
    let dest = destination(options, name.as_deref().unwrap_or(key))?;
    ensure_overwritable(&dest, options.force).await?;

    let size = bytes.len() as u64;
    let temp = temp_path(&dest);
    write_file(&temp, &bytes).await?;
    persist(&temp, &dest).await?;

    tracing::info!(%key, path = %dest.display(), size, "File received");
    Ok(Received::File {
        path: dest,
        size,
        chunks: 1,
    })
}

/// Fetch every chunk of a fragment list in order and rebuild the file.
///
/// One failed chunk dooms the transfer, but the remaining chunks are still
/// probed so the error names everything that is missing.
async fn reassemble(
    api: &ApiClient,
    list: &FragmentList,
    options: &ReceiveOptions,
) -> ClientResult<Received> {
    let dest = destination(options, list.name())?;
    ensure_overwritable(&dest, options.force).await?;

    let temp = temp_path(&dest);
    let mut temp_file = File::create(&temp).await.map_err(|source| ClientError::Io {
        path: temp.clone(),
        source,
    })?;

    let mut failures: Vec<ChunkFailure> = Vec::new();
    let mut written: u64 = 0;

    for (index, chunk_key) in list.keys().iter().enumerate() {
        match api.fetch_file(chunk_key.as_str()).await {
            Ok((bytes, _)) => {
                if !failures.is_empty() {
                    continue;
                }
                if let Err(source) = temp_file.write_all(&bytes).await {
                    let _ = fs::remove_file(&temp).await;
                    return Err(ClientError::Io { path: temp, source });
                }
                written += bytes.len() as u64;
            }
            Err(cause) => {
                tracing::warn!(chunk = index, key = %chunk_key, error = %cause, "Chunk fetch failed");
                failures.push(ChunkFailure {
                    index,
                    key: chunk_key.to_string(),
                    cause: Box::new(cause),
                });
            }
        }
    }

    if !failures.is_empty() {
        drop(temp_file);
        let _ = fs::remove_file(&temp).await;
        return Err(ClientError::Reassembly {
            total: list.len(),
            failures,
        });
    }

    if let Err(source) = temp_file.flush().await {
        drop(temp_file);
        let _ = fs::remove_file(&temp).await;
        return Err(ClientError::Io { path: temp, source });
    }
    drop(temp_file);
    persist(&temp, &dest).await?;

    tracing::info!(
        name = list.name(),
        path = %dest.display(),
        chunks = list.len(),
        size = written,
        "File reassembled"
    );
    Ok(Received::File {
        path: dest,
        size: written,
        chunks: list.len(),
    })
}

/// Resolve the destination path. Stored names are untrusted, so only their
/// final path component is honored.
fn destination(options: &ReceiveOptions, name: &str) -> ClientResult<PathBuf> {
    if let Some(output) = &options.output {
        return Ok(output.clone());
    }
    let file_name = Path::new(name).file_name().ok_or_else(|| {
        ClientError::Validation(format!("{:?} has no usable file name", name))
    })?;
    Ok(PathBuf::from(file_name))
}

async fn ensure_overwritable(dest: &Path, force: bool) -> ClientResult<()> {
    if !force && fs::try_exists(dest).await.unwrap_or(false) {
        return Err(ClientError::DestinationExists {
            path: dest.to_path_buf(),
        });
    }
    Ok(())
}

fn temp_path(dest: &Path) -> PathBuf {
    let file_name = dest
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("download");
    let temp_name = format!(".{}.part", file_name);
    match dest.parent() {
        Some(parent) => parent.join(temp_name),
        None => PathBuf::from(temp_name),
    }
}

async fn write_file(path: &Path, bytes: &[u8]) -> ClientResult<()> {
    if let Err(source) = fs::write(path, bytes).await {
        // An interrupted write can still leave a partial file.
        let _ = fs::remove_file(path).await;
        return Err(ClientError::Io {
            path: path.to_path_buf(),
            source,
        });
    }
    Ok(())
}

async fn persist(temp: &Path, dest: &Path) -> ClientResult<()> {
    if let Err(source) = fs::rename(temp, dest).await {
        let _ = fs::remove_file(temp).await;
        return Err(ClientError::Io {
            path: dest.to_path_buf(),
            source,
        });
    }
    Ok(())
}
