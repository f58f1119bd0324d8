//! Client-side transfer machinery
//!
//! The server only ever stores flat entries; everything that makes a large
//! file round-trip work lives here. [`send_file`] slices a file into
//! bounded-memory chunks and publishes a fragment list pointing at them,
//! [`receive`] dispatches a fetched entry on its category and reassembles
//! fragment lists back into a file.

pub mod api;
pub mod dispatch;
pub mod receive;
pub mod send;

use std::path::PathBuf;

use thiserror::Error;

pub use api::{ApiClient, FetchedMessage, ServerStatus, StoredEntry};
pub use dispatch::{resolve, Resolved};
pub use receive::{receive, ReceiveOptions, Received};
pub use send::{send_file, send_text, FileReceipt, SendOptions, DEFAULT_CHUNK_SIZE};

use crate::fragment::FragmentError;

/// One chunk that could not be fetched during reassembly.
#[derive(Debug)]
pub struct ChunkFailure {
    pub index: usize,
    pub key: String,
    pub cause: Box<ClientError>,
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid server url: {0}")]
    InvalidUrl(String),
    #[error("no entry for key {key}")]
    NotFound { key: String },
    #[error("refused: {detail}")]
    Forbidden { detail: String },
    #[error("transport error: {source}")]
    Transport {
        #[source]
        source: reqwest::Error,
    },
    #[error("server returned {status}: {detail}")]
    Server {
        status: reqwest::StatusCode,
        detail: String,
    },
    #[error("invalid input: {0}")]
    Validation(String),
    #[error("fragment list is malformed: {0}")]
    Fragment(#[from] FragmentError),
    #[error("destination {path} already exists, pass --force to overwrite")]
    DestinationExists { path: PathBuf },
    #[error("{path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("upload aborted at chunk {index}: {source}")]
    ChunkTransfer {
        index: usize,
        #[source]
        source: Box<ClientError>,
    },
    #[error("reassembly failed for {} of {total} chunks", failures.len())]
    Reassembly {
        total: usize,
        failures: Vec<ChunkFailure>,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;
