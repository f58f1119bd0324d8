//! Configuration management for the pizarra server

use std::env;

use serde::Deserialize;

use crate::keys::DEFAULT_KEY_WIDTH;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub store: StoreConfig,
    pub transfer: TransferConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Default TTL for message entries, in seconds.
    pub message_ttl: u64,
    /// Default TTL for file and fragment list entries, in seconds.
    pub file_ttl: u64,
    /// Derived key width in bytes; keys render as twice as many hex chars.
    pub key_width: usize,
    /// How often the background sweeper purges expired records, in seconds.
    pub sweep_interval: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransferConfig {
    /// Upload window size in bytes; files larger than this are chunked.
    pub chunk_size: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
            },
            store: StoreConfig {
                message_ttl: 60,
                file_ttl: 3600,
                key_width: DEFAULT_KEY_WIDTH,
                sweep_interval: 30,
            },
            transfer: TransferConfig {
                chunk_size: 1_000_000,
            },
        }
    }
}

impl Config {
    /// Build from `PIZARRA_*` environment variables. Every setting has a
    /// default, so missing or unparseable values fall back silently.
    pub fn from_env() -> Self {
        let defaults = Config::default();
        Config {
            server: ServerConfig {
                host: env::var("PIZARRA_HOST").unwrap_or(defaults.server.host),
                port: env::var("PIZARRA_PORT")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.server.port),
            },
            store: StoreConfig {
                message_ttl: env::var("PIZARRA_MESSAGE_TTL")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.store.message_ttl),
                file_ttl: env::var("PIZARRA_FILE_TTL")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.store.file_ttl),
                key_width: env::var("PIZARRA_KEY_WIDTH")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.store.key_width),
                sweep_interval: env::var("PIZARRA_SWEEP_INTERVAL")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.store.sweep_interval),
            },
            transfer: TransferConfig {
                chunk_size: env::var("PIZARRA_CHUNK_SIZE")
                    .ok()
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(defaults.transfer.chunk_size),
            },
        }
    }

    /// TTL applied when a request does not name one, by entry category.
    pub fn default_ttl(&self, category: crate::store::Category) -> u64 {
        match category {
            crate::store::Category::Message => self.store.message_ttl,
            _ => self.store.file_ttl,
        }
    }
}
