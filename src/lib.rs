//! Pizarra Library
//!
//! An ephemeral clipboard: byte entries live under short content-derived
//! keys and expire on a TTL. The server side stores flat entries and knows
//! nothing about files; the client side chunks large files into many
//! entries tied together by a fragment list record.
//!
//! # Modules
//!
//! - `keys`: Content-derived key derivation
//! - `store`: TTL-keyed entry store with metadata sidecars
//! - `fragment`: Fragment list control records
//! - `routes`: HTTP API surface
//! - `client`: Typed API client, chunked upload and reassembly

pub mod client;
pub mod config;
pub mod error;
pub mod fragment;
pub mod keys;
pub mod routes;
pub mod state;
pub mod store;

pub use config::Config;
pub use state::AppState;
