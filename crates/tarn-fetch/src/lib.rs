//! Mirrored content fetching with a blocking bridge over an async engine.
//!
//! # Architecture
//!
//! This crate follows the three-layer pattern:
//! - [`data`] - Immutable request descriptors and location types
//! - [`engine`] - The async fetch seam, with trait abstraction for I/O
//! - [`bridge`] - Blocking operations driving one engine submission each
//!
//! # Key Features
//!
//! - **Sync-over-async**: each blocking call owns a private runtime, so it
//!   neither starves nor depends on ambient async work in the process
//! - **Bounded streaming**: the size ceiling is enforced while copying,
//!   never after buffering an oversized payload
//! - **Cooperative cancellation**: an explicit token checked before any
//!   I/O and raced against every chunk of the transfer
//! - **Mechanism-only**: mirror fallback policy lives behind the
//!   [`FetchEngine`] trait; callers decide tolerance for absent content

mod bridge;
mod data;
mod engine;
mod error;

pub use bridge::{FetchOpts, fetch_mirrored, fetch_uri};
pub use data::{FetchRequest, Location, ParseLocationError, Priority};
pub use engine::{ByteStream, FetchEngine, HttpClient, HttpEngine};
pub use error::{FetchError, Result};

#[cfg(feature = "reqwest")]
pub use engine::ReqwestClient;
