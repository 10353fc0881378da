//! Remote repository definitions and their persistent store.
//!
//! A [`Remote`] names a content source: a base URL plus the trust and
//! filtering options the remote-management commands accept. The
//! [`RemoteStore`] commits definitions to a `remotes.toml` under its root
//! directory with atomic replace semantics, and holds each remote's
//! imported OpenPGP keyring next to it.
//!
//! Keyring import records raw keyring bytes and reports how many primary
//! public keys they frame; actual signature verification is someone
//! else's job.

pub use self::error::{RemoteError, Result};
pub use self::remote::Remote;
pub use self::store::{ChangeMode, RemoteStore};

mod error;
mod keyring;
mod remote;
mod store;
