//! Hashing primitives for sit.
//!
//! Object identifiers are plain SHA-1 digests of an object's canonical bytes.
//! All hashing wraps the `sha1` crate; nothing here is custom cryptography.

pub mod hasher;

pub use hasher::{ContentHasher, HasherError, HashingReader};
