//! Foundation types for sit.
//!
//! Every other sit crate depends on `sit-types`. It only defines identifiers;
//! computing them is the job of `sit-crypto`.
//!
//! # Key Types
//!
//! - [`ObjectId`]: content-addressed identifier of a blob or tree (SHA-1)
//! - [`CommitId`]: allocated identifier of a commit record
//!
//! Both render as 40 lowercase hex characters, and both reserve the all-zero
//! value as a sentinel ([`ObjectId::EMPTY`], [`CommitId::EMPTY`]).

pub mod commit;
pub mod error;
pub mod object;

pub use commit::CommitId;
pub use error::IdError;
pub use object::{ObjectId, ID_HEX_LEN, ID_LEN};
