//! Content-addressed object storage for sit.
//!
//! Objects are immutable and named by the SHA-1 of their bytes. Each one is
//! zstd-compressed into its own file at `objects/<id[0:2]>/<id[2:]>`.
//!
//! Two kinds of object are stored: blobs hold raw file contents, and a
//! [`Tree`] holds one `<mode> <kind> <id> <name>` line per directory entry.
//! The kind is never written to disk; readers know what they asked for.
//!
//! [`FsObjectStore`] is the on-disk backend; [`InMemoryObjectStore`] backs
//! unit tests. Writing an object that already exists is a no-op, and size
//! policy is left to callers.

pub mod error;
pub mod fs;
pub mod memory;
pub mod object;
pub mod traits;

pub use error::{StoreError, StoreResult};
pub use fs::FsObjectStore;
pub use memory::InMemoryObjectStore;
pub use object::{EntryMode, ObjectKind, StoredObject, Tree, TreeEntry};
pub use traits::ObjectStore;
