//! Concurrency-safe named blob storage over a flat directory.
//!
//! Every object is one regular file directly under the store root, named
//! after the object. An in-memory [`NameIndex`] maps names to
//! [`ControlBlock`]s, each carrying a reader/writer lock for its object.
//!
//! # Operations
//!
//! - [`BlobStore::put`] -- stream an upload of a declared length, replacing
//!   any previous object atomically
//! - [`BlobStore::get`] / [`BlobStore::open_object`] -- stream an object out
//! - [`BlobStore::list`] -- names of all committed objects, sorted
//!
//! # Design Rules
//!
//! 1. Uploads to one name are serialized by its control block; uploads to
//!    different names never wait on each other.
//! 2. An overwrite streams into a staging file in the reserved
//!    `.blobd-staging-` namespace and becomes visible only through a single
//!    `rename` after its length is verified. A first write never opens an
//!    entry that already exists.
//! 3. Reads hold the shared side of the object lock, so they always see one
//!    complete version.
//! 4. A failed or cancelled upload removes its partial file; the previously
//!    committed object is never touched. Once a commit starts it runs to
//!    completion on its own task.
//! 5. Copies go through a fixed-size buffer regardless of object size.
//! 6. The index is rebuilt from the directory on open ([`reconcile`]);
//!    [`ReconcileMode::ReadOnly`] scans without deleting anything.

pub mod config;
pub mod error;
pub mod index;
pub mod name;
pub mod reader;
pub mod reconcile;
mod staging;
pub mod store;

// Re-export primary types at crate root for ergonomic imports.
pub use config::StoreConfig;
pub use error::{StoreError, StoreResult};
pub use index::{ControlBlock, NameIndex};
pub use reader::ObjectReader;
pub use reconcile::{reconcile, reconcile_with, ReconcileMode, ReconcileReport};
pub use store::{BlobStore, PutOutcome};
