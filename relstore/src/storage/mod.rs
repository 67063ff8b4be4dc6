//! The storage-engine boundary (spec §4.10): an external ordered key/value
//! store is the real backing index, but this crate still needs a trait
//! seam to drive scanners/updaters/predicate-locks end to end in its own
//! tests. Grounded on `core/src/storage/mod.rs`'s `StorageEngine`/
//! `StorageBucket` split, narrowed from record-state/predicate-specific
//! methods to the plain byte get/put/delete/range surface this layer's
//! own codecs already know how to use.

pub mod mem;
#[cfg(feature = "sled")]
pub mod sled;

pub use mem::{MemBucket, MemEngine};
#[cfg(feature = "sled")]
pub use sled::{SledBucket, SledEngine};

use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::BoxStream;
use std::ops::Bound;
use std::sync::Arc;

#[async_trait]
pub trait StorageEngine: Send + Sync {
    /// Open (creating if necessary) a named ordered byte-range namespace.
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StorageBucket>, StorageError>;
}

#[async_trait]
pub trait StorageBucket: Send + Sync {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError>;
    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError>;
    async fn delete(&self, key: &[u8]) -> Result<(), StorageError>;

    /// Ordered iteration between `low` and `high`, optionally reversed.
    /// `'a` ties the returned stream's lifetime to the bucket reference
    /// rather than to the caller's (possibly transient) key bounds.
    async fn range<'a>(&'a self, low: Bound<&[u8]>, high: Bound<&[u8]>, reverse: bool) -> Result<BoxStream<'a, (Vec<u8>, Vec<u8>)>, StorageError>;
}
