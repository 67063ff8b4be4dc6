//! Reference `StorageEngine` backed by `sled`, matching the teacher's
//! pattern of wrapping a blocking embedded store behind an async trait via
//! `tokio::task::spawn_blocking` (`core/src/storage/sled.rs`).

use super::{StorageBucket, StorageEngine};
use crate::error::{internal::BackendError, StorageError};
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use sled::{Config, Db};
use std::ops::Bound;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task;

pub struct SledEngine {
    db: Db,
}

impl SledEngine {
    pub fn with_path(path: PathBuf) -> Result<Self, StorageError> {
        std::fs::create_dir_all(&path).map_err(|e| StorageError::Backend(BackendError(e.to_string())))?;
        let db = sled::open(path.join("sled")).map_err(|e| StorageError::Backend(BackendError(e.to_string())))?;
        Ok(Self { db })
    }

    /// An ephemeral database, flushed only on drop — used by tests that
    /// want the real `sled` code path without leaving files behind.
    pub fn new_temporary() -> Result<Self, StorageError> {
        let db = Config::new().temporary(true).flush_every_ms(None).open().map_err(|e| StorageError::Backend(BackendError(e.to_string())))?;
        Ok(Self { db })
    }
}

#[async_trait]
impl StorageEngine for SledEngine {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StorageBucket>, StorageError> {
        let tree = self.db.open_tree(name).map_err(|e| StorageError::Backend(BackendError(e.to_string())))?;
        Ok(Arc::new(SledBucket { tree }))
    }
}

pub struct SledBucket {
    tree: sled::Tree,
}

#[async_trait]
impl StorageBucket for SledBucket {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> {
        let tree = self.tree.clone();
        let key = key.to_vec();
        task::spawn_blocking(move || tree.get(key))
            .await
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))?
            .map(|opt| opt.map(|ivec| ivec.to_vec()))
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))
    }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        let tree = self.tree.clone();
        let key = key.to_vec();
        let value = value.to_vec();
        task::spawn_blocking(move || tree.insert(key, value))
            .await
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))?
            .map(|_| ())
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        let tree = self.tree.clone();
        let key = key.to_vec();
        task::spawn_blocking(move || tree.remove(key))
            .await
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))?
            .map(|_| ())
            .map_err(|e| StorageError::Backend(BackendError(e.to_string())))
    }

    async fn range<'a>(&'a self, low: Bound<&[u8]>, high: Bound<&[u8]>, reverse: bool) -> Result<BoxStream<'a, (Vec<u8>, Vec<u8>)>, StorageError> {
        let low = low.map(|b| b.to_vec());
        let high = high.map(|b| b.to_vec());
        let tree = self.tree.clone();
        let items = task::spawn_blocking(move || -> Result<Vec<(Vec<u8>, Vec<u8>)>, sled::Error> {
            let iter = tree.range::<Vec<u8>, _>((low, high));
            let mut items = Vec::new();
            for entry in iter {
                let (k, v) = entry?;
                items.push((k.to_vec(), v.to_vec()));
            }
            if reverse {
                items.reverse();
            }
            Ok(items)
        })
        .await
        .map_err(|e| StorageError::Backend(BackendError(e.to_string())))?
        .map_err(|e| StorageError::Backend(BackendError(e.to_string())))?;
        Ok(stream::iter(items).boxed())
    }
}
