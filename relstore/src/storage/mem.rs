//! In-memory `StorageEngine`, for this crate's own test suite — spinning
//! up `sled` per unit test is unnecessary I/O (spec §4.10).

use super::{StorageBucket, StorageEngine};
use crate::error::StorageError;
use async_trait::async_trait;
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::BTreeMap;
use std::ops::Bound;
use std::sync::{Arc, RwLock};

#[derive(Default)]
pub struct MemEngine {
    buckets: RwLock<std::collections::HashMap<String, Arc<MemBucket>>>,
}

impl MemEngine {
    pub fn new() -> Self { Self::default() }
}

#[async_trait]
impl StorageEngine for MemEngine {
    async fn bucket(&self, name: &str) -> Result<Arc<dyn StorageBucket>, StorageError> {
        if let Some(b) = self.buckets.read().unwrap().get(name) {
            return Ok(b.clone());
        }
        let bucket = Arc::new(MemBucket::default());
        self.buckets.write().unwrap().insert(name.to_string(), bucket.clone());
        Ok(bucket)
    }
}

#[derive(Default)]
pub struct MemBucket {
    tree: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

#[async_trait]
impl StorageBucket for MemBucket {
    async fn get(&self, key: &[u8]) -> Result<Option<Vec<u8>>, StorageError> { Ok(self.tree.read().unwrap().get(key).cloned()) }

    async fn put(&self, key: &[u8], value: &[u8]) -> Result<(), StorageError> {
        self.tree.write().unwrap().insert(key.to_vec(), value.to_vec());
        Ok(())
    }

    async fn delete(&self, key: &[u8]) -> Result<(), StorageError> {
        self.tree.write().unwrap().remove(key);
        Ok(())
    }

    async fn range<'a>(&'a self, low: Bound<&[u8]>, high: Bound<&[u8]>, reverse: bool) -> Result<BoxStream<'a, (Vec<u8>, Vec<u8>)>, StorageError> {
        let low = low.map(|b| b.to_vec());
        let high = high.map(|b| b.to_vec());
        let guard = self.tree.read().unwrap();
        let mut items: Vec<(Vec<u8>, Vec<u8>)> = guard.range::<[u8], _>((bound_ref(&low), bound_ref(&high))).map(|(k, v)| (k.clone(), v.clone())).collect();
        if reverse {
            items.reverse();
        }
        Ok(stream::iter(items).boxed())
    }
}

fn bound_ref(b: &Bound<Vec<u8>>) -> Bound<&[u8]> {
    match b {
        Bound::Included(v) => Bound::Included(v.as_slice()),
        Bound::Excluded(v) => Bound::Excluded(v.as_slice()),
        Bound::Unbounded => Bound::Unbounded,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn put_then_get_round_trips() {
        let engine = MemEngine::new();
        let bucket = engine.bucket("t").await.unwrap();
        bucket.put(b"k1", b"v1").await.unwrap();
        assert_eq!(bucket.get(b"k1").await.unwrap(), Some(b"v1".to_vec()));
    }

    #[tokio::test]
    async fn range_scan_is_ordered_and_reversible() {
        let engine = MemEngine::new();
        let bucket = engine.bucket("t").await.unwrap();
        for k in [b"a", b"b", b"c"] {
            bucket.put(k, k).await.unwrap();
        }
        let mut forward = bucket.range(Bound::Unbounded, Bound::Unbounded, false).await.unwrap();
        let mut keys = Vec::new();
        while let Some((k, _)) = forward.next().await {
            keys.push(k);
        }
        assert_eq!(keys, vec![b"a".to_vec(), b"b".to_vec(), b"c".to_vec()]);

        let mut backward = bucket.range(Bound::Unbounded, Bound::Unbounded, true).await.unwrap();
        let mut rkeys = Vec::new();
        while let Some((k, _)) = backward.next().await {
            rkeys.push(k);
        }
        assert_eq!(rkeys, vec![b"c".to_vec(), b"b".to_vec(), b"a".to_vec()]);
    }

    #[tokio::test]
    async fn delete_removes_key() {
        let engine = MemEngine::new();
        let bucket = engine.bucket("t").await.unwrap();
        bucket.put(b"k", b"v").await.unwrap();
        bucket.delete(b"k").await.unwrap();
        assert_eq!(bucket.get(b"k").await.unwrap(), None);
    }
}
