use async_trait::async_trait;
use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::{CacheStore, make_key};
use crate::storage::errors::StorageError;
use crate::storage::types::CacheData;

struct Entry {
    data: CacheData,
    expires_at: Instant,
}

pub(crate) struct InMemoryCacheStore {
    entry: HashMap<String, Entry>,
}

impl InMemoryCacheStore {
    pub(crate) fn new() -> Self {
        tracing::info!("Creating new in-memory generic cache store");
        Self {
            entry: HashMap::new(),
        }
    }

    fn purge_expired(&mut self) {
        let now = Instant::now();
        self.entry.retain(|_, e| e.expires_at > now);
    }
}

#[async_trait]
impl CacheStore for InMemoryCacheStore {
    async fn init(&self) -> Result<(), StorageError> {
        Ok(())
    }

    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError> {
        self.purge_expired();
        let expires_at = Instant::now() + Duration::from_secs(ttl as u64);
        self.entry.insert(
            make_key(prefix, key),
            Entry {
                data: value,
                expires_at,
            },
        );
        Ok(())
    }

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError> {
        Ok(self
            .entry
            .get(&make_key(prefix, key))
            .filter(|e| e.expires_at > Instant::now())
            .map(|e| e.data.clone()))
    }

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError> {
        self.entry.remove(&make_key(prefix, key));
        Ok(())
    }
}
