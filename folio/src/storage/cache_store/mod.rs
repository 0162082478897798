mod memory;
mod redis;

use async_trait::async_trait;
use std::{env, sync::LazyLock};
use tokio::sync::Mutex;

use super::errors::StorageError;
use super::types::CacheData;

pub(crate) use memory::InMemoryCacheStore;
use self::redis::RedisCacheStore;

const CACHE_PREFIX: &str = "cache";

fn make_key(prefix: &str, key: &str) -> String {
    format!("{CACHE_PREFIX}:{prefix}:{key}")
}

#[async_trait]
pub(crate) trait CacheStore: Send + Sync + 'static {
    /// Initialize the store. This is called when the store is created.
    async fn init(&self) -> Result<(), StorageError>;

    /// Put a value into the store; it reads as absent once `ttl` seconds have passed.
    async fn put_with_ttl(
        &mut self,
        prefix: &str,
        key: &str,
        value: CacheData,
        ttl: usize,
    ) -> Result<(), StorageError>;

    async fn get(&self, prefix: &str, key: &str) -> Result<Option<CacheData>, StorageError>;

    async fn remove(&mut self, prefix: &str, key: &str) -> Result<(), StorageError>;
}

static GENERIC_CACHE_STORE_TYPE: LazyLock<String> = LazyLock::new(|| {
    env::var("GENERIC_CACHE_STORE_TYPE").unwrap_or_else(|_| "memory".to_string())
});

static GENERIC_CACHE_STORE_URL: LazyLock<String> =
    LazyLock::new(|| env::var("GENERIC_CACHE_STORE_URL").unwrap_or_default());

pub(crate) static GENERIC_CACHE_STORE: LazyLock<Mutex<Box<dyn CacheStore>>> =
    LazyLock::new(|| {
        let store_type = GENERIC_CACHE_STORE_TYPE.as_str();
        let store_url = GENERIC_CACHE_STORE_URL.as_str();

        tracing::info!(
            "Initializing cache store with type: {}, url: {}",
            store_type,
            store_url
        );

        let store: Box<dyn CacheStore> = match store_type {
            "memory" => Box::new(InMemoryCacheStore::new()),
            "redis" => {
                let client = match ::redis::Client::open(store_url) {
                    Ok(client) => client,
                    Err(e) => {
                        tracing::error!("Failed to create Redis client: {}", e);
                        panic!("Failed to create Redis client: {e}");
                    }
                };
                let store = RedisCacheStore { client };
                if let Err(e) = tokio::task::block_in_place(|| {
                    tokio::runtime::Handle::current().block_on(async { store.init().await })
                }) {
                    tracing::error!("Failed to connect to Redis: {}", e);
                    panic!("Failed to connect to Redis: {e}");
                }
                Box::new(store)
            }
            t => panic!(
                "Unsupported cache store type: {t}. Supported types are 'memory' and 'redis'"
            ),
        };

        tracing::info!("Connected to cache store: type={}", store_type);

        Mutex::new(store)
    });

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_key() {
        assert_eq!(make_key("session", "abc"), "cache:session:abc");
    }
}
