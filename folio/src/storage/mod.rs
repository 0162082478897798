mod cache_store;
mod errors;
mod types;

pub(crate) async fn init() -> Result<(), errors::StorageError> {
    let store = cache_store::GENERIC_CACHE_STORE.lock().await;
    store.init().await
}

pub(crate) use cache_store::GENERIC_CACHE_STORE;
pub use errors::StorageError;
pub(crate) use types::CacheData;

