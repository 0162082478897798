use serde::{Deserialize, Serialize};

/// Opaque payload kept in the cache store, usually a JSON document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub(crate) struct CacheData {
    pub(crate) value: String,
}
