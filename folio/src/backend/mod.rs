mod config;
mod errors;
mod memory;
mod rest;
mod types;

use std::sync::{Arc, LazyLock, RwLock};

pub use errors::BackendError;
pub use memory::{BackendOp, InMemoryBackend};
pub use types::{AuthSession, Backend, BackendUser, Filter, Order, Query, SignUpResponse};

use config::{
    FOLIO_BACKEND_ANON_KEY, FOLIO_BACKEND_TIMEOUT_SECS, FOLIO_BACKEND_TYPE, FOLIO_BACKEND_URL,
    FOLIO_MEMORY_AUTOCONFIRM, FOLIO_MEMORY_SEED_SAMPLE,
};
use rest::RestBackend;

static GENERIC_BACKEND: LazyLock<RwLock<Arc<dyn Backend>>> = LazyLock::new(|| {
    let backend_type = FOLIO_BACKEND_TYPE.as_str();
    tracing::info!("Initializing backend with type: {}", backend_type);

    let backend: Arc<dyn Backend> = match backend_type {
        "memory" if *FOLIO_MEMORY_SEED_SAMPLE => {
            Arc::new(InMemoryBackend::with_sample_data(*FOLIO_MEMORY_AUTOCONFIRM))
        }
        "memory" => Arc::new(InMemoryBackend::new(*FOLIO_MEMORY_AUTOCONFIRM)),
        "rest" => match RestBackend::new(
            FOLIO_BACKEND_URL.as_str(),
            FOLIO_BACKEND_ANON_KEY.as_str(),
            *FOLIO_BACKEND_TIMEOUT_SECS,
        ) {
            Ok(backend) => Arc::new(backend),
            Err(e) => {
                tracing::error!("Failed to create REST backend client: {}", e);
                panic!("Failed to create REST backend client: {e}");
            }
        },
        t => panic!("Unsupported backend type: {t}. Supported types are 'memory' and 'rest'"),
    };

    RwLock::new(backend)
});

/// The process-wide backend handle
pub fn backend() -> Arc<dyn Backend> {
    match GENERIC_BACKEND.read() {
        Ok(guard) => guard.clone(),
        Err(poisoned) => poisoned.into_inner().clone(),
    }
}

/// Replace the process-wide backend, e.g. with an [`InMemoryBackend`] in tests
pub fn set_backend(new_backend: Arc<dyn Backend>) {
    match GENERIC_BACKEND.write() {
        Ok(mut guard) => *guard = new_backend,
        Err(poisoned) => *poisoned.into_inner() = new_backend,
    }
}

pub(crate) async fn init() -> Result<(), BackendError> {
    backend().init().await
}
