use serde::de::DeserializeOwned;

use super::errors::CoordinationError;
use crate::backend::{Backend, Query};

/// Run a query and decode the rows as `T`
///
/// A row that does not decode is logged and skipped; the other rows are kept.
pub(super) async fn fetch<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
    token: Option<&str>,
) -> Result<Vec<T>, CoordinationError> {
    let rows = backend.select(query, token).await?;
    Ok(rows
        .into_iter()
        .filter_map(|row| {
            let id = row.get("id").cloned().unwrap_or_default();
            serde_json::from_value(row)
                .map_err(|e| tracing::warn!("Skipping {} row {}: {}", query.table, id, e))
                .ok()
        })
        .collect())
}

/// Like [`fetch`], but a failure is logged and reads as an empty section
pub(super) async fn fetch_or_empty<T: DeserializeOwned>(
    backend: &dyn Backend,
    query: &Query,
    token: Option<&str>,
) -> Vec<T> {
    match fetch(backend, query, token).await {
        Ok(records) => records,
        Err(e) => {
            tracing::error!("Error loading {}: {}", query.table, e);
            Vec::new()
        }
    }
}
