//! Shared helpers for unit tests across the crate

use async_trait::async_trait;
use headers::{Cookie, HeaderMapExt};
use http::HeaderMap;
use http::header::{COOKIE, SET_COOKIE};
use serde_json::Value;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::backend::{AuthSession, Backend, BackendError, BackendUser, Query, SignUpResponse};
use crate::session::SESSION_COOKIE_NAME;

/// Wraps a backend and counts every call made through it
pub(crate) struct CountingBackend<B> {
    inner: B,
    calls: AtomicUsize,
}

impl<B: Backend> CountingBackend<B> {
    pub(crate) fn new(inner: B) -> Self {
        Self {
            inner,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn tick(&self) -> &B {
        self.calls.fetch_add(1, Ordering::SeqCst);
        &self.inner
    }
}

#[async_trait]
impl<B: Backend> Backend for CountingBackend<B> {
    async fn init(&self) -> Result<(), BackendError> {
        self.tick().init().await
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        self.tick().sign_up(email, password).await
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        self.tick().sign_in_with_password(email, password).await
    }

    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        self.tick().get_user(access_token).await
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        self.tick().sign_out(access_token).await
    }

    async fn select(
        &self,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError> {
        self.tick().select(query, access_token).await
    }

    async fn count(&self, table: &str, access_token: Option<&str>) -> Result<u64, BackendError> {
        self.tick().count(table, access_token).await
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        self.tick().insert(table, row, access_token).await
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        self.tick().update(table, id, patch, access_token).await
    }

    async fn delete(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError> {
        self.tick().delete(table, id, access_token).await
    }

    async fn rpc(
        &self,
        function: &str,
        args: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        self.tick().rpc(function, args, access_token).await
    }
}

/// The session id carried by a `Set-Cookie` header
pub(crate) fn session_id_from(headers: &HeaderMap) -> String {
    let cookie = headers
        .get(SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    let pair = cookie.split(';').next().unwrap_or_default();
    pair.split_once('=')
        .map(|(_, v)| v.to_string())
        .unwrap_or_default()
}

/// A request `Cookie` header holding the given session id
pub(crate) fn session_cookie(session_id: &str) -> Cookie {
    let mut map = HeaderMap::new();
    let value = format!("{}={}", SESSION_COOKIE_NAME.as_str(), session_id);
    map.insert(COOKIE, value.parse().expect("valid cookie header"));
    map.typed_get::<Cookie>().expect("cookie header")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use serde_json::json;

    #[tokio::test]
    async fn test_counting_backend_counts_every_call() {
        let backend = CountingBackend::new(InMemoryBackend::new(true));

        let _ = backend.count("profiles", None).await;
        let _ = backend.rpc("is_registration_allowed", json!({}), None).await;
        let _ = backend.sign_in_with_password("a@b.dev", "x").await;

        assert_eq!(backend.calls(), 3);
    }
}
