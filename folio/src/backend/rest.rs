use async_trait::async_trait;
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde_json::{Value, json};
use std::time::Duration;
use url::Url;

use super::errors::BackendError;
use super::types::{AuthSession, Backend, BackendUser, Filter, Query, SignUpResponse};

/// Client for a Supabase-compatible hosted backend (GoTrue auth + PostgREST data API)
pub(crate) struct RestBackend {
    base_url: Url,
    anon_key: String,
    client: reqwest::Client,
}

impl RestBackend {
    pub(crate) fn new(base_url: &str, anon_key: &str, timeout_secs: u64) -> Result<Self, BackendError> {
        if anon_key.is_empty() {
            return Err(BackendError::Config(
                "FOLIO_BACKEND_ANON_KEY must not be empty".to_string(),
            ));
        }

        // Url::join drops the last path segment unless it ends with '/'
        let mut base = base_url.trim_end_matches('/').to_string();
        base.push('/');
        let base_url = Url::parse(&base)?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()?;

        Ok(Self {
            base_url,
            anon_key: anon_key.to_string(),
            client,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, BackendError> {
        Ok(self.base_url.join(path)?)
    }

    fn request(&self, method: Method, url: Url, access_token: Option<&str>) -> RequestBuilder {
        let bearer = access_token.unwrap_or(&self.anon_key);
        self.client
            .request(method, url)
            .header("apikey", &self.anon_key)
            .bearer_auth(bearer)
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, BackendError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(status, &body);
        tracing::debug!("Backend responded with {}: {}", status, message);
        Err(BackendError::api(status.as_u16(), message))
    }

    async fn send_json(&self, request: RequestBuilder) -> Result<Value, BackendError> {
        let response = self.send(request).await?;
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }

    fn table_url(&self, table: &str) -> Result<Url, BackendError> {
        self.endpoint(&format!("rest/v1/{table}"))
    }

    fn row_url(&self, table: &str, id: &str) -> Result<Url, BackendError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("id", &format!("eq.{id}"));
        Ok(url)
    }
}

/// Build the PostgREST url for a select query
pub(crate) fn query_url(base: &Url, query: &Query) -> Result<Url, BackendError> {
    let mut url = base.join(&format!("rest/v1/{}", query.table))?;
    {
        let mut pairs = url.query_pairs_mut();
        pairs.append_pair("select", "*");
        for filter in &query.filters {
            let condition = match filter {
                Filter::Eq(_, value) => format!("eq.{}", scalar_text(value)),
                Filter::Contains(_, needle) => format!("like.*{needle}*"),
                Filter::IsNull(_) => "is.null".to_string(),
            };
            pairs.append_pair(filter.column(), &condition);
        }
        if !query.order.is_empty() {
            let order = query
                .order
                .iter()
                .map(|o| format!("{}.{}", o.column, if o.ascending { "asc" } else { "desc" }))
                .collect::<Vec<_>>()
                .join(",");
            pairs.append_pair("order", &order);
        }
        if let Some(limit) = query.limit {
            pairs.append_pair("limit", &limit.to_string());
        }
    }
    Ok(url)
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Pick the human-readable message out of an auth or data API error body
pub(crate) fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(map)) = serde_json::from_str::<Value>(body) {
        for key in ["msg", "error_description", "message", "error"] {
            if let Some(Value::String(text)) = map.get(key) {
                if !text.is_empty() {
                    return text.clone();
                }
            }
        }
    }
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

/// Extract the total from a `Content-Range` header such as `0-24/3573` or `*/0`
pub(crate) fn parse_content_range(value: &str) -> Option<u64> {
    value.rsplit_once('/')?.1.trim().parse().ok()
}

fn parse_sign_up(body: Value) -> Result<SignUpResponse, BackendError> {
    if body.get("access_token").is_some() {
        return Ok(SignUpResponse::Session(serde_json::from_value(body)?));
    }
    // With email confirmation enabled the provider answers with the bare user
    let user = match body.get("user") {
        Some(user) if !user.is_null() => user.clone(),
        _ => body,
    };
    Ok(SignUpResponse::Unconfirmed(serde_json::from_value(user)?))
}

fn first_row(body: Value, what: String) -> Result<Value, BackendError> {
    match body {
        Value::Array(mut rows) if !rows.is_empty() => Ok(rows.swap_remove(0)),
        Value::Array(_) => Err(BackendError::NotFound(what)),
        other => Ok(other),
    }
}

#[async_trait]
impl Backend for RestBackend {
    async fn init(&self) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/health")?;
        self.send(self.request(Method::GET, url, None)).await?;
        tracing::info!("Connected to hosted backend at {}", self.base_url);
        Ok(())
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError> {
        let url = self.endpoint("auth/v1/signup")?;
        let body = self
            .send_json(
                self.request(Method::POST, url, None)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        parse_sign_up(body)
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = self
            .send_json(
                self.request(Method::POST, url, None)
                    .json(&json!({ "email": email, "password": password })),
            )
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError> {
        let url = self.endpoint("auth/v1/user")?;
        let body = self
            .send_json(self.request(Method::GET, url, Some(access_token)))
            .await?;
        Ok(serde_json::from_value(body)?)
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError> {
        let url = self.endpoint("auth/v1/logout")?;
        self.send(self.request(Method::POST, url, Some(access_token)))
            .await?;
        Ok(())
    }

    async fn select(
        &self,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError> {
        let url = query_url(&self.base_url, query)?;
        tracing::trace!("select {}", query);
        let body = self
            .send_json(self.request(Method::GET, url, access_token))
            .await?;
        match body {
            Value::Array(rows) => Ok(rows),
            Value::Null => Ok(Vec::new()),
            other => Err(BackendError::Decode(format!(
                "expected an array of rows, got {other}"
            ))),
        }
    }

    async fn count(&self, table: &str, access_token: Option<&str>) -> Result<u64, BackendError> {
        let mut url = self.table_url(table)?;
        url.query_pairs_mut().append_pair("select", "*");
        let response = self
            .send(
                self.request(Method::HEAD, url, access_token)
                    .header("Prefer", "count=exact"),
            )
            .await?;

        response
            .headers()
            .get("content-range")
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range)
            .ok_or_else(|| BackendError::Decode("missing or invalid Content-Range".to_string()))
    }

    async fn insert(
        &self,
        table: &str,
        row: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let url = self.table_url(table)?;
        let body = self
            .send_json(
                self.request(Method::POST, url, access_token)
                    .header("Prefer", "return=representation")
                    .json(&row),
            )
            .await?;
        first_row(body, format!("{table} (insert)"))
    }

    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let url = self.row_url(table, id)?;
        let body = self
            .send_json(
                self.request(Method::PATCH, url, access_token)
                    .header("Prefer", "return=representation")
                    .json(&patch),
            )
            .await?;
        // Row-level policies hide rows the caller may not touch, so an empty result means no match
        first_row(body, format!("{table}/{id}"))
    }

    async fn delete(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError> {
        let url = self.row_url(table, id)?;
        self.send(self.request(Method::DELETE, url, access_token))
            .await?;
        Ok(())
    }

    async fn rpc(
        &self,
        function: &str,
        args: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError> {
        let url = self.endpoint(&format!("rest/v1/rpc/{function}"))?;
        self.send_json(self.request(Method::POST, url, access_token).json(&args))
            .await
    }
}
