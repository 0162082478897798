use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

use super::errors::BackendError;

/// A user as known to the hosted auth provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BackendUser {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub email_confirmed_at: Option<DateTime<Utc>>,
}

impl BackendUser {
    pub fn is_confirmed(&self) -> bool {
        self.email_confirmed_at.is_some()
    }
}

/// A signed-in session issued by the hosted auth provider
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuthSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    /// Lifetime of the access token in seconds
    #[serde(default)]
    pub expires_in: Option<u64>,
    pub user: BackendUser,
}

/// Result of a sign-up request
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpResponse {
    /// The account is usable right away (email confirmation disabled or already done)
    Session(AuthSession),
    /// The provider sent a confirmation mail; no session yet
    Unconfirmed(BackendUser),
}

/// Row filter, expressed the way PostgREST understands it
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// `column = value`
    Eq(String, Value),
    /// `column` contains the substring (case-sensitive)
    Contains(String, String),
    /// `column IS NULL`
    IsNull(String),
}

impl Filter {
    pub fn eq(column: &str, value: impl Into<Value>) -> Self {
        Self::Eq(column.to_string(), value.into())
    }

    pub fn contains(column: &str, needle: &str) -> Self {
        Self::Contains(column.to_string(), needle.to_string())
    }

    pub fn is_null(column: &str) -> Self {
        Self::IsNull(column.to_string())
    }

    pub fn column(&self) -> &str {
        match self {
            Self::Eq(c, _) | Self::Contains(c, _) | Self::IsNull(c) => c,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub column: String,
    pub ascending: bool,
}

/// A read against one table
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub table: String,
    pub filters: Vec<Filter>,
    pub order: Vec<Order>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn from(table: &str) -> Self {
        Self {
            table: table.to_string(),
            filters: Vec::new(),
            order: Vec::new(),
            limit: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        self.order.push(Order {
            column: column.to_string(),
            ascending,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.table)?;
        for filter in &self.filters {
            match filter {
                Filter::Eq(c, v) => write!(f, " {c}={v}")?,
                Filter::Contains(c, n) => write!(f, " {c}~{n:?}")?,
                Filter::IsNull(c) => write!(f, " {c} is null")?,
            }
        }
        if let Some(limit) = self.limit {
            write!(f, " limit {limit}")?;
        }
        Ok(())
    }
}

/// The hosted backend-as-a-service: auth, tables, and server-side functions.
///
/// `access_token` is the signed-in user's token; `None` means the anonymous
/// key is used, which the service's row-level policies treat as read-only.
#[async_trait]
pub trait Backend: Send + Sync + 'static {
    /// Verify the backend is reachable and configured.
    async fn init(&self) -> Result<(), BackendError>;

    async fn sign_up(&self, email: &str, password: &str) -> Result<SignUpResponse, BackendError>;

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, BackendError>;

    async fn get_user(&self, access_token: &str) -> Result<BackendUser, BackendError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), BackendError>;

    async fn select(
        &self,
        query: &Query,
        access_token: Option<&str>,
    ) -> Result<Vec<Value>, BackendError>;

    /// Exact row count of a table.
    async fn count(&self, table: &str, access_token: Option<&str>) -> Result<u64, BackendError>;

    /// Insert one row and return it as stored.
    async fn insert(
        &self,
        table: &str,
        row: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError>;

    /// Patch the row with the given id and return it as stored.
    async fn update(
        &self,
        table: &str,
        id: &str,
        patch: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError>;

    async fn delete(
        &self,
        table: &str,
        id: &str,
        access_token: Option<&str>,
    ) -> Result<(), BackendError>;

    /// Call a server-side function.
    async fn rpc(
        &self,
        function: &str,
        args: Value,
        access_token: Option<&str>,
    ) -> Result<Value, BackendError>;
}
