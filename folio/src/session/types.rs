use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::session::errors::SessionError;
use crate::storage::CacheData;

/// The signed-in admin as seen by request handlers
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionUser {
    pub id: String,
    pub email: String,
    /// Backend access token; row-level security authorizes writes with it
    pub access_token: String,
    pub csrf_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(super) struct StoredSession {
    pub(super) user_id: String,
    pub(super) email: String,
    pub(super) access_token: String,
    pub(super) refresh_token: Option<String>,
    pub(super) csrf_token: String,
    pub(super) expires_at: DateTime<Utc>,
}

impl From<StoredSession> for SessionUser {
    fn from(stored: StoredSession) -> Self {
        Self {
            id: stored.user_id,
            email: stored.email,
            access_token: stored.access_token,
            csrf_token: stored.csrf_token,
        }
    }
}

impl TryFrom<StoredSession> for CacheData {
    type Error = SessionError;

    fn try_from(data: StoredSession) -> Result<Self, Self::Error> {
        Ok(Self {
            value: serde_json::to_string(&data).map_err(|e| SessionError::Storage(e.to_string()))?,
        })
    }
}

impl TryFrom<CacheData> for StoredSession {
    type Error = SessionError;

    fn try_from(data: CacheData) -> Result<Self, Self::Error> {
        serde_json::from_str(&data.value).map_err(|e| SessionError::Storage(e.to_string()))
    }
}
