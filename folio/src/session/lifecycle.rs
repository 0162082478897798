use chrono::{Duration, Utc};
use headers::Cookie;
use http::header::HeaderMap;

use crate::backend::AuthSession;
use crate::session::config::{SESSION_COOKIE_MAX_AGE, SESSION_COOKIE_NAME};
use crate::session::errors::SessionError;
use crate::session::types::{SessionUser, StoredSession};
use crate::storage::GENERIC_CACHE_STORE;
use crate::utils::{gen_random_string, header_set_cookie};

const SESSION_PREFIX: &str = "session";

/// Session lifetime: the configured maximum, shortened to the backend token's lifetime
fn session_ttl(token_lifetime: Option<u64>) -> u64 {
    match token_lifetime {
        Some(lifetime) if lifetime > 0 => lifetime.min(*SESSION_COOKIE_MAX_AGE),
        _ => *SESSION_COOKIE_MAX_AGE,
    }
}

/// Start a server-side session for a freshly signed-in admin
///
/// Returns the `Set-Cookie` header carrying the new session id.
pub async fn create_session(auth: &AuthSession) -> Result<HeaderMap, SessionError> {
    let session_id = gen_random_string(32)?;
    let csrf_token = gen_random_string(32)?;
    let ttl = session_ttl(auth.expires_in);
    let expires_at = Utc::now() + Duration::seconds(ttl as i64);

    let stored_session = StoredSession {
        user_id: auth.user.id.clone(),
        email: auth.user.email.clone().unwrap_or_default(),
        access_token: auth.access_token.clone(),
        refresh_token: auth.refresh_token.clone(),
        csrf_token,
        expires_at,
    };

    GENERIC_CACHE_STORE
        .lock()
        .await
        .put_with_ttl(
            SESSION_PREFIX,
            &session_id,
            stored_session.try_into()?,
            ttl as usize,
        )
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?;

    let mut headers = HeaderMap::new();
    header_set_cookie(&mut headers, SESSION_COOKIE_NAME.as_str(), &session_id, ttl as i64)?;

    tracing::debug!("Created session for user {}", auth.user.id);
    Ok(headers)
}

/// Resolve a session cookie value to the signed-in admin
pub async fn get_user_from_session(session_id: &str) -> Result<SessionUser, SessionError> {
    let cached_session = GENERIC_CACHE_STORE
        .lock()
        .await
        .get(SESSION_PREFIX, session_id)
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))?
        .ok_or(SessionError::SessionError)?;

    let stored_session: StoredSession = cached_session.try_into()?;

    if stored_session.expires_at < Utc::now() {
        tracing::debug!("Session expired for user {}", stored_session.user_id);
        delete_session_from_store(session_id).await?;
        return Err(SessionError::SessionExpiredError);
    }

    Ok(SessionUser::from(stored_session))
}

/// Expire the session cookie and drop the stored session
///
/// Returns the headers for the response together with the backend access
/// token that was bound to the session, so the caller can revoke it.
pub async fn prepare_logout_response(
    cookies: Cookie,
) -> Result<(HeaderMap, Option<String>), SessionError> {
    let mut headers = HeaderMap::new();
    header_set_cookie(&mut headers, SESSION_COOKIE_NAME.as_str(), "value", -86400)?;

    let mut access_token = None;
    if let Some(session_id) = cookies.get(SESSION_COOKIE_NAME.as_str()) {
        access_token = match get_user_from_session(session_id).await {
            Ok(user) => Some(user.access_token),
            Err(_) => None,
        };
        delete_session_from_store(session_id).await?;
    }

    Ok((headers, access_token))
}

async fn delete_session_from_store(session_id: &str) -> Result<(), SessionError> {
    GENERIC_CACHE_STORE
        .lock()
        .await
        .remove(SESSION_PREFIX, session_id)
        .await
        .map_err(|e| SessionError::Storage(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::BackendUser;
    use crate::storage::CacheData;
    use crate::test_utils::{session_cookie, session_id_from};
    use http::header::SET_COOKIE;
    use serial_test::serial;

    fn auth_session(expires_in: Option<u64>) -> AuthSession {
        AuthSession {
            access_token: "backend-token".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_in,
            user: BackendUser {
                id: "user-1".to_string(),
                email: Some("jane@site.dev".to_string()),
                email_confirmed_at: Some(Utc::now()),
            },
        }
    }

    #[test]
    fn test_session_ttl_is_capped_by_token_lifetime() {
        assert_eq!(session_ttl(Some(60)), 60.min(*SESSION_COOKIE_MAX_AGE));
        assert_eq!(session_ttl(None), *SESSION_COOKIE_MAX_AGE);
        assert_eq!(session_ttl(Some(0)), *SESSION_COOKIE_MAX_AGE);
    }

    #[tokio::test]
    #[serial]
    async fn test_create_and_resolve_session() {
        // Given a new session for a signed-in user
        let headers = create_session(&auth_session(Some(3600))).await.unwrap();
        let session_id = session_id_from(&headers);

        // When resolving the cookie value
        let user = get_user_from_session(&session_id).await.unwrap();

        // Then the backend identity and token are available
        assert_eq!(user.id, "user-1");
        assert_eq!(user.email, "jane@site.dev");
        assert_eq!(user.access_token, "backend-token");
        assert_eq!(user.csrf_token.len(), 43);
    }

    #[tokio::test]
    #[serial]
    async fn test_unknown_session_is_rejected() {
        let result = get_user_from_session("no-such-session").await;
        assert!(matches!(result, Err(SessionError::SessionError)));
    }

    #[tokio::test]
    #[serial]
    async fn test_expired_session_is_rejected_and_removed() {
        // Given a stored session whose expiry has passed but is still in the store
        let stored = StoredSession {
            user_id: "user-2".to_string(),
            email: "old@site.dev".to_string(),
            access_token: "t".to_string(),
            refresh_token: None,
            csrf_token: "c".to_string(),
            expires_at: Utc::now() - Duration::seconds(10),
        };
        let data: CacheData = stored.try_into().unwrap();
        GENERIC_CACHE_STORE
            .lock()
            .await
            .put_with_ttl(SESSION_PREFIX, "stale", data, 60)
            .await
            .unwrap();

        // When resolving it
        let result = get_user_from_session("stale").await;

        // Then it is expired and no longer stored
        assert!(matches!(result, Err(SessionError::SessionExpiredError)));
        let remaining = GENERIC_CACHE_STORE
            .lock()
            .await
            .get(SESSION_PREFIX, "stale")
            .await
            .unwrap();
        assert!(remaining.is_none());
    }

    #[tokio::test]
    #[serial]
    async fn test_logout_returns_token_and_drops_session() {
        // Given an active session
        let headers = create_session(&auth_session(None)).await.unwrap();
        let session_id = session_id_from(&headers);

        // When logging out
        let (logout_headers, token) = prepare_logout_response(session_cookie(&session_id))
            .await
            .unwrap();

        // Then the cookie is expired, the token handed back, and the session gone
        let cookie = logout_headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Max-Age=-86400"));
        assert_eq!(token.as_deref(), Some("backend-token"));
        assert!(get_user_from_session(&session_id).await.is_err());
    }

    #[tokio::test]
    #[serial]
    async fn test_logout_without_session_cookie() {
        let (headers, token) = prepare_logout_response(session_cookie("unknown"))
            .await
            .unwrap();
        assert!(headers.get(SET_COOKIE).is_some());
        assert!(token.is_none());
    }
}
