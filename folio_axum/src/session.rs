use axum::{
    RequestPartsExt,
    extract::{FromRequestParts, OptionalFromRequestParts},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::{TypedHeader, headers};
use http::{Method, StatusCode, request::Parts};
use serde::Deserialize;
use subtle::ConstantTimeEq;

use super::config::FOLIO_REDIRECT_ANON;
use folio::{SESSION_COOKIE_NAME, SessionUser, get_user_from_session};

pub struct AuthRedirect {
    method: Method,
}

impl AuthRedirect {
    fn new(method: Method) -> Self {
        Self { method }
    }

    fn into_response_with_method(self) -> Response {
        if self.method == Method::GET {
            tracing::debug!("Redirecting to {}", FOLIO_REDIRECT_ANON.as_str());
            Redirect::temporary(FOLIO_REDIRECT_ANON.as_str()).into_response()
        } else {
            tracing::debug!("Unauthorized");
            (StatusCode::UNAUTHORIZED, "Unauthorized").into_response()
        }
    }
}

impl IntoResponse for AuthRedirect {
    fn into_response(self) -> Response {
        self.into_response_with_method()
    }
}

/// The signed-in admin, available as an Axum extractor
///
/// Extraction checks the session cookie. For state-changing methods an
/// `X-CSRF-Token` header is verified when present; form posts without the
/// header must carry a `csrf_token` field, checked by the handler through
/// [`AuthUser::verify_form_csrf`].
///
/// # Example
///
/// ```no_run
/// use axum::{routing::get, Router};
/// use folio_axum::AuthUser;
///
/// async fn protected_handler(user: AuthUser) -> String {
///     format!("Hello, {}!", user.email)
/// }
///
/// let app: Router = Router::new()
///     .route("/protected", get(protected_handler));
/// ```
#[derive(Clone, Debug)]
pub struct AuthUser {
    /// Backend user id
    pub id: String,
    pub email: String,
    /// Backend access token used for row-level authorization
    pub access_token: String,
    /// CSRF token associated with the user's session
    pub csrf_token: String,
    /// Whether CSRF token was verified via header
    pub csrf_via_header_verified: bool,
}

impl From<&AuthUser> for SessionUser {
    fn from(auth_user: &AuthUser) -> Self {
        SessionUser {
            id: auth_user.id.clone(),
            email: auth_user.email.clone(),
            access_token: auth_user.access_token.clone(),
            csrf_token: auth_user.csrf_token.clone(),
        }
    }
}

impl From<SessionUser> for AuthUser {
    fn from(session_user: SessionUser) -> Self {
        AuthUser {
            id: session_user.id,
            email: session_user.email,
            access_token: session_user.access_token,
            csrf_token: session_user.csrf_token,
            csrf_via_header_verified: false,
        }
    }
}

impl AuthUser {
    /// Check the `csrf_token` field of a form post unless the header already passed
    pub(crate) fn verify_form_csrf(&self, submitted: &str) -> Result<(), (StatusCode, String)> {
        if self.csrf_via_header_verified {
            return Ok(());
        }
        if !submitted.is_empty()
            && submitted
                .as_bytes()
                .ct_eq(self.csrf_token.as_bytes())
                .into()
        {
            return Ok(());
        }
        tracing::warn!("CSRF token mismatch in form submission for user {}", self.id);
        Err((StatusCode::FORBIDDEN, "Invalid CSRF token".to_string()))
    }
}

/// A form body carrying the session's CSRF token next to its own fields
#[derive(Debug, Deserialize)]
pub(crate) struct CsrfForm<T> {
    #[serde(default)]
    pub(crate) csrf_token: String,
    #[serde(flatten)]
    pub(crate) fields: T,
}

/// A form body with nothing but the CSRF token
#[derive(Debug, Deserialize)]
pub(crate) struct CsrfField {
    #[serde(default)]
    pub(crate) csrf_token: String,
}

fn is_state_changing(method: &Method) -> bool {
    method == Method::POST
        || method == Method::PUT
        || method == Method::DELETE
        || method == Method::PATCH
}

impl<B> FromRequestParts<B> for AuthUser
where
    B: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(parts: &mut Parts, _: &B) -> Result<Self, Self::Rejection> {
        let method = parts.method.clone();
        let cookies: TypedHeader<headers::Cookie> = parts.extract().await.map_err(|_| {
            tracing::debug!("No cookies on request");
            AuthRedirect::new(method.clone())
        })?;

        let session_cookie = cookies.get(SESSION_COOKIE_NAME.as_str()).ok_or_else(|| {
            tracing::debug!("No session cookie {:?}", SESSION_COOKIE_NAME.as_str());
            AuthRedirect::new(method.clone())
        })?;

        let session_user = get_user_from_session(session_cookie).await.map_err(|e| {
            tracing::debug!("Failed to get user from session: {}", e);
            AuthRedirect::new(method.clone())
        })?;

        let mut auth_user = AuthUser::from(session_user);

        if !is_state_changing(&method) {
            return Ok(auth_user);
        }

        if let Some(header_csrf_token) = parts
            .headers
            .get("X-CSRF-Token")
            .and_then(|h| h.to_str().ok())
        {
            if header_csrf_token
                .as_bytes()
                .ct_eq(auth_user.csrf_token.as_bytes())
                .into()
            {
                auth_user.csrf_via_header_verified = true;
                tracing::trace!("CSRF token via X-CSRF-Token header verified.");
            } else {
                tracing::error!("CSRF token mismatch (X-CSRF-Token) for user {}", auth_user.id);
                return Err(AuthRedirect::new(method.clone()));
            }
        } else {
            let is_form_like = parts
                .headers
                .get(http::header::CONTENT_TYPE)
                .and_then(|h| h.to_str().ok())
                .is_some_and(|ct| {
                    ct.starts_with("application/x-www-form-urlencoded")
                        || ct.starts_with("multipart/form-data")
                });

            if !is_form_like {
                tracing::warn!(
                    "CSRF protection: X-CSRF-Token header missing for non-form {} request. Rejecting.",
                    method
                );
                return Err(AuthRedirect::new(method.clone()));
            }
        }

        Ok(auth_user)
    }
}

impl<B> OptionalFromRequestParts<B> for AuthUser
where
    B: Send + Sync,
{
    type Rejection = AuthRedirect;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &B,
    ) -> Result<Option<Self>, Self::Rejection> {
        let result: Result<Self, Self::Rejection> =
            <AuthUser as FromRequestParts<B>>::from_request_parts(parts, state).await;
        Ok(result.ok())
    }
}
