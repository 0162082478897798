use headers::Cookie;
use http::HeaderMap;
use serde_json::{Value, json};

use super::bootstrap::{BootstrapOutcome, on_signed_in};
use super::errors::CoordinationError;
use crate::backend::{AuthSession, Backend, BackendError, BackendUser, Filter, Query, SignUpResponse};
use crate::portfolio::TABLE_PROFILES;
use crate::session::{create_session, prepare_logout_response};

/// Notice shown after a sign-up that still needs email confirmation
pub const CONFIRMATION_NOTICE: &str = "Check your email for the confirmation link!";

const REGISTRATION_PREDICATE: &str = "is_registration_allowed";

/// Which check decided whether sign-up is open
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationSource {
    /// The backend's server-side predicate answered
    Predicate,
    /// The predicate failed; decided by counting admin-owned profile rows.
    /// Owner-less sample profiles are not counted, matching the predicate.
    ProfileCount,
    /// Both checks failed; sign-up is left open
    FailOpen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistrationCheck {
    pub allowed: bool,
    pub source: RegistrationSource,
}

/// Decide whether the sign-up form may be offered.
///
/// Asks the backend's predicate first, falls back to "no admin profile rows
/// yet", and leaves registration open when neither answer is available.
pub async fn registration_status(backend: &dyn Backend) -> RegistrationCheck {
    match backend.rpc(REGISTRATION_PREDICATE, json!({}), None).await {
        Ok(Value::Bool(allowed)) => {
            tracing::debug!("Registration predicate answered: {}", allowed);
            return RegistrationCheck {
                allowed,
                source: RegistrationSource::Predicate,
            };
        }
        Ok(other) => {
            tracing::error!("Unexpected registration predicate result: {}", other);
        }
        Err(e) => tracing::error!("Error checking registration status: {}", e),
    }

    match admin_profile_count(backend).await {
        Ok(count) => RegistrationCheck {
            allowed: count == 0,
            source: RegistrationSource::ProfileCount,
        },
        Err(e) => {
            tracing::error!("Error counting profiles, leaving registration open: {}", e);
            RegistrationCheck {
                allowed: true,
                source: RegistrationSource::FailOpen,
            }
        }
    }
}

/// Profile rows that belong to a user; sample rows have no owner
async fn admin_profile_count(backend: &dyn Backend) -> Result<u64, BackendError> {
    let total = backend.count(TABLE_PROFILES, None).await?;
    if total == 0 {
        return Ok(0);
    }
    let ownerless = backend
        .select(
            &Query::from(TABLE_PROFILES).filter(Filter::is_null("user_id")),
            None,
        )
        .await?;
    Ok(total.saturating_sub(ownerless.len() as u64))
}

/// Number of registered admins as shown on the login page; 0 when unknown
pub async fn count_admins(backend: &dyn Backend) -> u64 {
    admin_profile_count(backend)
        .await
        .unwrap_or_else(|e| {
            tracing::error!("Error counting users: {}", e);
            0
        })
}

/// A completed sign-in: the session cookie to set and what bootstrap did
#[derive(Debug)]
pub struct SignedIn {
    pub headers: HeaderMap,
    pub user: BackendUser,
    /// `None` when the profile bootstrap failed; the sign-in itself still stands
    pub bootstrap: Option<BootstrapOutcome>,
}

#[derive(Debug)]
pub enum SignUpOutcome {
    SignedIn(SignedIn),
    /// The account exists but the email must be confirmed before signing in
    ConfirmationRequired,
}

async fn start_session(
    backend: &dyn Backend,
    auth: AuthSession,
) -> Result<SignedIn, CoordinationError> {
    let bootstrap = match on_signed_in(backend, &auth).await {
        Ok(outcome) => Some(outcome),
        Err(e) => {
            tracing::error!("Profile bootstrap failed for {}: {}", auth.user.id, e);
            None
        }
    };
    let headers = create_session(&auth).await?;
    Ok(SignedIn {
        headers,
        user: auth.user,
        bootstrap,
    })
}

/// Register the admin account.
///
/// `status` is the result of [`registration_status`]; when it disallows
/// sign-up the request is refused without contacting the backend.
pub async fn sign_up(
    backend: &dyn Backend,
    status: &RegistrationCheck,
    email: &str,
    password: &str,
) -> Result<SignUpOutcome, CoordinationError> {
    if !status.allowed {
        return Err(CoordinationError::RegistrationClosed.log());
    }

    match backend.sign_up(email.trim(), password).await? {
        SignUpResponse::Unconfirmed(user) => {
            tracing::info!("Sign-up awaiting email confirmation for user {}", user.id);
            Ok(SignUpOutcome::ConfirmationRequired)
        }
        SignUpResponse::Session(auth) => {
            tracing::info!("Signed up admin user {}", auth.user.id);
            Ok(SignUpOutcome::SignedIn(start_session(backend, auth).await?))
        }
    }
}

/// Sign in with email and password; backend errors carry the provider's text
pub async fn sign_in(
    backend: &dyn Backend,
    email: &str,
    password: &str,
) -> Result<SignedIn, CoordinationError> {
    let auth = backend.sign_in_with_password(email.trim(), password).await?;
    tracing::info!("Signed in user {}", auth.user.id);
    start_session(backend, auth).await
}

/// End the session and revoke its backend token (best effort)
pub async fn sign_out(backend: &dyn Backend, cookies: Cookie) -> Result<HeaderMap, CoordinationError> {
    let (headers, access_token) = prepare_logout_response(cookies).await?;
    if let Some(token) = access_token {
        if let Err(e) = backend.sign_out(&token).await {
            tracing::warn!("Failed to revoke backend token on sign-out: {}", e);
        }
    }
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, InMemoryBackend};
    use crate::session::get_user_from_session;
    use crate::test_utils::{CountingBackend, session_id_from};
    use serial_test::serial;

    #[tokio::test]
    async fn test_empty_portfolio_allows_registration() {
        // Given a backend with no profiles
        let backend = InMemoryBackend::new(true);

        // When checking registration
        let status = registration_status(&backend).await;

        // Then sign-up is allowed by the predicate
        assert!(status.allowed);
        assert_eq!(status.source, RegistrationSource::Predicate);
        assert_eq!(count_admins(&backend).await, 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_registration_closes_after_first_admin() {
        // Given an admin who signed up
        let backend = InMemoryBackend::new(true);
        let status = registration_status(&backend).await;
        sign_up(&backend, &status, "jane@site.dev", "password123")
            .await
            .unwrap();

        // When checking again
        let status = registration_status(&backend).await;

        // Then the predicate disallows further sign-ups
        assert!(!status.allowed);
        assert_eq!(status.source, RegistrationSource::Predicate);
        assert_eq!(count_admins(&backend).await, 1);
    }

    #[tokio::test]
    #[serial]
    async fn test_predicate_failure_falls_back_to_profile_count() {
        // Given a seeded install where the predicate is unavailable
        let backend = InMemoryBackend::with_sample_data(true);
        backend.set_failing(BackendOp::Rpc, true).await;

        // Then the owner-less sample profile does not close registration
        let status = registration_status(&backend).await;
        assert!(status.allowed);
        assert_eq!(status.source, RegistrationSource::ProfileCount);
        assert_eq!(count_admins(&backend).await, 0);

        // And once the first admin exists the fallback closes it
        sign_up(&backend, &status, "jane@site.dev", "password123")
            .await
            .unwrap();
        let status = registration_status(&backend).await;
        assert!(!status.allowed);
        assert_eq!(status.source, RegistrationSource::ProfileCount);
        assert_eq!(count_admins(&backend).await, 1);
    }

    #[tokio::test]
    async fn test_fallback_count_zero_allows() {
        let backend = InMemoryBackend::new(true);
        backend.set_failing(BackendOp::Rpc, true).await;

        let status = registration_status(&backend).await;

        assert!(status.allowed);
        assert_eq!(status.source, RegistrationSource::ProfileCount);
    }

    #[tokio::test]
    async fn test_both_checks_failing_fails_open() {
        let backend = InMemoryBackend::with_sample_data(true);
        backend.set_failing(BackendOp::Rpc, true).await;
        backend.set_failing(BackendOp::Count, true).await;

        let status = registration_status(&backend).await;

        assert!(status.allowed);
        assert_eq!(status.source, RegistrationSource::FailOpen);
        assert_eq!(count_admins(&backend).await, 0);
    }

    #[tokio::test]
    async fn test_disallowed_sign_up_makes_no_backend_call() {
        // Given a closed registration
        let backend = CountingBackend::new(InMemoryBackend::new(true));
        let status = RegistrationCheck {
            allowed: false,
            source: RegistrationSource::Predicate,
        };

        // When attempting to sign up
        let result = sign_up(&backend, &status, "eve@site.dev", "password123").await;

        // Then the fixed message is returned and the backend was never called
        let err = result.unwrap_err();
        assert!(matches!(err, CoordinationError::RegistrationClosed));
        assert_eq!(
            err.to_string(),
            "Registration is not allowed. This portfolio is in single-user mode and already has an admin user."
        );
        assert_eq!(backend.calls(), 0);
    }

    #[tokio::test]
    async fn test_unconfirmed_sign_up_requires_confirmation() {
        let backend = InMemoryBackend::new(false);
        let status = registration_status(&backend).await;

        let outcome = sign_up(&backend, &status, "jane@site.dev", "password123")
            .await
            .unwrap();

        assert!(matches!(outcome, SignUpOutcome::ConfirmationRequired));
        // No profile is bootstrapped until the first real sign-in
        assert_eq!(count_admins(&backend).await, 0);
    }

    #[tokio::test]
    #[serial]
    async fn test_sign_up_bootstraps_and_starts_session() {
        let backend = InMemoryBackend::new(true);
        let status = registration_status(&backend).await;

        let outcome = sign_up(&backend, &status, "jane@site.dev", "password123")
            .await
            .unwrap();

        let SignUpOutcome::SignedIn(signed_in) = outcome else {
            panic!("expected a session");
        };
        assert!(matches!(
            signed_in.bootstrap,
            Some(BootstrapOutcome::Created(ref p)) if p.name == "jane"
        ));
        let user = get_user_from_session(&session_id_from(&signed_in.headers))
            .await
            .unwrap();
        assert_eq!(user.id, signed_in.user.id);
    }

    #[tokio::test]
    async fn test_sign_in_error_is_verbatim() {
        let backend = InMemoryBackend::new(true);

        let err = sign_in(&backend, "nobody@site.dev", "password123")
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "Invalid login credentials");
    }

    #[tokio::test]
    #[serial]
    async fn test_sign_out_revokes_token() {
        // Given a signed-in admin
        let backend = InMemoryBackend::new(true);
        let status = registration_status(&backend).await;
        let SignUpOutcome::SignedIn(signed_in) =
            sign_up(&backend, &status, "jane@site.dev", "password123")
                .await
                .unwrap()
        else {
            panic!("expected a session");
        };
        let session_id = session_id_from(&signed_in.headers);
        let user = get_user_from_session(&session_id).await.unwrap();

        // When signing out
        let cookies = crate::test_utils::session_cookie(&session_id);
        sign_out(&backend, cookies).await.unwrap();

        // Then both the session and the backend token are gone
        assert!(get_user_from_session(&session_id).await.is_err());
        assert!(backend.get_user(&user.access_token).await.is_err());
    }
}
