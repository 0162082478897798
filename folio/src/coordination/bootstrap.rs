use serde_json::json;

use super::errors::CoordinationError;
use super::sample::has_sample_data;
use crate::backend::{AuthSession, Backend, Filter, Query};
use crate::portfolio::{
    CONTENT_TABLES, PortfolioError, Profile, SiteSettings, TABLE_PROFILES, TABLE_SITE_SETTINGS,
};

#[derive(Debug, Clone, PartialEq)]
pub enum BootstrapOutcome {
    /// The user already had a profile; nothing was written
    Existing(Profile),
    /// A profile was created for the user on this sign-in
    Created(Profile),
}

impl BootstrapOutcome {
    pub fn profile(&self) -> &Profile {
        match self {
            Self::Existing(p) | Self::Created(p) => p,
        }
    }
}

/// Initial profile name: the part of the address before '@'
fn display_name(email: &str) -> &str {
    email.split_once('@').map(|(local, _)| local).unwrap_or(email)
}

/// Make sure the signed-in user owns a profile.
///
/// The first sign-in of a user creates it from the email address; later
/// sign-ins find it and change nothing. Creating the first profile also
/// clears any sample data and claims the site settings for the user.
pub async fn on_signed_in(
    backend: &dyn Backend,
    auth: &AuthSession,
) -> Result<BootstrapOutcome, CoordinationError> {
    let user_id = auth.user.id.as_str();
    let token = Some(auth.access_token.as_str());

    let rows = backend
        .select(
            &Query::from(TABLE_PROFILES).eq("user_id", user_id).limit(1),
            token,
        )
        .await?;
    if let Some(row) = rows.into_iter().next() {
        tracing::debug!("Profile already exists for user {}", user_id);
        let profile: Profile = serde_json::from_value(row).map_err(PortfolioError::from)?;
        return Ok(BootstrapOutcome::Existing(profile));
    }

    let sample_present = has_sample_data(backend).await;

    let email = auth.user.email.clone().unwrap_or_default();
    let row = backend
        .insert(
            TABLE_PROFILES,
            json!({
                "user_id": user_id,
                "name": display_name(&email),
                "email": email,
            }),
            token,
        )
        .await?;
    let profile: Profile = serde_json::from_value(row).map_err(PortfolioError::from)?;
    tracing::info!("Created profile {} for user {}", profile.id, user_id);

    if sample_present {
        let removed = replace_sample_data(backend, auth).await;
        tracing::info!("Replaced sample data ({} rows removed)", removed);
    }
    claim_site_settings(backend, auth).await;

    Ok(BootstrapOutcome::Created(profile))
}

/// Delete the owner-less rows of every content table; returns how many were removed
async fn replace_sample_data(backend: &dyn Backend, auth: &AuthSession) -> usize {
    let token = Some(auth.access_token.as_str());
    let mut removed = 0;

    for table in CONTENT_TABLES {
        let rows = match backend
            .select(&Query::from(table).filter(Filter::is_null("user_id")), token)
            .await
        {
            Ok(rows) => rows,
            Err(e) => {
                tracing::error!("Failed to list sample rows in {}: {}", table, e);
                continue;
            }
        };

        for id in rows.iter().filter_map(|row| row.get("id").and_then(|v| v.as_str())) {
            match backend.delete(table, id, token).await {
                Ok(()) => removed += 1,
                Err(e) => tracing::error!("Failed to delete sample row {}/{}: {}", table, id, e),
            }
        }
    }
    removed
}

/// Pin single-user mode to the new admin when no primary user is set yet
async fn claim_site_settings(backend: &dyn Backend, auth: &AuthSession) {
    let token = Some(auth.access_token.as_str());
    let query = Query::from(TABLE_SITE_SETTINGS)
        .eq("single_user_mode", true)
        .filter(Filter::is_null("primary_user_id"))
        .limit(1);

    let settings = match backend.select(&query, token).await {
        Ok(rows) => rows
            .into_iter()
            .next()
            .and_then(|row| serde_json::from_value::<SiteSettings>(row).ok()),
        Err(e) => {
            tracing::error!("Failed to read site settings: {}", e);
            return;
        }
    };

    let Some(settings) = settings else {
        return;
    };
    match backend
        .update(
            TABLE_SITE_SETTINGS,
            &settings.id,
            json!({ "primary_user_id": auth.user.id }),
            token,
        )
        .await
    {
        Ok(_) => tracing::info!("Site settings now pinned to user {}", auth.user.id),
        Err(e) => tracing::error!("Failed to claim site settings: {}", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, InMemoryBackend, SignUpResponse};
    use crate::portfolio::{TABLE_PROJECTS, TABLE_TECHNOLOGIES};

    async fn auth(backend: &InMemoryBackend, email: &str) -> AuthSession {
        match backend.sign_up(email, "password123").await.unwrap() {
            SignUpResponse::Session(s) => s,
            SignUpResponse::Unconfirmed(_) => panic!("expected autoconfirm"),
        }
    }

    #[test]
    fn test_display_name() {
        assert_eq!(display_name("jane.doe@site.dev"), "jane.doe");
        assert_eq!(display_name("no-at-sign"), "no-at-sign");
        assert_eq!(display_name(""), "");
    }

    #[tokio::test]
    async fn test_bootstrap_is_idempotent() {
        // Given a signed-in user without a profile
        let backend = InMemoryBackend::new(true);
        let session = auth(&backend, "jane@site.dev").await;

        // When bootstrapping twice
        let first = on_signed_in(&backend, &session).await.unwrap();
        let second = on_signed_in(&backend, &session).await.unwrap();

        // Then exactly one profile exists, created the first time only
        assert!(matches!(first, BootstrapOutcome::Created(_)));
        assert!(matches!(second, BootstrapOutcome::Existing(_)));
        assert_eq!(first.profile().id, second.profile().id);
        assert_eq!(backend.rows(TABLE_PROFILES).await.len(), 1);
    }

    #[tokio::test]
    async fn test_profile_fields_come_from_email() {
        let backend = InMemoryBackend::new(true);
        let session = auth(&backend, "jane.doe@site.dev").await;

        let outcome = on_signed_in(&backend, &session).await.unwrap();

        let profile = outcome.profile();
        assert_eq!(profile.name, "jane.doe");
        assert_eq!(profile.email.as_deref(), Some("jane.doe@site.dev"));
        assert_eq!(profile.user_id.as_deref(), Some(session.user.id.as_str()));
    }

    #[tokio::test]
    async fn test_first_admin_replaces_sample_data_and_claims_settings() {
        // Given the seeded sample portfolio
        let backend = InMemoryBackend::with_sample_data(true);
        let session = auth(&backend, "jane@site.dev").await;

        // When the first admin signs in
        on_signed_in(&backend, &session).await.unwrap();

        // Then only the admin's profile remains and sample content is gone
        let profiles = backend.rows(TABLE_PROFILES).await;
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0]["name"], "jane");
        assert!(backend.rows(TABLE_PROJECTS).await.is_empty());
        assert!(backend.rows(TABLE_TECHNOLOGIES).await.is_empty());

        // And the settings are pinned to the admin
        let settings = backend.rows(TABLE_SITE_SETTINGS).await;
        assert_eq!(settings[0]["primary_user_id"], session.user.id.as_str());
    }

    #[tokio::test]
    async fn test_sample_cleanup_failure_does_not_block_bootstrap() {
        let backend = InMemoryBackend::with_sample_data(true);
        let session = auth(&backend, "jane@site.dev").await;
        backend.set_failing(BackendOp::Delete, true).await;

        let outcome = on_signed_in(&backend, &session).await.unwrap();

        assert!(matches!(outcome, BootstrapOutcome::Created(_)));
        // The sample profile is still there next to the new one
        assert_eq!(backend.rows(TABLE_PROFILES).await.len(), 2);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_an_error() {
        let backend = InMemoryBackend::new(true);
        let session = auth(&backend, "jane@site.dev").await;
        backend.set_failing(BackendOp::Select, true).await;

        let result = on_signed_in(&backend, &session).await;

        assert!(matches!(result, Err(CoordinationError::BackendError(_))));
        assert!(backend.rows(TABLE_PROFILES).await.is_empty());
    }
}
