use crate::backend::{Backend, Filter, Query};
use crate::portfolio::TABLE_PROFILES;

const SAMPLE_PROFILE_NAME: &str = "John Doe";
const SAMPLE_EMAIL_DOMAIN: &str = "example.com";

/// Whether the placeholder portfolio is still in place.
///
/// Any lookup failure counts as "no sample data".
pub async fn has_sample_data(backend: &dyn Backend) -> bool {
    let query = Query::from(TABLE_PROFILES)
        .eq("name", SAMPLE_PROFILE_NAME)
        .filter(Filter::contains("email", SAMPLE_EMAIL_DOMAIN))
        .limit(1);

    match backend.select(&query, None).await {
        Ok(rows) => !rows.is_empty(),
        Err(e) => {
            tracing::error!("Error checking for sample data: {}", e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, InMemoryBackend, SignUpResponse};
    use serde_json::json;

    #[tokio::test]
    async fn test_detects_seeded_sample() {
        let backend = InMemoryBackend::with_sample_data(true);
        assert!(has_sample_data(&backend).await);
    }

    #[tokio::test]
    async fn test_empty_backend_has_no_sample() {
        let backend = InMemoryBackend::new(true);
        assert!(!has_sample_data(&backend).await);
    }

    #[tokio::test]
    async fn test_requires_both_name_and_domain() {
        // Given profiles matching only one half of the rule
        let backend = InMemoryBackend::new(true);
        let SignUpResponse::Session(session) =
            backend.sign_up("a@site.dev", "password123").await.unwrap()
        else {
            panic!("expected autoconfirm");
        };
        let token = Some(session.access_token.as_str());
        backend
            .insert(
                TABLE_PROFILES,
                json!({ "name": "John Doe", "email": "john@real.dev" }),
                token,
            )
            .await
            .unwrap();
        backend
            .insert(
                TABLE_PROFILES,
                json!({ "name": "Jane Roe", "email": "jane@example.com" }),
                token,
            )
            .await
            .unwrap();

        // Then neither counts as sample data
        assert!(!has_sample_data(&backend).await);
    }

    #[tokio::test]
    async fn test_lookup_error_means_no_sample() {
        let backend = InMemoryBackend::with_sample_data(true);
        backend.set_failing(BackendOp::Select, true).await;

        assert!(!has_sample_data(&backend).await);
    }
}
