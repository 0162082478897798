use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::errors::CoordinationError;
use super::fetch::{fetch, fetch_or_empty};
use crate::backend::{Backend, Query};
use crate::portfolio::{
    BlogPost, BlogPostForm, Experience, ExperienceForm, Profile, ProfileForm, Project,
    ProjectForm, RecordKind, TABLE_BLOG_POSTS, TABLE_EXPERIENCES, TABLE_PROFILES, TABLE_PROJECTS,
    TABLE_TECHNOLOGIES, Technology, TechnologyForm,
};
use crate::session::SessionUser;

/// Everything the signed-in admin owns, for the console
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub profile: Option<Profile>,
    pub projects: Vec<Project>,
    pub blog_posts: Vec<BlogPost>,
    pub technologies: Vec<Technology>,
    pub experiences: Vec<Experience>,
}

pub async fn load_dashboard(backend: &dyn Backend, user: &SessionUser) -> Dashboard {
    let token = Some(user.access_token.as_str());
    let owned = |table: &str| Query::from(table).eq("user_id", user.id.as_str());

    let profile = fetch_or_empty::<Profile>(backend, &owned(TABLE_PROFILES).limit(1), token)
        .await
        .into_iter()
        .next();

    Dashboard {
        profile,
        projects: fetch_or_empty(backend, &owned(TABLE_PROJECTS).order("created_at", false), token)
            .await,
        blog_posts: fetch_or_empty(
            backend,
            &owned(TABLE_BLOG_POSTS).order("created_at", false),
            token,
        )
        .await,
        technologies: fetch_or_empty(backend, &owned(TABLE_TECHNOLOGIES).order("name", true), token)
            .await,
        experiences: fetch_or_empty(
            backend,
            &owned(TABLE_EXPERIENCES).order("start_date", false),
            token,
        )
        .await,
    }
}

/// Insert or update one record; backend failures become the fixed "Error saving ..." alert
async fn save_record<T: DeserializeOwned>(
    backend: &dyn Backend,
    user: &SessionUser,
    kind: RecordKind,
    id: Option<&str>,
    payload: Value,
) -> Result<T, CoordinationError> {
    let token = Some(user.access_token.as_str());
    let result = match id {
        Some(id) => backend.update(kind.table(), id, payload, token).await,
        None => backend.insert(kind.table(), payload, token).await,
    };

    let row = result.map_err(|e| {
        CoordinationError::SaveFailed {
            kind,
            reason: e.to_string(),
        }
        .log()
    })?;

    let id = row.get("id").and_then(Value::as_str).unwrap_or("?");
    tracing::info!("Saved {} {} for user {}", kind, id, user.id);
    serde_json::from_value(row).map_err(|e| {
        CoordinationError::SaveFailed {
            kind,
            reason: e.to_string(),
        }
        .log()
    })
}

/// Save the admin's profile, creating it when the admin has none yet
pub async fn save_profile(
    backend: &dyn Backend,
    user: &SessionUser,
    form: &ProfileForm,
) -> Result<Profile, CoordinationError> {
    let payload = form.payload(&user.id, Utc::now())?;
    let existing: Vec<Profile> = fetch(
        backend,
        &Query::from(TABLE_PROFILES).eq("user_id", user.id.as_str()).limit(1),
        Some(&user.access_token),
    )
    .await
    .map_err(|e| {
        CoordinationError::SaveFailed {
            kind: RecordKind::Profile,
            reason: e.to_string(),
        }
        .log()
    })?;

    let id = existing.first().map(|p| p.id.as_str());
    save_record(backend, user, RecordKind::Profile, id, payload).await
}

pub async fn save_project(
    backend: &dyn Backend,
    user: &SessionUser,
    form: &ProjectForm,
) -> Result<Project, CoordinationError> {
    let payload = form.payload(&user.id, Utc::now())?;
    save_record(backend, user, RecordKind::Project, form.record_id(), payload).await
}

pub async fn save_blog_post(
    backend: &dyn Backend,
    user: &SessionUser,
    form: &BlogPostForm,
) -> Result<BlogPost, CoordinationError> {
    let payload = form.payload(&user.id, Utc::now())?;
    save_record(backend, user, RecordKind::BlogPost, form.record_id(), payload).await
}

pub async fn save_technology(
    backend: &dyn Backend,
    user: &SessionUser,
    form: &TechnologyForm,
) -> Result<Technology, CoordinationError> {
    let payload = form.payload(&user.id)?;
    save_record(backend, user, RecordKind::Technology, form.record_id(), payload).await
}

pub async fn save_experience(
    backend: &dyn Backend,
    user: &SessionUser,
    form: &ExperienceForm,
) -> Result<Experience, CoordinationError> {
    let payload = form.payload(&user.id)?;
    save_record(backend, user, RecordKind::Experience, form.record_id(), payload).await
}

pub async fn delete_record(
    backend: &dyn Backend,
    user: &SessionUser,
    kind: RecordKind,
    id: &str,
) -> Result<(), CoordinationError> {
    backend
        .delete(kind.table(), id, Some(&user.access_token))
        .await
        .map_err(|e| {
            CoordinationError::DeleteFailed {
                reason: format!("{kind} {id}: {e}"),
            }
            .log()
        })?;
    tracing::info!("Deleted {} {} for user {}", kind, id, user.id);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BackendOp, InMemoryBackend, SignUpResponse};

    async fn admin(backend: &InMemoryBackend) -> SessionUser {
        let SignUpResponse::Session(session) = backend
            .sign_up("jane@site.dev", "password123")
            .await
            .unwrap()
        else {
            panic!("expected autoconfirm");
        };
        SessionUser {
            id: session.user.id,
            email: "jane@site.dev".to_string(),
            access_token: session.access_token,
            csrf_token: "csrf".to_string(),
        }
    }

    fn project(title: &str) -> ProjectForm {
        ProjectForm {
            title: title.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_save_profile_inserts_then_updates() {
        // Given an admin without a profile
        let backend = InMemoryBackend::new(true);
        let user = admin(&backend).await;
        let mut form = ProfileForm {
            name: "Jane".to_string(),
            ..Default::default()
        };

        // When saving twice
        let first = save_profile(&backend, &user, &form).await.unwrap();
        form.title = "Engineer".to_string();
        let second = save_profile(&backend, &user, &form).await.unwrap();

        // Then the same profile is updated in place
        assert_eq!(first.id, second.id);
        assert_eq!(second.title.as_deref(), Some("Engineer"));
        assert_eq!(backend.rows(TABLE_PROFILES).await.len(), 1);
    }

    #[tokio::test]
    async fn test_dashboard_only_shows_own_records_in_order() {
        // Given sample rows plus two projects of the admin
        let backend = InMemoryBackend::with_sample_data(true);
        let user = admin(&backend).await;
        save_project(&backend, &user, &project("Older")).await.unwrap();
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
        save_project(&backend, &user, &project("Newer")).await.unwrap();

        // When loading the dashboard
        let dashboard = load_dashboard(&backend, &user).await;

        // Then only the admin's records appear, newest first
        let titles: Vec<&str> = dashboard.projects.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["Newer", "Older"]);
        assert!(dashboard.profile.is_none());
        assert!(dashboard.technologies.is_empty());
    }

    #[tokio::test]
    async fn test_update_existing_project() {
        let backend = InMemoryBackend::new(true);
        let user = admin(&backend).await;
        let created = save_project(&backend, &user, &project("Draft")).await.unwrap();

        let mut form = ProjectForm::from(&created);
        form.title = "Final".to_string();
        let updated = save_project(&backend, &user, &form).await.unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(updated.title, "Final");
        assert_eq!(backend.rows(TABLE_PROJECTS).await.len(), 1);
    }

    #[tokio::test]
    async fn test_save_failure_uses_fixed_alert() {
        let backend = InMemoryBackend::new(true);
        let user = admin(&backend).await;
        backend.set_failing(BackendOp::Insert, true).await;

        let cases: Vec<(CoordinationError, &str)> = vec![
            (
                save_project(&backend, &user, &project("x")).await.unwrap_err(),
                "Error saving project",
            ),
            (
                save_blog_post(
                    &backend,
                    &user,
                    &BlogPostForm {
                        title: "Hello".to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err(),
                "Error saving blog post",
            ),
            (
                save_technology(
                    &backend,
                    &user,
                    &TechnologyForm {
                        name: "Rust".to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err(),
                "Error saving technology",
            ),
            (
                save_experience(
                    &backend,
                    &user,
                    &ExperienceForm {
                        company: "Acme".to_string(),
                        position: "Dev".to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err(),
                "Error saving experience",
            ),
            (
                save_profile(
                    &backend,
                    &user,
                    &ProfileForm {
                        name: "Jane".to_string(),
                        ..Default::default()
                    },
                )
                .await
                .unwrap_err(),
                "Error saving profile",
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.to_string(), expected);
        }
    }

    #[tokio::test]
    async fn test_validation_error_is_reported_before_backend() {
        let backend = InMemoryBackend::new(true);
        let user = admin(&backend).await;

        let err = save_project(&backend, &user, &project("  ")).await.unwrap_err();

        assert!(matches!(err, CoordinationError::PortfolioError(_)));
        assert!(backend.rows(TABLE_PROJECTS).await.is_empty());
    }

    #[tokio::test]
    async fn test_delete_record() {
        let backend = InMemoryBackend::new(true);
        let user = admin(&backend).await;
        let created = save_project(&backend, &user, &project("Gone soon"))
            .await
            .unwrap();

        delete_record(&backend, &user, RecordKind::Project, &created.id)
            .await
            .unwrap();
        assert!(backend.rows(TABLE_PROJECTS).await.is_empty());

        backend.set_failing(BackendOp::Delete, true).await;
        let err = delete_record(&backend, &user, RecordKind::Project, "any")
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "Error deleting item");
    }
}
