use super::errors::CoordinationError;
use super::fetch::{fetch, fetch_or_empty};
use crate::backend::{Backend, Query};
use crate::portfolio::{
    BlogPost, Experience, Profile, Project, SiteSettings, TABLE_BLOG_POSTS, TABLE_EXPERIENCES,
    TABLE_PROFILES, TABLE_PROJECTS, TABLE_SITE_SETTINGS, TABLE_TECHNOLOGIES, Technology,
};

const RECENT_POSTS: usize = 3;
const DEFAULT_CATEGORY: &str = "other";

#[derive(Debug, Clone, PartialEq)]
pub struct TechnologyGroup {
    pub category: String,
    pub technologies: Vec<Technology>,
}

#[derive(Debug, Clone, Default)]
pub struct HomePage {
    pub profile: Option<Profile>,
    pub projects: Vec<Project>,
    pub featured_projects: Vec<Project>,
    pub recent_posts: Vec<BlogPost>,
    pub technology_groups: Vec<TechnologyGroup>,
    pub experiences: Vec<Experience>,
}

impl HomePage {
    /// Whether the "view all projects" link is worth showing
    pub fn has_more_projects(&self) -> bool {
        self.projects.len() > self.featured_projects.len()
    }
}

/// The first site-settings row, if readable
pub async fn site_settings(backend: &dyn Backend) -> Option<SiteSettings> {
    match fetch::<SiteSettings>(backend, &Query::from(TABLE_SITE_SETTINGS).limit(1), None).await {
        Ok(rows) => rows.into_iter().next(),
        Err(e) => {
            tracing::error!("Error fetching site settings: {}", e);
            None
        }
    }
}

/// Group technologies by category, keeping the order in which categories first appear
pub fn group_by_category(technologies: Vec<Technology>) -> Vec<TechnologyGroup> {
    let mut groups: Vec<TechnologyGroup> = Vec::new();
    for tech in technologies {
        let category = tech
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY)
            .to_string();
        match groups.iter_mut().find(|g| g.category == category) {
            Some(group) => group.technologies.push(tech),
            None => groups.push(TechnologyGroup {
                category,
                technologies: vec![tech],
            }),
        }
    }
    groups
}

pub async fn home_page(backend: &dyn Backend) -> HomePage {
    let settings = site_settings(backend).await;

    let mut profile_query = Query::from(TABLE_PROFILES);
    if let Some(user_id) = settings.as_ref().and_then(SiteSettings::pinned_user) {
        profile_query = profile_query.eq("user_id", user_id);
    }
    let profile = fetch_or_empty::<Profile>(
        backend,
        &profile_query.order("created_at", true).limit(1),
        None,
    )
    .await
    .into_iter()
    .next();

    let projects: Vec<Project> = fetch_or_empty(
        backend,
        &Query::from(TABLE_PROJECTS).order("created_at", false),
        None,
    )
    .await;
    let featured_projects = projects.iter().filter(|p| p.featured).cloned().collect();

    let recent_posts = fetch_or_empty(
        backend,
        &Query::from(TABLE_BLOG_POSTS)
            .eq("published", true)
            .order("created_at", false)
            .limit(RECENT_POSTS),
        None,
    )
    .await;

    let technologies = fetch_or_empty(
        backend,
        &Query::from(TABLE_TECHNOLOGIES).order("proficiency", false),
        None,
    )
    .await;

    let experiences = fetch_or_empty(
        backend,
        &Query::from(TABLE_EXPERIENCES).order("start_date", false),
        None,
    )
    .await;

    HomePage {
        profile,
        projects,
        featured_projects,
        recent_posts,
        technology_groups: group_by_category(technologies),
        experiences,
    }
}

pub async fn list_projects(backend: &dyn Backend) -> Vec<Project> {
    fetch_or_empty(
        backend,
        &Query::from(TABLE_PROJECTS).order("created_at", false),
        None,
    )
    .await
}

fn published_posts(settings: Option<&SiteSettings>) -> Query {
    let query = Query::from(TABLE_BLOG_POSTS).eq("published", true);
    match settings.and_then(SiteSettings::pinned_user) {
        Some(user_id) => query.eq("user_id", user_id),
        None => query,
    }
}

/// Published posts, newest first; only the primary admin's in single-user mode
pub async fn list_blog_posts(backend: &dyn Backend) -> Vec<BlogPost> {
    let settings = site_settings(backend).await;
    fetch_or_empty(
        backend,
        &published_posts(settings.as_ref()).order("created_at", false),
        None,
    )
    .await
}

/// A published post by slug
pub async fn find_blog_post(
    backend: &dyn Backend,
    slug: &str,
) -> Result<BlogPost, CoordinationError> {
    let settings = site_settings(backend).await;
    let posts: Vec<BlogPost> = fetch(
        backend,
        &published_posts(settings.as_ref()).eq("slug", slug).limit(1),
        None,
    )
    .await?;

    posts
        .into_iter()
        .next()
        .ok_or_else(|| CoordinationError::ResourceNotFound {
            resource_type: "blog post".to_string(),
            resource_id: slug.to_string(),
        })
}
