use askama::Template;
use axum::{
    extract::Path,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use folio::{
    FOLIO_SITE_NAME, backend, find_blog_post, home_page, list_blog_posts, list_projects,
    site_settings,
};

use super::render;
use super::views::{
    ExperienceView, PostView, ProfileView, ProjectView, TechnologyGroupView, views,
};
use crate::config::admin_url;

/// Header fields every public page shares
struct Chrome {
    site_name: String,
    admin_url: String,
}

async fn chrome() -> Chrome {
    let configured = site_settings(backend().as_ref())
        .await
        .and_then(|s| s.site_name)
        .filter(|name| !name.trim().is_empty());
    Chrome {
        site_name: configured.unwrap_or_else(|| FOLIO_SITE_NAME.to_string()),
        admin_url: admin_url("/"),
    }
}

#[derive(Template)]
#[template(path = "home.j2", escape = "html")]
struct HomeTemplate {
    site_name: String,
    admin_url: String,
    profile: Option<ProfileView>,
    featured_projects: Vec<ProjectView>,
    show_all_projects: bool,
    technology_groups: Vec<TechnologyGroupView>,
    experiences: Vec<ExperienceView>,
    recent_posts: Vec<PostView>,
}

pub(super) async fn home() -> Result<Html<String>, (StatusCode, String)> {
    let Chrome {
        site_name,
        admin_url,
    } = chrome().await;
    let page = home_page(backend().as_ref()).await;

    render(&HomeTemplate {
        site_name,
        admin_url,
        profile: page.profile.as_ref().map(ProfileView::from),
        show_all_projects: page.has_more_projects(),
        featured_projects: views(&page.featured_projects),
        technology_groups: views(&page.technology_groups),
        experiences: views(&page.experiences),
        recent_posts: views(&page.recent_posts),
    })
}

#[derive(Template)]
#[template(path = "projects.j2", escape = "html")]
struct ProjectsTemplate {
    site_name: String,
    admin_url: String,
    projects: Vec<ProjectView>,
}

pub(super) async fn projects() -> Result<Html<String>, (StatusCode, String)> {
    let Chrome {
        site_name,
        admin_url,
    } = chrome().await;
    let projects = list_projects(backend().as_ref()).await;

    render(&ProjectsTemplate {
        site_name,
        admin_url,
        projects: views(&projects),
    })
}

#[derive(Template)]
#[template(path = "blog.j2", escape = "html")]
struct BlogTemplate {
    site_name: String,
    admin_url: String,
    posts: Vec<PostView>,
}

pub(super) async fn blog() -> Result<Html<String>, (StatusCode, String)> {
    let Chrome {
        site_name,
        admin_url,
    } = chrome().await;
    let posts = list_blog_posts(backend().as_ref()).await;

    render(&BlogTemplate {
        site_name,
        admin_url,
        posts: views(&posts),
    })
}

#[derive(Template)]
#[template(path = "blog_post.j2", escape = "html")]
struct BlogPostTemplate {
    site_name: String,
    admin_url: String,
    post: PostView,
}

pub(super) async fn blog_post(Path(slug): Path<String>) -> Result<Response, (StatusCode, String)> {
    let chrome = chrome().await;
    match find_blog_post(backend().as_ref(), &slug).await {
        Ok(post) => Ok(render(&BlogPostTemplate {
            site_name: chrome.site_name,
            admin_url: chrome.admin_url,
            post: PostView::from(&post),
        })?
        .into_response()),
        Err(e) => {
            tracing::debug!("Blog post {} not shown: {}", slug, e);
            not_found_page(chrome, "Blog post not found")
        }
    }
}

#[derive(Template)]
#[template(path = "not_found.j2", escape = "html")]
struct NotFoundTemplate<'a> {
    site_name: String,
    admin_url: String,
    message: &'a str,
}

fn not_found_page(chrome: Chrome, message: &str) -> Result<Response, (StatusCode, String)> {
    let html = render(&NotFoundTemplate {
        site_name: chrome.site_name,
        admin_url: chrome.admin_url,
        message,
    })?;
    Ok((StatusCode::NOT_FOUND, html).into_response())
}

pub(crate) async fn not_found() -> Result<Response, (StatusCode, String)> {
    not_found_page(chrome().await, "Page not found")
}
