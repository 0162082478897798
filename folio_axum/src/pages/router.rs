use axum::{
    Router,
    routing::{get, post},
};

use crate::static_files::serve_folio_css;

/// Routes of the public site
pub(crate) fn public_router() -> Router<()> {
    Router::new()
        .route("/", get(super::public::home))
        .route("/projects", get(super::public::projects))
        .route("/blog", get(super::public::blog))
        .route("/blog/{slug}", get(super::public::blog_post))
        .route("/static/folio.css", get(serve_folio_css))
}

/// Routes of the admin console, relative to the admin prefix
pub(crate) fn admin_router() -> Router<()> {
    Router::new()
        .route("/", get(super::admin::index))
        .route("/signin", post(super::admin::signin))
        .route("/signup", post(super::admin::signup))
        .route("/signout", post(super::admin::signout))
        .route("/profile", post(super::admin::post_profile))
        .route("/projects", post(super::admin::post_project))
        .route("/blog", post(super::admin::post_blog_post))
        .route("/technologies", post(super::admin::post_technology))
        .route("/experiences", post(super::admin::post_experience))
        .route("/{kind}/{id}/delete", post(super::admin::post_delete))
}
