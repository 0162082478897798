mod admin;
mod editor;
mod public;
mod router;
mod views;

use askama::Template;
use axum::{http::StatusCode, response::Html};

pub(crate) use public::not_found;
pub(crate) use router::{admin_router, public_router};

pub(crate) fn render<T: Template>(template: &T) -> Result<Html<String>, (StatusCode, String)> {
    template.render().map(Html).map_err(|e| {
        tracing::error!("Failed to render template: {}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
    })
}
