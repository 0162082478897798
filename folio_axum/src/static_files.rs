use axum::{
    body::Body,
    http::{StatusCode, header::CACHE_CONTROL, header::CONTENT_TYPE},
    response::Response,
};

use crate::IntoResponseError;

const FOLIO_CSS: &str = include_str!("../static/folio.css");

pub(crate) async fn serve_folio_css() -> Result<Response, (StatusCode, String)> {
    Response::builder()
        .status(StatusCode::OK)
        .header(CONTENT_TYPE, "text/css")
        .header(CACHE_CONTROL, "public, max-age=3600")
        .body(Body::from(FOLIO_CSS))
        .into_response_error()
}
