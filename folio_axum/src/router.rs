//! Combined router for the public site and the admin console

use axum::Router;
use tower_http::LatencyUnit;
use tower_http::trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer};
use tracing::Level;

use folio::FOLIO_ADMIN_PREFIX;

use crate::pages::{admin_router, not_found, public_router};

/// Create the full site router
///
/// The public pages are served from the root and the admin console is
/// mounted under `FOLIO_ADMIN_PREFIX` (default "/admin"):
/// - `/`, `/projects`, `/blog`, `/blog/{slug}`, `/static/folio.css`
/// - `{FOLIO_ADMIN_PREFIX}`, `{FOLIO_ADMIN_PREFIX}/signin`, ...
///
/// Unknown paths get the site's "not found" page.
pub fn folio_router() -> Router {
    folio_router_no_trace().layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(
                DefaultOnResponse::new()
                    .level(Level::INFO)
                    .latency_unit(LatencyUnit::Millis),
            ),
    )
}

/// Same as [`folio_router`] without the HTTP tracing middleware
pub fn folio_router_no_trace() -> Router {
    public_router()
        .nest(FOLIO_ADMIN_PREFIX.as_str(), admin_router())
        .fallback(not_found)
}
