//! Central configuration for the folio crate

use std::sync::LazyLock;

/// Route prefix for the admin console
///
/// All sign-in, sign-up and record management endpoints are mounted under it.
/// Always starts with '/' and never ends with one; an empty value falls back to the default.
/// Default: "/admin"
pub static FOLIO_ADMIN_PREFIX: LazyLock<String> = LazyLock::new(|| {
    normalize_prefix(&std::env::var("FOLIO_ADMIN_PREFIX").unwrap_or_default())
});

fn normalize_prefix(raw: &str) -> String {
    let trimmed = raw.trim().trim_matches('/');
    if trimmed.is_empty() {
        "/admin".to_string()
    } else {
        format!("/{trimmed}")
    }
}

/// Site name shown in page titles and the footer
pub static FOLIO_SITE_NAME: LazyLock<String> =
    LazyLock::new(|| std::env::var("FOLIO_SITE_NAME").unwrap_or_else(|_| "Portfolio".to_string()));

/// Timezone used when rendering timestamps (e.g. "UTC", "JST", "Europe/Paris")
pub static FOLIO_DISPLAY_TIMEZONE: LazyLock<String> = LazyLock::new(|| {
    std::env::var("FOLIO_DISPLAY_TIMEZONE").unwrap_or_else(|_| "UTC".to_string())
});
