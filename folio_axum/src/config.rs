//! URLs the axum layer redirects to

use std::sync::LazyLock;

use folio::FOLIO_ADMIN_PREFIX;

/// Where anonymous GET requests to protected pages are sent
/// Default: the admin login page, "{FOLIO_ADMIN_PREFIX}"
pub static FOLIO_REDIRECT_ANON: LazyLock<String> = LazyLock::new(|| {
    std::env::var("FOLIO_REDIRECT_ANON").unwrap_or_else(|_| FOLIO_ADMIN_PREFIX.to_string())
});

/// Path of an admin page, e.g. `admin_url("/signin")` is "/admin/signin"
pub(crate) fn admin_url(path: &str) -> String {
    join_prefix(FOLIO_ADMIN_PREFIX.as_str(), path)
}

fn join_prefix(prefix: &str, path: &str) -> String {
    match path {
        "" | "/" => prefix.to_string(),
        _ => format!("{prefix}{path}"),
    }
}

/// Dashboard URL for a tab, with an optional notice shown above it
pub(crate) fn dashboard_url(tab: &str, notice: Option<&str>) -> String {
    let mut url = format!("{}?tab={}", admin_url("/"), urlencoding::encode(tab));
    if let Some(notice) = notice {
        url.push_str("&notice=");
        url.push_str(&urlencoding::encode(notice));
    }
    url
}
