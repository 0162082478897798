use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use http::header::{HeaderMap, SET_COOKIE};
use ring::rand::SecureRandom;
use std::{collections::HashMap, sync::LazyLock};
use thiserror::Error;

use crate::config::FOLIO_DISPLAY_TIMEZONE;

#[derive(Debug, Error, Clone)]
pub enum UtilError {
    #[error("Crypto error: {0}")]
    Crypto(String),

    #[error("Cookie error: {0}")]
    Cookie(String),
}

pub(crate) fn base64url_encode(input: Vec<u8>) -> Result<String, UtilError> {
    Ok(URL_SAFE_NO_PAD.encode(input))
}

pub fn gen_random_string(len: usize) -> Result<String, UtilError> {
    let rng = ring::rand::SystemRandom::new();
    let mut bytes = vec![0u8; len];
    rng.fill(&mut bytes)
        .map_err(|_| UtilError::Crypto("Failed to generate random string".to_string()))?;
    let encoded = base64url_encode(bytes)
        .map_err(|_| UtilError::Crypto("Failed to encode random string".to_string()))?;
    Ok(encoded)
}

pub(crate) fn header_set_cookie<'a>(
    headers: &'a mut HeaderMap,
    name: &str,
    value: &str,
    max_age: i64,
) -> Result<&'a HeaderMap, UtilError> {
    let cookie = format!("{name}={value}; SameSite=Lax; Secure; HttpOnly; Path=/; Max-Age={max_age}");
    tracing::trace!("Set-Cookie: {}", cookie);
    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| UtilError::Cookie("Failed to parse cookie".to_string()))?,
    );
    Ok(headers)
}

static TIMEZONE_ALIASES: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("JST", "Asia/Tokyo"),
        ("EST", "America/New_York"),
        ("CST", "America/Chicago"),
        ("MST", "America/Denver"),
        ("PST", "America/Los_Angeles"),
        ("CET", "Europe/Paris"),
        ("EET", "Europe/Helsinki"),
        ("UTC", "Etc/UTC"),
    ])
});

fn resolve_timezone(name: &str) -> Tz {
    let iana = TIMEZONE_ALIASES.get(name).copied().unwrap_or(name);
    iana.parse::<Tz>().unwrap_or(Tz::UTC)
}

/// Format a timestamp as a calendar date in the configured display timezone
///
/// e.g. "March 4, 2025"
pub fn format_date(date: &DateTime<Utc>) -> String {
    format_date_in(date, FOLIO_DISPLAY_TIMEZONE.as_str())
}

pub(crate) fn format_date_in(date: &DateTime<Utc>, timezone_name: &str) -> String {
    let local_time = date.with_timezone(&resolve_timezone(timezone_name));
    local_time.format("%B %-d, %Y").to_string()
}
