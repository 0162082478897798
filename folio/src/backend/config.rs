use std::{env, sync::LazyLock};

/// "memory" (in-process stand-in) or "rest" (hosted Supabase-compatible project)
pub(super) static FOLIO_BACKEND_TYPE: LazyLock<String> =
    LazyLock::new(|| env::var("FOLIO_BACKEND_TYPE").unwrap_or_else(|_| "memory".to_string()));

pub(super) static FOLIO_BACKEND_URL: LazyLock<String> =
    LazyLock::new(|| env::var("FOLIO_BACKEND_URL").unwrap_or_default());

pub(super) static FOLIO_BACKEND_ANON_KEY: LazyLock<String> =
    LazyLock::new(|| env::var("FOLIO_BACKEND_ANON_KEY").unwrap_or_default());

pub(super) static FOLIO_BACKEND_TIMEOUT_SECS: LazyLock<u64> = LazyLock::new(|| {
    env::var("FOLIO_BACKEND_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(30)
});

pub(super) static FOLIO_MEMORY_AUTOCONFIRM: LazyLock<bool> =
    LazyLock::new(|| parse_flag(env::var("FOLIO_MEMORY_AUTOCONFIRM").ok(), true));

pub(super) static FOLIO_MEMORY_SEED_SAMPLE: LazyLock<bool> =
    LazyLock::new(|| parse_flag(env::var("FOLIO_MEMORY_SEED_SAMPLE").ok(), true));

fn parse_flag(value: Option<String>, default: bool) -> bool {
    match value.as_deref().map(str::trim) {
        Some("true" | "1" | "yes") => true,
        Some("false" | "0" | "no") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(Some("true".to_string()), false));
        assert!(parse_flag(Some(" 1 ".to_string()), false));
        assert!(!parse_flag(Some("false".to_string()), true));
        assert!(!parse_flag(Some("no".to_string()), true));
        assert!(parse_flag(None, true));
        assert!(!parse_flag(Some("maybe".to_string()), false));
    }

    #[test]
    fn test_timeout_parsing_fallback() {
        let original_value = env::var("FOLIO_BACKEND_TIMEOUT_SECS").ok();

        unsafe {
            env::set_var("FOLIO_BACKEND_TIMEOUT_SECS", "not-a-number");
        }

        let timeout: u64 = env::var("FOLIO_BACKEND_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);
        assert_eq!(timeout, 30);

        unsafe {
            if let Some(value) = original_value {
                env::set_var("FOLIO_BACKEND_TIMEOUT_SECS", value);
            } else {
                env::remove_var("FOLIO_BACKEND_TIMEOUT_SECS");
            }
        }
    }
}
