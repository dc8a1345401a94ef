use std::sync::LazyLock;

/// Base URL of the identity provider (GoTrue-style API).
/// Default: "http://localhost:54321"
pub static IDP_URL: LazyLock<String> = LazyLock::new(|| {
    std::env::var("IDP_URL")
        .map(|url| url.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:54321".to_string())
});

/// Publishable key sent as the `apikey` header on every provider request.
pub static IDP_API_KEY: LazyLock<String> =
    LazyLock::new(|| std::env::var("IDP_API_KEY").unwrap_or_default());

pub static AUTH_ACCESS_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("AUTH_ACCESS_COOKIE_NAME").unwrap_or_else(|_| "rent-access-token".to_string())
});

pub static AUTH_REFRESH_COOKIE_NAME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("AUTH_REFRESH_COOKIE_NAME").unwrap_or_else(|_| "rent-refresh-token".to_string())
});

/// Lifetime of the session cookies in seconds. The access token inside may
/// expire sooner; it is refreshed on demand.
pub static SESSION_COOKIE_MAX_AGE: LazyLock<i64> = LazyLock::new(|| {
    std::env::var("SESSION_COOKIE_MAX_AGE")
        .ok()
        .and_then(|s| s.parse().ok())
        .filter(|age: &i64| *age > 0)
        .unwrap_or(604_800) // 7 days
});
