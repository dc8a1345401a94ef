//! Central configuration for the rent-auth crate
//!
//! Every value is read from the environment once, on first use.

use std::sync::LazyLock;

/// Public origin of the dashboard, used to build the OAuth callback URL.
/// Default: "http://localhost:3001"
pub static ORIGIN: LazyLock<String> = LazyLock::new(|| {
    std::env::var("ORIGIN")
        .map(|origin| origin.trim_end_matches('/').to_string())
        .unwrap_or_else(|_| "http://localhost:3001".to_string())
});

/// Route prefix under which the sign-in, callback and sign-out endpoints are mounted.
/// Default: "/auth"
pub static AUTH_ROUTE_PREFIX: LazyLock<String> =
    LazyLock::new(|| std::env::var("AUTH_ROUTE_PREFIX").unwrap_or_else(|_| "/auth".to_string()));

/// Sign-in entry point. Unauthenticated requests and failed callbacks land here.
pub static AUTH_SIGNIN_PATH: LazyLock<String> =
    LazyLock::new(|| std::env::var("AUTH_SIGNIN_PATH").unwrap_or_else(|_| "/login".to_string()));

/// Role selection page for signed-in users without an application user record.
pub static AUTH_SELECT_ROLE_PATH: LazyLock<String> = LazyLock::new(|| {
    std::env::var("AUTH_SELECT_ROLE_PATH").unwrap_or_else(|_| "/select-role".to_string())
});

pub static AUTH_OWNER_HOME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("AUTH_OWNER_HOME").unwrap_or_else(|_| "/dashboard/owner".to_string())
});

pub static AUTH_TENANT_HOME: LazyLock<String> = LazyLock::new(|| {
    std::env::var("AUTH_TENANT_HOME").unwrap_or_else(|_| "/dashboard/tenant".to_string())
});

/// Path prefixes the route guard protects.
/// Default: "/dashboard,/select-role"
pub static AUTH_PROTECTED_PREFIXES: LazyLock<Vec<String>> =
    LazyLock::new(|| env_prefixes("AUTH_PROTECTED_PREFIXES", "/dashboard,/select-role"));

/// Whether the server-driven callback refuses to exchange a code without a
/// verifier cookie. Only disable this when the provider does not enforce PKCE.
pub static AUTH_SERVER_PKCE_REQUIRED: LazyLock<bool> =
    LazyLock::new(|| env_flag("AUTH_SERVER_PKCE_REQUIRED", true));

/// Absolute URL the identity provider redirects back to.
pub static AUTH_CALLBACK_URL: LazyLock<String> =
    LazyLock::new(|| format!("{}{}/callback", *ORIGIN, *AUTH_ROUTE_PREFIX));

fn env_prefixes(name: &str, default: &str) -> Vec<String> {
    parse_prefixes(&std::env::var(name).unwrap_or_else(|_| default.to_string()))
}

fn env_flag(name: &str, default: bool) -> bool {
    parse_flag(std::env::var(name).ok().as_deref(), default)
}

fn parse_prefixes(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|prefix| prefix.trim().trim_end_matches('/'))
        .filter(|prefix| !prefix.is_empty())
        .map(|prefix| {
            if prefix.starts_with('/') {
                prefix.to_string()
            } else {
                format!("/{prefix}")
            }
        })
        .collect()
}

fn parse_flag(raw: Option<&str>, default: bool) -> bool {
    match raw.map(|v| v.trim().to_lowercase()) {
        Some(v) if v == "false" || v == "0" || v == "no" => false,
        Some(v) if v == "true" || v == "1" || v == "yes" => true,
        _ => default,
    }
}

/// Whether `path` sits at or below `prefix` (segment-aware, so `/dashboards`
/// is not under `/dashboard`).
pub fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Whether the route guard must resolve a session before serving `path`.
pub fn is_protected_path(path: &str) -> bool {
    AUTH_PROTECTED_PREFIXES
        .iter()
        .any(|prefix| path_has_prefix(path, prefix))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    /// Sets an environment variable for the guard's lifetime.
    struct EnvVarGuard {
        key: &'static str,
        original: Option<String>,
    }

    impl EnvVarGuard {
        fn set(key: &'static str, value: &str) -> Self {
            let original = std::env::var(key).ok();
            unsafe { std::env::set_var(key, value) };
            Self { key, original }
        }
    }

    impl Drop for EnvVarGuard {
        fn drop(&mut self) {
            match &self.original {
                Some(value) => unsafe { std::env::set_var(self.key, value) },
                None => unsafe { std::env::remove_var(self.key) },
            }
        }
    }

    #[test]
    #[serial]
    fn test_env_flag_reads_variable() {
        let _guard = EnvVarGuard::set("RENT_AUTH_TEST_FLAG", "false");
        assert!(!env_flag("RENT_AUTH_TEST_FLAG", true));
    }

    #[test]
    #[serial]
    fn test_env_flag_default_when_unset() {
        unsafe { std::env::remove_var("RENT_AUTH_TEST_FLAG") };
        assert!(env_flag("RENT_AUTH_TEST_FLAG", true));
    }

    #[test]
    #[serial]
    fn test_env_prefixes_override() {
        let _guard = EnvVarGuard::set("RENT_AUTH_TEST_PREFIXES", "/app, /admin/");
        assert_eq!(
            env_prefixes("RENT_AUTH_TEST_PREFIXES", "/dashboard"),
            vec!["/app", "/admin"]
        );
    }

    #[test]
    fn test_parse_prefixes_normalizes_entries() {
        let prefixes = parse_prefixes(" /dashboard/ , select-role,, ");
        assert_eq!(prefixes, vec!["/dashboard", "/select-role"]);
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag(None, true));
        assert!(!parse_flag(Some("false"), true));
        assert!(!parse_flag(Some("FALSE"), true));
        assert!(parse_flag(Some("1"), false));
        assert!(parse_flag(Some("garbage"), true));
        assert!(!parse_flag(Some("garbage"), false));
    }

    #[test]
    fn test_path_has_prefix_is_segment_aware() {
        assert!(path_has_prefix("/dashboard", "/dashboard"));
        assert!(path_has_prefix("/dashboard/owner", "/dashboard"));
        assert!(!path_has_prefix("/dashboards", "/dashboard"));
        assert!(!path_has_prefix("/", "/dashboard"));
    }

    #[test]
    fn test_default_protected_paths() {
        // Defaults apply when the variable is unset in the test environment.
        if std::env::var("AUTH_PROTECTED_PREFIXES").is_err() {
            assert!(is_protected_path("/dashboard/tenant"));
            assert!(is_protected_path("/select-role"));
            assert!(!is_protected_path("/login"));
            assert!(!is_protected_path("/auth/callback"));
        }
    }
}
