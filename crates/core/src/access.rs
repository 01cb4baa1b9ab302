//! Route access decisions.
//!
//! The storefront lets anonymous visitors browse and sends them to the login
//! page for everything else. The decision itself is pure so the middleware
//! only has to resolve the session and act on the result.

/// Routes reachable without signing in.
///
/// Entries containing `[` are patterns: everything before the bracket is
/// matched as a prefix.
pub const PUBLIC_PATHS: [&str; 5] = [
    "/",
    "/auth/login",
    "/auth/register",
    "/products",
    "/products/[id]",
];

/// Prefixes served without consulting the session at all.
pub const BYPASS_PREFIXES: [&str; 2] = ["/static/", "/health/"];

/// Exact paths served without consulting the session.
pub const BYPASS_PATHS: [&str; 1] = ["/health"];

/// What is known about the visitor when a request arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// The session has not been read yet, or reading it failed.
    Resolving,
    Anonymous,
    Authenticated,
}

/// Outcome of the gate for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    /// Show the loading placeholder; do not decide yet.
    Pending,
    Allow,
    RedirectToLogin,
}

/// Whether `path` is on the public allow-list.
#[must_use]
pub fn is_public_path(path: &str) -> bool {
    PUBLIC_PATHS.iter().any(|entry| match entry.split_once('[') {
        Some((prefix, _)) => path.starts_with(prefix),
        None => path == *entry,
    })
}

/// Whether `path` skips the gate entirely (assets, probes).
#[must_use]
pub fn bypasses_gate(path: &str) -> bool {
    BYPASS_PATHS.contains(&path)
        || BYPASS_PREFIXES
            .iter()
            .any(|prefix| path.starts_with(prefix))
}

/// Decide what to do with a request for `path`.
#[must_use]
pub fn decide(state: SessionState, path: &str) -> GateDecision {
    match state {
        SessionState::Resolving => GateDecision::Pending,
        SessionState::Authenticated => GateDecision::Allow,
        SessionState::Anonymous if is_public_path(path) => GateDecision::Allow,
        SessionState::Anonymous => GateDecision::RedirectToLogin,
    }
}

/// Login URL that returns the visitor to `path` afterwards.
#[must_use]
pub fn login_redirect(path: &str) -> String {
    format!("/auth/login?redirect={}", urlencoding::encode(path))
}

/// Sanitize a post-login redirect target. Only local absolute paths are
/// honoured; anything else falls back to `/`.
///
/// Browsers drop tab, CR and LF from URLs, so a target carrying control
/// characters is rejected outright rather than checked as written.
#[must_use]
pub fn safe_redirect_target(target: Option<&str>) -> &str {
    match target {
        Some(t)
            if t.starts_with('/')
                && !t.starts_with("//")
                && !t.contains('\\')
                && !t.chars().any(char::is_control) =>
        {
            t
        }
        _ => "/",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_public_paths() {
        for path in ["/", "/auth/login", "/auth/register", "/products"] {
            assert!(is_public_path(path), "{path} should be public");
        }
    }

    #[test]
    fn test_pattern_entry_matches_by_prefix() {
        assert!(is_public_path("/products/1"));
        assert!(is_public_path("/products/20"));
    }

    #[test]
    fn test_private_paths() {
        for path in ["/cart", "/checkout", "/wishlist", "/account", "/contact", "/auth"] {
            assert!(!is_public_path(path), "{path} should not be public");
        }
    }

    #[test]
    fn test_resolving_never_decides() {
        assert_eq!(decide(SessionState::Resolving, "/"), GateDecision::Pending);
        assert_eq!(
            decide(SessionState::Resolving, "/checkout"),
            GateDecision::Pending
        );
    }

    #[test]
    fn test_anonymous_redirected_only_off_allow_list() {
        assert_eq!(
            decide(SessionState::Anonymous, "/checkout"),
            GateDecision::RedirectToLogin
        );
        assert_eq!(
            decide(SessionState::Anonymous, "/products/7"),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_authenticated_allowed_everywhere() {
        assert_eq!(
            decide(SessionState::Authenticated, "/account"),
            GateDecision::Allow
        );
    }

    #[test]
    fn test_bypass_prefixes() {
        assert!(bypasses_gate("/static/style.css"));
        assert!(bypasses_gate("/health/ready"));
        assert!(bypasses_gate("/health"));
        assert!(!bypasses_gate("/healthanything"));
        assert!(!bypasses_gate("/cart"));
    }

    #[test]
    fn test_login_redirect_encodes_path() {
        assert_eq!(login_redirect("/checkout"), "/auth/login?redirect=%2Fcheckout");
    }

    #[test]
    fn test_safe_redirect_target() {
        assert_eq!(safe_redirect_target(Some("/checkout")), "/checkout");
        assert_eq!(safe_redirect_target(Some("https://evil.test")), "/");
        assert_eq!(safe_redirect_target(Some("//evil.test")), "/");
        assert_eq!(safe_redirect_target(Some("/\\evil.test")), "/");
        assert_eq!(safe_redirect_target(None), "/");
    }

    #[test]
    fn test_safe_redirect_target_rejects_control_characters() {
        assert_eq!(safe_redirect_target(Some("/\t/evil.test")), "/");
        assert_eq!(safe_redirect_target(Some("/\r\n/evil.test")), "/");
        assert_eq!(safe_redirect_target(Some("/cart\n")), "/");
    }
}
