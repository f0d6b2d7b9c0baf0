//! Local-redirect policy and its runtime holder.
//!
//! The policy is a plain `Copy` value. Decisions receive a snapshot; reloads
//! swap the shared value atomically so a decision never sees a torn policy.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::directive::{self, Directive};

/// Directive enabling the read-only restriction.
pub const READONLY_REDIRECT_DIRECTIVE: &str = "redirlocal.readonlyredirect";

/// Policy consulted by every locate decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct PolicyState {
    /// Restrict local redirection to plain reads.
    pub read_only_redirect: bool,
}

impl PolicyState {
    /// Load the policy from a directive file.
    ///
    /// A file that cannot be read yields the default (unrestricted) policy;
    /// a missing configuration is not an error.
    pub fn load(path: &Path) -> Self {
        Self::from_directives(&directive::load_or_empty(path))
    }

    /// Build the policy from already parsed directives.
    ///
    /// The value is enabling when it contains "true" in any letter case; a
    /// missing value disables the restriction.
    pub fn from_directives(directives: &[Directive]) -> Self {
        let read_only_redirect = directive::last_named(directives, READONLY_REDIRECT_DIRECTIVE)
            .and_then(Directive::value)
            .is_some_and(|v| v.to_ascii_lowercase().contains("true"));
        Self { read_only_redirect }
    }
}

/// Thread-safe holder of the current policy. Cheap to clone (Arc).
#[derive(Clone)]
pub struct SharedPolicy {
    read_only_redirect: Arc<AtomicBool>,
}

impl SharedPolicy {
    pub fn new(policy: PolicyState) -> Self {
        Self {
            read_only_redirect: Arc::new(AtomicBool::new(policy.read_only_redirect)),
        }
    }

    pub fn snapshot(&self) -> PolicyState {
        PolicyState {
            read_only_redirect: self.read_only_redirect.load(Ordering::Acquire),
        }
    }

    pub fn replace(&self, policy: PolicyState) {
        self.read_only_redirect
            .store(policy.read_only_redirect, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::directive::parse_directives;

    fn policy_of(text: &str) -> PolicyState {
        PolicyState::from_directives(&parse_directives(text))
    }

    #[test]
    fn test_true_in_any_case_enables() {
        assert!(policy_of("redirlocal.readonlyredirect TRUE\n").read_only_redirect);
        assert!(policy_of("redirlocal.readonlyredirect tRuE\n").read_only_redirect);
        assert!(policy_of("redirlocal.readonlyredirect true\n").read_only_redirect);
    }

    #[test]
    fn test_substring_match_on_value() {
        assert!(policy_of("redirlocal.readonlyredirect istrue\n").read_only_redirect);
    }

    #[test]
    fn test_false_or_absent_disables() {
        assert!(!policy_of("redirlocal.readonlyredirect false\n").read_only_redirect);
        assert!(!policy_of("redirlocal.readonlyredirect 1\n").read_only_redirect);
        assert!(!policy_of("redirlocal.readonlyredirect\n").read_only_redirect);
        assert!(!policy_of("oss.localroot /data\n").read_only_redirect);
    }

    #[test]
    fn test_directive_position_does_not_matter() {
        let first = "redirlocal.readonlyredirect True\nall.role server\noss.localroot /d\n";
        let last = "all.role server\noss.localroot /d\nredirlocal.readonlyredirect True\n";
        assert_eq!(policy_of(first), policy_of(last));
        assert!(policy_of(last).read_only_redirect);
    }

    #[test]
    fn test_keyword_is_case_sensitive() {
        assert!(!policy_of("RedirLocal.ReadOnlyRedirect true\n").read_only_redirect);
    }

    #[test]
    fn test_later_directive_overrides_earlier() {
        let text = "redirlocal.readonlyredirect true\nredirlocal.readonlyredirect false\n";
        assert!(!policy_of(text).read_only_redirect);
    }

    #[test]
    fn test_unreadable_file_gives_default() {
        let path = std::env::temp_dir().join("redir-local-missing-policy.cfg");
        assert_eq!(PolicyState::load(&path), PolicyState::default());
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!(
            "redir-local-policy-{}.cfg",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(&path, "# site config\nredirlocal.readonlyredirect TRUE\n").unwrap();
        let policy = PolicyState::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(policy.read_only_redirect);
    }

    #[test]
    fn test_load_ignores_non_utf8_comment() {
        let path = std::env::temp_dir().join(format!(
            "redir-local-policy-{}.cfg",
            uuid::Uuid::new_v4()
        ));
        std::fs::write(
            &path,
            b"# Zugriff f\xfcr Leser\nredirlocal.readonlyredirect true\noss.localroot /data\n",
        )
        .unwrap();
        let policy = PolicyState::load(&path);
        std::fs::remove_file(&path).unwrap();
        assert!(policy.read_only_redirect);
    }

    #[test]
    fn test_shared_policy_replace_is_visible_to_clones() {
        let shared = SharedPolicy::new(PolicyState::default());
        let reader = shared.clone();
        shared.replace(PolicyState {
            read_only_redirect: true,
        });
        assert!(reader.snapshot().read_only_redirect);
    }
}
