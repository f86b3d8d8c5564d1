//! Repository pattern matching
//!
//! Supports exactly three forms, all compared case-insensitively:
//! `owner/repo`, `owner/*` and `*`. Any other glob is rejected at load time.

use crate::error::ConfigError;
use std::fmt;
use std::str::FromStr;

/// A single repository pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RepoPattern {
    /// `*`
    Any,
    /// `owner/*`
    Owner(String),
    /// `owner/repo`
    Exact { owner: String, name: String },
}

impl RepoPattern {
    /// Parse a pattern, rejecting unsupported forms
    pub fn parse(pattern: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: &str| ConfigError::InvalidRepoPattern {
            pattern: pattern.to_string(),
            reason: reason.to_string(),
        };

        if pattern == "*" {
            return Ok(RepoPattern::Any);
        }

        let (owner, name) = pattern
            .split_once('/')
            .ok_or_else(|| invalid("expected 'owner/repo', 'owner/*' or '*'"))?;

        if !is_name_segment(owner) {
            return Err(invalid("owner must be a literal name"));
        }

        if name == "*" {
            return Ok(RepoPattern::Owner(owner.to_ascii_lowercase()));
        }

        if !is_name_segment(name) {
            return Err(invalid("repository must be a literal name or '*'"));
        }

        Ok(RepoPattern::Exact {
            owner: owner.to_ascii_lowercase(),
            name: name.to_ascii_lowercase(),
        })
    }

    /// Check whether a candidate `owner/repo` matches this pattern
    pub fn matches(&self, candidate: &str) -> bool {
        match self {
            RepoPattern::Any => true,
            RepoPattern::Owner(owner) => candidate
                .split_once('/')
                .is_some_and(|(o, _)| o.eq_ignore_ascii_case(owner)),
            RepoPattern::Exact { owner, name } => {
                candidate.split_once('/').is_some_and(|(o, n)| {
                    o.eq_ignore_ascii_case(owner) && n.eq_ignore_ascii_case(name)
                })
            }
        }
    }
}

fn is_name_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b'.'))
}

impl FromStr for RepoPattern {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for RepoPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoPattern::Any => f.write_str("*"),
            RepoPattern::Owner(owner) => write!(f, "{}/*", owner),
            RepoPattern::Exact { owner, name } => write!(f, "{}/{}", owner, name),
        }
    }
}

/// Compiled list of repository patterns
#[derive(Debug, Clone, Default)]
pub struct PatternMatcher {
    patterns: Vec<RepoPattern>,
}

impl PatternMatcher {
    /// Create a new pattern matcher from a list of repository patterns
    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let compiled = patterns
            .iter()
            .map(|p| RepoPattern::parse(p))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { patterns: compiled })
    }

    /// Create an empty pattern matcher (matches nothing)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Check if a repository matches any pattern
    pub fn matches(&self, repo: &str) -> bool {
        self.patterns.iter().any(|p| p.matches(repo))
    }

    /// Check if a repository matches any pattern, returning the matching pattern
    pub fn find_match(&self, repo: &str) -> Option<&RepoPattern> {
        self.patterns.iter().find(|p| p.matches(repo))
    }

    /// Check if this matcher has any patterns
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Get the number of patterns
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    pub fn patterns(&self) -> &[RepoPattern] {
        &self.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_matcher() {
        let matcher = PatternMatcher::empty();
        assert!(!matcher.matches("owner/repo"));
        assert!(matcher.is_empty());
    }

    #[test]
    fn test_exact_match_case_insensitive() {
        let pattern = RepoPattern::parse("Owner/Repo").unwrap();
        assert!(pattern.matches("owner/repo"));
        assert!(pattern.matches("OWNER/REPO"));
        assert!(!pattern.matches("owner/repo2"));
        assert!(!pattern.matches("owner"));
    }

    #[test]
    fn test_owner_wildcard() {
        let pattern = RepoPattern::parse("org/*").unwrap();
        assert_eq!(pattern, RepoPattern::Owner("org".into()));
        assert!(pattern.matches("org/anything"));
        assert!(pattern.matches("ORG/x"));
        assert!(!pattern.matches("organization/x"));
        assert!(!pattern.matches("other/org"));
    }

    #[test]
    fn test_universal_wildcard() {
        let pattern = RepoPattern::parse("*").unwrap();
        assert!(pattern.matches("a/b"));
        assert!(pattern.matches("whatever"));
    }

    #[test]
    fn test_partial_globs_rejected() {
        for bad in [
            "ow*ner/repo",
            "owner/re*",
            "*/repo",
            "owner",
            "owner/",
            "/repo",
            "owner/repo/extra",
            "**",
            "owner/?",
        ] {
            assert!(
                matches!(
                    RepoPattern::parse(bad),
                    Err(ConfigError::InvalidRepoPattern { .. })
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_find_match() {
        let matcher =
            PatternMatcher::new(&["org/app".to_string(), "org/*".to_string()]).unwrap();

        assert_eq!(
            matcher.find_match("org/app").map(ToString::to_string),
            Some("org/app".to_string())
        );
        assert_eq!(
            matcher.find_match("org/lib").map(ToString::to_string),
            Some("org/*".to_string())
        );
        assert!(matcher.find_match("else/lib").is_none());
        assert_eq!(matcher.len(), 2);
    }

    #[test]
    fn test_invalid_pattern_in_list() {
        let result = PatternMatcher::new(&["org/*".to_string(), "org/a*".to_string()]);
        assert!(matches!(
            result.unwrap_err(),
            ConfigError::InvalidRepoPattern { .. }
        ));
    }
}
