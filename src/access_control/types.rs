//! Access control types
//!
//! Core types shared by the policy evaluator and the kernel.

use crate::taxonomy::{ActionSet, join_actions};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Effect of a policy rule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

impl Effect {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Effect::Allow => "allow",
            Effect::Deny => "deny",
        }
    }
}

impl fmt::Display for Effect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A repository identifier, `owner/name`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(into = "String")]
pub struct RepoId {
    pub owner: String,
    pub name: String,
}

impl RepoId {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }

    /// Parse `owner/name`. Both segments must be non-empty and free of `/`.
    pub fn parse(s: &str) -> Option<Self> {
        let (owner, name) = s.split_once('/')?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return None;
        }
        Some(Self::new(owner, name))
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Case-insensitive equality, matching how the platform resolves names
    pub fn same_as(&self, other: &RepoId) -> bool {
        self.owner.eq_ignore_ascii_case(&other.owner) && self.name.eq_ignore_ascii_case(&other.name)
    }
}

impl fmt::Display for RepoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl From<RepoId> for String {
    fn from(repo: RepoId) -> Self {
        repo.full_name()
    }
}

/// Identifies a configured rule in decisions and log output
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSummary {
    /// Position in the configured rule list
    pub index: usize,
    pub effect: Effect,
    pub actions: Vec<String>,
    pub repos: Vec<String>,
}

impl fmt::Display for RuleSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {} on {}",
            self.index,
            self.effect.as_str().to_uppercase(),
            self.actions.join(", "),
            self.repos.join(", ")
        )
    }
}

/// Why a request was denied
///
/// Carries enough detail to write a precise rule, and never names a credential.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The request did not map onto known actions
    Unclassified { reason: String },
    /// A deny rule matched one or more required actions
    ExplicitDeny { rule: RuleSummary, actions: ActionSet },
    /// Allow rules matched but did not cover every required action
    NotCovered { actions: ActionSet },
    /// No rule matched at all
    NoMatchingRule,
}

impl DenyReason {
    /// Short machine-readable code
    pub const fn code(&self) -> &'static str {
        match self {
            DenyReason::Unclassified { .. } => "unclassified",
            DenyReason::ExplicitDeny { .. } => "explicit_deny",
            DenyReason::NotCovered { .. } => "not_covered",
            DenyReason::NoMatchingRule => "no_matching_rule",
        }
    }
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::Unclassified { reason } => {
                write!(f, "request could not be classified: {}", reason)
            }
            DenyReason::ExplicitDeny { rule, actions } => {
                write!(f, "{} denied by rule {}", join_actions(actions), rule)
            }
            DenyReason::NotCovered { actions } => {
                write!(f, "no allow rule covers {}", join_actions(actions))
            }
            DenyReason::NoMatchingRule => f.write_str("no matching rule (default deny)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_id_parse() {
        let repo = RepoId::parse("Owner/Repo").unwrap();
        assert_eq!(repo.owner, "Owner");
        assert_eq!(repo.name, "Repo");
        assert_eq!(repo.to_string(), "Owner/Repo");

        assert!(RepoId::parse("owner").is_none());
        assert!(RepoId::parse("/repo").is_none());
        assert!(RepoId::parse("owner/").is_none());
        assert!(RepoId::parse("a/b/c").is_none());
    }

    #[test]
    fn test_repo_id_same_as() {
        let a = RepoId::new("Owner", "Repo");
        let b = RepoId::new("owner", "repo");
        assert!(a.same_as(&b));
        assert_ne!(a, b);
    }

    #[test]
    fn test_rule_summary_display() {
        let rule = RuleSummary {
            index: 1,
            effect: Effect::Deny,
            actions: vec!["pr:merge".into()],
            repos: vec!["*".into()],
        };
        assert_eq!(rule.to_string(), "[1] DENY: pr:merge on *");
    }

    #[test]
    fn test_deserialize_effect() {
        let effect: Effect = serde_json::from_str(r#""allow""#).unwrap();
        assert_eq!(effect, Effect::Allow);
        assert!(serde_json::from_str::<Effect>(r#""maybe""#).is_err());
    }
}
