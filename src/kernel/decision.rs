//! Authorization decisions

use crate::access_control::{DenyReason, RepoId, RuleSummary};
use crate::credentials::Credential;
use crate::taxonomy::ActionSet;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

/// Allow or deny
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Allow,
    Deny,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Allow => f.write_str("allow"),
            Outcome::Deny => f.write_str("deny"),
        }
    }
}

/// The kernel's verdict on one request. Produced per request, never stored.
///
/// A credential is present only on allow. Denials carry a reason detailed
/// enough to write a rule, and never name a credential.
#[derive(Debug, Clone)]
pub struct Decision {
    pub outcome: Outcome,
    /// Target repository, when it could be determined
    pub repo: Option<RepoId>,
    /// Required actions; empty when classification failed
    pub actions: ActionSet,
    /// First matching allow rule
    pub matched_rule: Option<RuleSummary>,
    pub credential: Option<Arc<Credential>>,
    pub reason: Option<DenyReason>,
}

impl Decision {
    pub fn allow(
        repo: RepoId,
        actions: ActionSet,
        rule: RuleSummary,
        credential: Arc<Credential>,
    ) -> Self {
        Self {
            outcome: Outcome::Allow,
            repo: Some(repo),
            actions,
            matched_rule: Some(rule),
            credential: Some(credential),
            reason: None,
        }
    }

    pub fn deny(repo: Option<RepoId>, actions: ActionSet, reason: DenyReason) -> Self {
        Self {
            outcome: Outcome::Deny,
            repo,
            actions,
            matched_rule: None,
            credential: None,
            reason: Some(reason),
        }
    }

    pub fn is_allowed(&self) -> bool {
        self.outcome == Outcome::Allow
    }

    pub fn is_denied(&self) -> bool {
        self.outcome == Outcome::Deny
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access_control::Effect;
    use crate::util::SecretString;

    #[test]
    fn test_deny_has_no_credential() {
        let decision = Decision::deny(None, ActionSet::new(), DenyReason::NoMatchingRule);
        assert!(decision.is_denied());
        assert!(decision.credential.is_none());
        assert!(decision.matched_rule.is_none());
        assert_eq!(decision.outcome.to_string(), "deny");
    }

    #[test]
    fn test_allow_carries_rule_and_credential() {
        let rule = RuleSummary {
            index: 0,
            effect: Effect::Allow,
            actions: vec!["*".into()],
            repos: vec!["*".into()],
        };
        let decision = Decision::allow(
            RepoId::new("o", "r"),
            ActionSet::new(),
            rule,
            Arc::new(Credential::fallback(SecretString::new("ghp_x"))),
        );
        assert!(decision.is_allowed());
        assert!(decision.reason.is_none());
        assert_eq!(
            decision.credential.as_ref().map(|c| c.name()),
            Some("classic_pat")
        );
    }
}
