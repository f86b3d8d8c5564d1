//! Policy evaluator
//!
//! AWS IAM-style evaluation over action × repository:
//! 1. Collect every rule whose expanded actions intersect the required set
//!    and whose repository patterns match the target.
//! 2. Any matching deny rule denies, regardless of list position.
//! 3. Otherwise allow only if the matching allow rules jointly cover every
//!    required action.
//! 4. No match at all is an implicit deny.

use crate::access_control::patterns::PatternMatcher;
use crate::access_control::types::{DenyReason, Effect, RuleSummary};
use crate::config::RuleConfig;
use crate::error::ConfigError;
use crate::taxonomy::{ActionSet, Taxonomy, join_actions};
use tracing::{debug, trace};

/// A rule with its action patterns expanded and repository patterns compiled
#[derive(Debug, Clone)]
pub struct Rule {
    summary: RuleSummary,
    actions: ActionSet,
    repos: PatternMatcher,
}

impl Rule {
    /// Compile a configured rule against the taxonomy
    pub fn compile(
        index: usize,
        config: &RuleConfig,
        taxonomy: &Taxonomy,
    ) -> Result<Self, ConfigError> {
        let mut actions = ActionSet::new();
        for pattern in &config.actions {
            actions.extend(taxonomy.expand(pattern)?);
        }

        Ok(Self {
            summary: RuleSummary {
                index,
                effect: config.effect,
                actions: config.actions.clone(),
                repos: config.repos.clone(),
            },
            actions,
            repos: PatternMatcher::new(&config.repos)?,
        })
    }

    pub fn effect(&self) -> Effect {
        self.summary.effect
    }

    pub fn summary(&self) -> &RuleSummary {
        &self.summary
    }

    /// Expanded primitive actions this rule applies to
    pub fn actions(&self) -> &ActionSet {
        &self.actions
    }

    /// Required actions this rule applies to for `repo`, or `None` if it does not match
    fn applicable(&self, required: &ActionSet, repo: &str) -> Option<ActionSet> {
        if !self.repos.matches(repo) {
            return None;
        }
        let hit: ActionSet = required.intersection(&self.actions).cloned().collect();
        (!hit.is_empty()).then_some(hit)
    }
}

/// Result of evaluating one request against the rule list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Every required action is covered; `rule` is the first matching allow rule
    Allow { rule: RuleSummary },
    Deny(DenyReason),
}

impl Evaluation {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Evaluation::Allow { .. })
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, Evaluation::Deny(_))
    }
}

/// Policy evaluator over an ordered, immutable rule list
#[derive(Debug, Clone, Default)]
pub struct PolicyEvaluator {
    rules: Vec<Rule>,
}

impl PolicyEvaluator {
    /// Compile the configured rules. Every action and repository pattern
    /// must resolve, otherwise the whole policy is rejected.
    pub fn new(rules: &[RuleConfig], taxonomy: &Taxonomy) -> Result<Self, ConfigError> {
        let rules = rules
            .iter()
            .enumerate()
            .map(|(index, rule)| Rule::compile(index, rule, taxonomy))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { rules })
    }

    /// An evaluator with no rules; denies everything
    pub fn deny_all() -> Self {
        Self::default()
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Evaluate the required action set for a repository.
    ///
    /// Pure: no I/O, no state carried between calls.
    pub fn evaluate(&self, required: &ActionSet, repo: &str) -> Evaluation {
        debug!(
            repo,
            actions = %join_actions(required),
            "Evaluating policy"
        );

        let mut first_allow: Option<&Rule> = None;
        let mut covered = ActionSet::new();

        for rule in &self.rules {
            let Some(hit) = rule.applicable(required, repo) else {
                continue;
            };

            match rule.effect() {
                Effect::Deny => {
                    trace!(rule = %rule.summary, "Matched deny rule");
                    return Evaluation::Deny(DenyReason::ExplicitDeny {
                        rule: rule.summary.clone(),
                        actions: hit,
                    });
                }
                Effect::Allow => {
                    trace!(rule = %rule.summary, "Matched allow rule");
                    if first_allow.is_none() {
                        first_allow = Some(rule);
                    }
                    covered.extend(hit);
                }
            }
        }

        let Some(rule) = first_allow else {
            return Evaluation::Deny(DenyReason::NoMatchingRule);
        };

        let uncovered: ActionSet = required.difference(&covered).cloned().collect();
        if uncovered.is_empty() {
            Evaluation::Allow {
                rule: rule.summary.clone(),
            }
        } else {
            Evaluation::Deny(DenyReason::NotCovered { actions: uncovered })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{Action, github};

    fn rule(effect: Effect, actions: &[&str], repos: &[&str]) -> RuleConfig {
        RuleConfig {
            effect,
            actions: actions.iter().map(ToString::to_string).collect(),
            repos: repos.iter().map(ToString::to_string).collect(),
        }
    }

    fn required(actions: &[&str]) -> ActionSet {
        actions.iter().map(|a| Action::parse(a).unwrap()).collect()
    }

    #[test]
    fn test_deny_all() {
        let evaluator = PolicyEvaluator::deny_all();
        assert_eq!(
            evaluator.evaluate(&required(&["pr:list"]), "o/r"),
            Evaluation::Deny(DenyReason::NoMatchingRule)
        );
    }

    #[test]
    fn test_deny_wins_over_broader_allow() {
        let taxonomy = github().unwrap();
        let evaluator = PolicyEvaluator::new(
            &[
                rule(Effect::Allow, &["*"], &["org/*"]),
                rule(Effect::Deny, &["pr:merge_squash"], &["*"]),
            ],
            &taxonomy,
        )
        .unwrap();

        let result = evaluator.evaluate(&required(&["pr:merge_squash"]), "org/repo");
        match result {
            Evaluation::Deny(DenyReason::ExplicitDeny { rule, actions }) => {
                assert_eq!(rule.index, 1);
                assert!(actions.contains("pr:merge_squash"));
            }
            other => panic!("expected explicit deny, got {:?}", other),
        }

        assert!(
            evaluator
                .evaluate(&required(&["pr:merge_rebase"]), "org/repo")
                .is_allowed()
        );
    }

    #[test]
    fn test_partial_coverage_denied() {
        let taxonomy = github().unwrap();
        let evaluator = PolicyEvaluator::new(
            &[rule(
                Effect::Allow,
                &["pull-requests:read", "pr:create"],
                &["owner/repo"],
            )],
            &taxonomy,
        )
        .unwrap();

        assert!(
            evaluator
                .evaluate(&required(&["pr:list", "pr:create"]), "owner/repo")
                .is_allowed()
        );

        assert_eq!(
            evaluator.evaluate(&required(&["pr:list", "pr:approve"]), "owner/repo"),
            Evaluation::Deny(DenyReason::NotCovered {
                actions: required(&["pr:approve"])
            })
        );
    }

    #[test]
    fn test_coverage_across_rules() {
        let taxonomy = github().unwrap();
        let evaluator = PolicyEvaluator::new(
            &[
                rule(Effect::Allow, &["pr:list"], &["owner/*"]),
                rule(Effect::Allow, &["pr:approve"], &["owner/repo"]),
            ],
            &taxonomy,
        )
        .unwrap();

        let result = evaluator.evaluate(&required(&["pr:list", "pr:approve"]), "owner/repo");
        assert_eq!(
            result,
            Evaluation::Allow {
                rule: evaluator.rules()[0].summary().clone()
            }
        );

        assert!(
            evaluator
                .evaluate(&required(&["pr:list", "pr:approve"]), "owner/other")
                .is_denied()
        );
    }

    #[test]
    fn test_repo_mismatch_is_default_deny() {
        let taxonomy = github().unwrap();
        let evaluator =
            PolicyEvaluator::new(&[rule(Effect::Allow, &["*"], &["owner/repo"])], &taxonomy)
                .unwrap();

        assert_eq!(
            evaluator.evaluate(&required(&["pr:list"]), "someone/else"),
            Evaluation::Deny(DenyReason::NoMatchingRule)
        );
    }

    #[test]
    fn test_empty_required_set_denied() {
        let taxonomy = github().unwrap();
        let evaluator =
            PolicyEvaluator::new(&[rule(Effect::Allow, &["*"], &["*"])], &taxonomy).unwrap();
        assert!(evaluator.evaluate(&ActionSet::new(), "o/r").is_denied());
    }

    #[test]
    fn test_unknown_action_rejected_at_load() {
        let taxonomy = github().unwrap();
        let result =
            PolicyEvaluator::new(&[rule(Effect::Allow, &["pr:teleport"], &["*"])], &taxonomy);
        assert!(matches!(result, Err(ConfigError::UnknownAction { .. })));
    }

    #[test]
    fn test_unsupported_repo_glob_rejected_at_load() {
        let taxonomy = github().unwrap();
        let result =
            PolicyEvaluator::new(&[rule(Effect::Allow, &["*"], &["ow*ner/repo"])], &taxonomy);
        assert!(matches!(
            result,
            Err(ConfigError::InvalidRepoPattern { .. })
        ));
    }
}
