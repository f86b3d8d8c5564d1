//! Policy evaluation integration tests
//!
//! Covers the evaluator against the GitHub catalog:
//! - Deny always wins over any number of matching allow rules
//! - Allow requires every required action to be covered
//! - Rule order never changes the outcome
//! - Repository patterns and wildcards

use finegate::access_control::{DenyReason, Effect, Evaluation, PolicyEvaluator};
use finegate::config::RuleConfig;
use finegate::taxonomy::{ActionSet, Taxonomy, github};
use rstest::rstest;

// =============================================================================
// Test Helpers
// =============================================================================

fn catalog() -> Taxonomy {
    github().unwrap()
}

fn rule(effect: Effect, actions: &[&str], repos: &[&str]) -> RuleConfig {
    RuleConfig {
        effect,
        actions: actions.iter().map(ToString::to_string).collect(),
        repos: repos.iter().map(ToString::to_string).collect(),
    }
}

fn allow(actions: &[&str], repos: &[&str]) -> RuleConfig {
    rule(Effect::Allow, actions, repos)
}

fn deny(actions: &[&str], repos: &[&str]) -> RuleConfig {
    rule(Effect::Deny, actions, repos)
}

fn required(taxonomy: &Taxonomy, names: &[&str]) -> ActionSet {
    names.iter().map(|n| taxonomy.action(n).unwrap()).collect()
}

fn evaluate(rules: &[RuleConfig], actions: &[&str], repo: &str) -> Evaluation {
    let taxonomy = catalog();
    let evaluator = PolicyEvaluator::new(rules, &taxonomy).unwrap();
    evaluator.evaluate(&required(&taxonomy, actions), repo)
}

// =============================================================================
// 1. Documented scenarios
// =============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_deny_wins_despite_broader_allow() {
        let rules = [
            allow(&["*"], &["org/*"]),
            deny(&["pr:merge_squash"], &["*"]),
        ];
        let result = evaluate(&rules, &["pr:merge_squash"], "org/repo");
        assert!(matches!(
            result,
            Evaluation::Deny(DenyReason::ExplicitDeny { .. })
        ));
    }

    #[test]
    fn test_bundle_and_literal_cover_together() {
        let rules = [allow(&["pull-requests:read", "pr:create"], &["owner/repo"])];

        assert!(evaluate(&rules, &["pr:list", "pr:create"], "owner/repo").is_allowed());

        match evaluate(&rules, &["pr:list", "pr:approve"], "owner/repo") {
            Evaluation::Deny(DenyReason::NotCovered { actions }) => {
                let names: Vec<&str> = actions.iter().map(|a| a.as_str()).collect();
                assert_eq!(names, vec!["pr:approve"]);
            }
            other => panic!("expected NotCovered, got {other:?}"),
        }
    }

    #[test]
    fn test_default_deny_without_rules_matching() {
        let rules = [allow(&["pr:*"], &["org/*"])];
        assert!(matches!(
            evaluate(&rules, &["pr:list"], "other/repo"),
            Evaluation::Deny(DenyReason::NoMatchingRule)
        ));
    }
}

// =============================================================================
// 2. Deny precedence
// =============================================================================

mod deny_precedence {
    use super::*;

    #[rstest]
    #[case(1)]
    #[case(3)]
    #[case(10)]
    fn test_deny_beats_any_number_of_allows(#[case] allows: usize) {
        let mut rules: Vec<RuleConfig> = (0..allows)
            .map(|_| allow(&["pr:merge"], &["*"]))
            .collect();
        rules.push(deny(&["pr:merge_rebase"], &["owner/repo"]));

        assert!(evaluate(&rules, &["pr:merge_rebase"], "owner/repo").is_denied());
        // other merge methods are unaffected
        assert!(evaluate(&rules, &["pr:merge_squash"], "owner/repo").is_allowed());
    }

    #[test]
    fn test_deny_on_one_action_denies_the_whole_set() {
        let rules = [
            allow(&["pull-requests:write"], &["*"]),
            deny(&["pr:approve"], &["*"]),
        ];
        let result = evaluate(&rules, &["pr:get", "pr:approve"], "owner/repo");
        match result {
            Evaluation::Deny(DenyReason::ExplicitDeny { actions, rule }) => {
                assert_eq!(rule.index, 1);
                assert!(actions.contains("pr:approve"));
                assert!(!actions.contains("pr:get"));
            }
            other => panic!("expected ExplicitDeny, got {other:?}"),
        }
    }

    #[test]
    fn test_deny_scoped_to_other_repo_does_not_apply() {
        let rules = [
            allow(&["pr:*"], &["*"]),
            deny(&["pr:*"], &["prod/app"]),
        ];
        assert!(evaluate(&rules, &["pr:get"], "dev/app").is_allowed());
        assert!(evaluate(&rules, &["pr:get"], "PROD/App").is_denied());
    }
}

// =============================================================================
// 3. Order independence
// =============================================================================

mod ordering {
    use super::*;

    #[test]
    fn test_outcome_independent_of_rule_order() {
        let rules = vec![
            allow(&["issues:read"], &["org/*"]),
            deny(&["issues:write"], &["org/secret"]),
            allow(&["issues:write", "pr:list"], &["*"]),
        ];

        let cases: &[(&[&str], &str)] = &[
            (&["issues:read"], "org/app"),
            (&["issues:write"], "org/secret"),
            (&["issues:read", "issues:write"], "org/app"),
            (&["issues:read", "pr:list"], "other/app"),
        ];

        let mut reversed = rules.clone();
        reversed.reverse();

        for (actions, repo) in cases {
            assert_eq!(
                evaluate(&rules, actions, repo).is_allowed(),
                evaluate(&reversed, actions, repo).is_allowed(),
                "{actions:?} on {repo}"
            );
        }
    }

    #[test]
    fn test_identical_rules_are_idempotent() {
        let once = [allow(&["pr:get"], &["owner/repo"])];
        let twice = [
            allow(&["pr:get"], &["owner/repo"]),
            allow(&["pr:get"], &["owner/repo"]),
        ];
        assert_eq!(
            evaluate(&once, &["pr:get"], "owner/repo").is_allowed(),
            evaluate(&twice, &["pr:get"], "owner/repo").is_allowed()
        );
    }
}

// =============================================================================
// 4. Coverage
// =============================================================================

mod coverage {
    use super::*;

    #[test]
    fn test_coverage_across_multiple_allow_rules() {
        let rules = [
            allow(&["pr:comment_create"], &["owner/repo"]),
            allow(&["pr:merge"], &["owner/*"]),
        ];
        assert!(
            evaluate(&rules, &["pr:comment_create", "pr:merge_commit"], "owner/repo").is_allowed()
        );
        assert!(
            evaluate(&rules, &["pr:comment_create", "pr:merge_commit"], "owner/other").is_denied()
        );
    }

    #[test]
    fn test_namespace_wildcard_stays_in_namespace() {
        let rules = [allow(&["issues:*"], &["*"])];
        assert!(evaluate(&rules, &["issues:edit"], "a/b").is_allowed());
        assert!(evaluate(&rules, &["subissues:add"], "a/b").is_denied());
    }

    #[test]
    fn test_unconfirmed_actions_need_explicit_grant() {
        let rules = [allow(&["pull-requests:write", "pr:merge"], &["*"])];
        assert!(evaluate(&rules, &["pr:auto_merge_enable"], "a/b").is_denied());

        let rules = [allow(&["pr:auto_merge_enable"], &["*"])];
        assert!(evaluate(&rules, &["pr:auto_merge_enable"], "a/b").is_allowed());
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let taxonomy = catalog();
        let evaluator = PolicyEvaluator::new(
            &[allow(&["pulls:contribute"], &["org/*"]), deny(&["pr:approve"], &["org/x"])],
            &taxonomy,
        )
        .unwrap();
        let actions = required(&taxonomy, &["pr:create", "pr:approve"]);

        let first = evaluator.evaluate(&actions, "org/x");
        for _ in 0..5 {
            assert_eq!(evaluator.evaluate(&actions, "org/x"), first);
        }
    }
}

// =============================================================================
// 5. Load-time validation
// =============================================================================

mod validation {
    use super::*;
    use finegate::error::ConfigError;

    #[test]
    fn test_unknown_action_rejected() {
        let result = PolicyEvaluator::new(&[allow(&["pr:teleport"], &["*"])], &catalog());
        assert!(matches!(result, Err(ConfigError::UnknownAction { .. })));
    }

    #[test]
    fn test_unsupported_repo_glob_rejected() {
        let result = PolicyEvaluator::new(&[allow(&["pr:get"], &["org/app-*"])], &catalog());
        assert!(matches!(result, Err(ConfigError::InvalidRepoPattern { .. })));
    }
}

// =============================================================================
// 6. Taxonomy properties
// =============================================================================

mod taxonomy {
    use super::*;

    #[test]
    fn test_universal_wildcard_is_union_of_namespaces() {
        let taxonomy = catalog();
        let union: ActionSet = taxonomy
            .namespaces()
            .flat_map(|(ns, _)| taxonomy.expand(&format!("{ns}:*")).unwrap())
            .collect();
        assert_eq!(taxonomy.expand("*").unwrap(), union);
    }

    #[test]
    fn test_pull_request_bundles_strictly_nested() {
        let taxonomy = catalog();
        let read = taxonomy.expand("pull-requests:read").unwrap();
        let contribute = taxonomy.expand("pulls:contribute").unwrap();
        let write = taxonomy.expand("pull-requests:write").unwrap();

        assert_eq!(read.len(), 15);
        assert!(read.is_subset(&contribute) && read.len() < contribute.len());
        assert!(contribute.is_subset(&write) && contribute.len() < write.len());
    }
}
