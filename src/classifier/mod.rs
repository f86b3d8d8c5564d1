//! Request classification
//!
//! Reduces the three inbound request shapes to one authorization vocabulary:
//! the required action set, together with the repository it targets.
//!
//! - [`Request::Rest`]: method and concrete path, plus the parameters that
//!   select among branched actions (REST API and git smart-HTTP)
//! - [`Request::GraphQl`]: a document addressed to a declared repository
//! - [`Request::Cli`]: a gh-shaped argument vector for a declared repository
//!
//! Classification never produces a permissive default. A request that does
//! not map onto known actions is a [`ClassificationError`], which the kernel
//! turns into a denial.

pub mod cli;
pub mod graphql;
pub mod rest;

use crate::access_control::RepoId;
use crate::credentials::Transport;
use crate::error::{ClassificationError, ConfigError};
use crate::taxonomy::{ActionSet, Taxonomy, join_actions};
use serde::Deserialize;
use serde_json::Value;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

pub use rest::RestClassifier;

/// One inbound request, tagged by protocol
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Request {
    Rest {
        method: String,
        /// Concrete path, optionally with a query string
        path: String,
        #[serde(default)]
        query: Option<String>,
        /// Body parameters used for branched endpoints
        #[serde(default)]
        params: Option<Value>,
    },
    #[serde(rename = "graphql")]
    GraphQl {
        /// Declared target, `owner/name`
        repo: String,
        query: String,
        #[serde(default)]
        variables: Option<Value>,
        #[serde(default, rename = "operationName", alias = "operation_name")]
        operation_name: Option<String>,
    },
    Cli {
        args: Vec<String>,
        /// Declared target, `owner/name`
        repo: String,
    },
}

impl Request {
    pub const fn kind(&self) -> &'static str {
        match self {
            Request::Rest { .. } => "rest",
            Request::GraphQl { .. } => "graphql",
            Request::Cli { .. } => "cli",
        }
    }

    /// Git smart-HTTP for REST paths under `/git/`, the API otherwise
    pub fn transport(&self) -> Transport {
        match self {
            Request::Rest { path, .. } if path.starts_with("/git/") => Transport::Git,
            _ => Transport::Api,
        }
    }

    /// The repository the caller declared, when the shape carries one.
    ///
    /// REST requests carry theirs in the path.
    pub fn declared_repo(&self) -> Option<&str> {
        match self {
            Request::Rest { .. } => None,
            Request::GraphQl { repo, .. } | Request::Cli { repo, .. } => Some(repo),
        }
    }
}

/// The required action set and its target repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classification {
    pub repo: RepoId,
    pub actions: ActionSet,
}

/// Maps requests onto primitive actions registered in the taxonomy
#[derive(Debug, Clone)]
pub struct Classifier {
    taxonomy: Arc<Taxonomy>,
    rest: RestClassifier,
}

impl Classifier {
    /// Build the classifier, verifying that every action its tables can
    /// produce is registered.
    pub fn new(taxonomy: Arc<Taxonomy>) -> Result<Self, ConfigError> {
        let referenced = RestClassifier::referenced_actions()
            .chain(graphql::referenced_actions())
            .chain(cli::referenced_actions());

        for name in referenced {
            taxonomy.action(name)?;
        }

        Ok(Self {
            taxonomy,
            rest: RestClassifier::new()?,
        })
    }

    /// Classify one request
    pub fn classify(&self, request: &Request) -> Result<Classification, ClassificationError> {
        let (repo, names) = match request {
            Request::Rest {
                method,
                path,
                query,
                params,
            } => {
                let (repo, action) =
                    self.rest
                        .classify(method, path, query.as_deref(), params.as_ref())?;
                (repo, BTreeSet::from([action]))
            }
            Request::GraphQl {
                repo,
                query,
                variables,
                operation_name,
            } => {
                let repo = parse_declared(repo)?;
                let names = graphql::classify(
                    query,
                    variables.as_ref(),
                    operation_name.as_deref(),
                    &repo,
                )?;
                (repo, names)
            }
            Request::Cli { args, repo } => {
                let repo = parse_declared(repo)?;
                let names = cli::classify(args, &repo)?;
                (repo, names)
            }
        };

        if names.is_empty() {
            return Err(ClassificationError::new(
                "request does not perform any repository action",
            ));
        }

        let actions = names
            .into_iter()
            .map(|name| {
                self.taxonomy
                    .action(name)
                    .map_err(|e| ClassificationError::new(e.to_string()))
            })
            .collect::<Result<ActionSet, _>>()?;

        debug!(
            kind = request.kind(),
            repo = %repo,
            actions = %join_actions(&actions),
            "Classified request"
        );

        Ok(Classification { repo, actions })
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        &self.taxonomy
    }
}

fn parse_declared(repo: &str) -> Result<RepoId, ClassificationError> {
    RepoId::parse(repo)
        .ok_or_else(|| ClassificationError::new(format!("invalid repository '{}'", repo)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::taxonomy::{TaxonomyBuilder, github};
    use serde_json::json;

    fn classifier() -> Classifier {
        Classifier::new(Arc::new(github().unwrap())).unwrap()
    }

    fn names(classification: &Classification) -> Vec<&str> {
        classification.actions.iter().map(|a| a.as_str()).collect()
    }

    #[test]
    fn test_every_table_action_is_registered() {
        // Construction validates the tables against the catalog.
        classifier();
    }

    #[test]
    fn test_missing_catalog_action_rejected() {
        let mut builder = TaxonomyBuilder::new();
        builder.primitives(&["pr:list"]).unwrap();
        let result = Classifier::new(Arc::new(builder.build()));
        assert!(matches!(result, Err(ConfigError::UnknownAction { .. })));
    }

    #[test]
    fn test_deserialize_requests() {
        let rest: Request = serde_json::from_value(json!({
            "kind": "rest",
            "method": "PUT",
            "path": "/repos/o/r/pulls/1/merge",
            "params": {"merge_method": "squash"}
        }))
        .unwrap();
        assert_eq!(rest.kind(), "rest");
        assert_eq!(rest.declared_repo(), None);
        assert_eq!(rest.transport(), Transport::Api);

        let git: Request = serde_json::from_value(json!({
            "kind": "rest",
            "method": "POST",
            "path": "/git/o/r.git/git-receive-pack"
        }))
        .unwrap();
        assert_eq!(git.transport(), Transport::Git);

        let gql: Request = serde_json::from_value(json!({
            "kind": "graphql",
            "repo": "o/r",
            "query": "{ repository(owner: \"o\", name: \"r\") { id } }",
            "operationName": null
        }))
        .unwrap();
        assert_eq!(gql.declared_repo(), Some("o/r"));

        let cli: Request =
            serde_json::from_value(json!({"kind": "cli", "args": ["pr", "list"], "repo": "o/r"}))
                .unwrap();
        assert_eq!(cli.kind(), "cli");

        assert!(serde_json::from_value::<Request>(json!({"kind": "soap"})).is_err());
    }

    #[test]
    fn test_classify_rest() {
        let request = Request::Rest {
            method: "PUT".into(),
            path: "/repos/Org/App/pulls/1/merge".into(),
            query: None,
            params: Some(json!({"merge_method": "squash"})),
        };
        let classification = classifier().classify(&request).unwrap();
        assert_eq!(classification.repo, RepoId::new("Org", "App"));
        assert_eq!(names(&classification), vec!["pr:merge_squash"]);
    }

    #[test]
    fn test_classify_graphql_union() {
        let request = Request::GraphQl {
            repo: "owner/repo".into(),
            query: r#"mutation {
                addComment(input: {subjectId: "x", body: "b"}) { clientMutationId }
                mergePullRequest(input: {pullRequestId: "x"}) { clientMutationId }
            }"#
            .into(),
            variables: None,
            operation_name: None,
        };
        let classification = classifier().classify(&request).unwrap();
        assert_eq!(
            names(&classification),
            vec!["pr:comment_create", "pr:merge_commit"]
        );
    }

    #[test]
    fn test_classify_cli() {
        let request = Request::Cli {
            args: vec!["sub-issue".into(), "remove".into(), "1".into(), "2".into()],
            repo: "owner/repo".into(),
        };
        let classification = classifier().classify(&request).unwrap();
        assert_eq!(
            names(&classification),
            vec!["issues:read", "subissues:remove"]
        );
    }

    #[test]
    fn test_invalid_declared_repo() {
        let request = Request::Cli {
            args: vec!["pr".into(), "list".into()],
            repo: "not-a-repo".into(),
        };
        assert!(classifier().classify(&request).is_err());
    }

    #[test]
    fn test_empty_action_set_is_an_error() {
        let request = Request::GraphQl {
            repo: "owner/repo".into(),
            query: "{ rateLimit { remaining } }".into(),
            variables: None,
            operation_name: None,
        };
        assert!(classifier().classify(&request).is_err());
    }
}
