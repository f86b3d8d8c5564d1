//! REST and git smart-HTTP classification
//!
//! A static route table keyed on method and path. Paths are concrete
//! (`/repos/{owner}/{repo}/...` or `/git/{owner}/{repo}.git/...`); the
//! target repository is taken from the path. Overlapping routes resolve by
//! table order, first match wins.

use crate::access_control::RepoId;
use crate::error::{ClassificationError, ConfigError};
use regex::Regex;
use serde_json::Value;
use tracing::trace;

const REPO_PREFIX: &str = r"^/repos/(?P<owner>[^/]+)/(?P<repo>[^/]+)";
const GIT_PREFIX: &str = r"^/git/(?P<owner>[^/]+)/(?P<repo>[^/]+?)\.git";

/// Which URL space a route lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Scope {
    Api,
    Git,
}

/// What a matched route resolves to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Fixed(&'static str),
    /// Branches on request parameters or the query string
    Branch(Branch),
}

/// Endpoints whose action depends on a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Branch {
    /// `draft`
    PullCreate,
    /// `state`, then `draft`
    PullUpdate,
    /// `merge_method`
    PullMerge,
    /// `event` on review creation
    ReviewCreate,
    /// `event` on pending review submission
    ReviewSubmit,
    /// `service` query parameter on ref advertisement
    GitInfoRefs,
}

impl Branch {
    /// Every action this branch can produce
    pub const fn actions(self) -> &'static [&'static str] {
        match self {
            Branch::PullCreate => &["pr:create", "pr:create_draft"],
            Branch::PullUpdate => &[
                "pr:close",
                "pr:reopen",
                "pr:convert_to_draft",
                "pr:mark_ready",
                "pr:update",
            ],
            Branch::PullMerge => &["pr:merge_commit", "pr:merge_squash", "pr:merge_rebase"],
            Branch::ReviewCreate => &[
                "pr:approve",
                "pr:request_changes",
                "pr:review_comment_only",
                "pr:review_pending",
            ],
            Branch::ReviewSubmit => &[
                "pr:review_submit_approve",
                "pr:review_submit_request_changes",
                "pr:review_submit_comment",
            ],
            Branch::GitInfoRefs => &["git:read", "git:write"],
        }
    }

    fn resolve(self, params: Option<&Value>, query: Option<&str>) -> &'static str {
        let param = |key: &str| params.and_then(|p| p.get(key));
        let event = || {
            param("event")
                .and_then(Value::as_str)
                .map(str::to_ascii_uppercase)
                .unwrap_or_default()
        };

        match self {
            Branch::PullCreate => {
                if param("draft").and_then(Value::as_bool) == Some(true) {
                    "pr:create_draft"
                } else {
                    "pr:create"
                }
            }
            Branch::PullUpdate => match param("state").and_then(Value::as_str) {
                Some("closed") => "pr:close",
                Some("open") => "pr:reopen",
                _ => match param("draft").and_then(Value::as_bool) {
                    Some(true) => "pr:convert_to_draft",
                    Some(false) => "pr:mark_ready",
                    None => "pr:update",
                },
            },
            Branch::PullMerge => match param("merge_method").and_then(Value::as_str) {
                Some("squash") => "pr:merge_squash",
                Some("rebase") => "pr:merge_rebase",
                _ => "pr:merge_commit",
            },
            Branch::ReviewCreate => match event().as_str() {
                "APPROVE" => "pr:approve",
                "REQUEST_CHANGES" => "pr:request_changes",
                "COMMENT" => "pr:review_comment_only",
                _ => "pr:review_pending",
            },
            Branch::ReviewSubmit => match event().as_str() {
                "APPROVE" => "pr:review_submit_approve",
                "REQUEST_CHANGES" => "pr:review_submit_request_changes",
                _ => "pr:review_submit_comment",
            },
            Branch::GitInfoRefs => {
                let receive = query.is_some_and(|q| {
                    q.split('&').any(|pair| pair == "service=git-receive-pack")
                });
                if receive { "git:write" } else { "git:read" }
            }
        }
    }
}

use Branch::*;
use Target::{Branch as B, Fixed as F};

/// (method, scope, path suffix, target)
const ROUTES: &[(&str, Scope, &str, Target)] = &[
    // metadata
    ("GET", Scope::Api, "", F("metadata:read")),
    ("GET", Scope::Api, "/branches", F("metadata:read")),
    ("GET", Scope::Api, "/branches/[^/]+", F("metadata:read")),
    ("GET", Scope::Api, "/contributors", F("metadata:read")),
    ("GET", Scope::Api, "/languages", F("metadata:read")),
    ("GET", Scope::Api, "/tags", F("metadata:read")),
    ("GET", Scope::Api, "/topics", F("metadata:read")),
    // actions
    ("GET", Scope::Api, "/actions/runs", F("actions:read")),
    ("GET", Scope::Api, r"/actions/runs/\d+", F("actions:read")),
    ("GET", Scope::Api, r"/actions/runs/\d+/jobs", F("actions:read")),
    ("GET", Scope::Api, "/actions/workflows", F("actions:read")),
    // statuses
    ("GET", Scope::Api, "/commits/[^/]+/status", F("statuses:read")),
    ("GET", Scope::Api, "/commits/[^/]+/statuses", F("statuses:read")),
    ("GET", Scope::Api, "/commits/[^/]+/check-runs", F("statuses:read")),
    ("GET", Scope::Api, "/commits/[^/]+/check-suites", F("statuses:read")),
    // code
    ("GET", Scope::Api, "/contents/.*", F("code:read")),
    ("GET", Scope::Api, "/git/refs", F("code:read")),
    ("GET", Scope::Api, "/git/refs/.+", F("code:read")),
    ("GET", Scope::Api, "/git/commits/[^/]+", F("code:read")),
    ("GET", Scope::Api, "/git/trees/[^/]+", F("code:read")),
    ("GET", Scope::Api, "/git/blobs/[^/]+", F("code:read")),
    ("GET", Scope::Api, "/compare/.+", F("code:read")),
    ("PUT", Scope::Api, "/contents/.*", F("code:write")),
    ("DELETE", Scope::Api, "/contents/.*", F("code:write")),
    ("POST", Scope::Api, "/git/refs", F("code:write")),
    ("PATCH", Scope::Api, "/git/refs/.+", F("code:write")),
    // issues
    ("GET", Scope::Api, "/issues", F("issues:read")),
    ("GET", Scope::Api, r"/issues/\d+", F("issues:read")),
    ("GET", Scope::Api, r"/issues/\d+/comments", F("issues:read")),
    ("GET", Scope::Api, r"/issues/\d+/labels", F("issues:read")),
    ("POST", Scope::Api, "/issues", F("issues:write")),
    ("PATCH", Scope::Api, r"/issues/\d+", F("issues:write")),
    ("POST", Scope::Api, r"/issues/\d+/comments", F("issues:write")),
    ("PATCH", Scope::Api, r"/issues/comments/\d+", F("issues:write")),
    ("POST", Scope::Api, r"/issues/\d+/labels", F("issues:write")),
    ("DELETE", Scope::Api, r"/issues/\d+/labels/[^/]+", F("issues:write")),
    // pull requests
    ("GET", Scope::Api, "/pulls", F("pr:list")),
    ("GET", Scope::Api, r"/pulls/\d+", F("pr:get")),
    ("GET", Scope::Api, r"/pulls/\d+/commits", F("pr:commits")),
    ("GET", Scope::Api, r"/pulls/\d+/files", F("pr:files")),
    ("GET", Scope::Api, r"/pulls/\d+/merge", F("pr:merge_status")),
    ("POST", Scope::Api, "/pulls", B(PullCreate)),
    ("PATCH", Scope::Api, r"/pulls/\d+", B(PullUpdate)),
    ("PUT", Scope::Api, r"/pulls/\d+/update-branch", F("pr:update_branch")),
    ("PUT", Scope::Api, r"/pulls/\d+/merge", B(PullMerge)),
    // conversation comments (issues API)
    ("GET", Scope::Api, "/issues/comments", F("pr:comment_list_all")),
    ("GET", Scope::Api, r"/issues/comments/\d+", F("pr:comment_get")),
    ("DELETE", Scope::Api, r"/issues/comments/\d+", F("pr:comment_delete")),
    // review comments
    ("GET", Scope::Api, "/pulls/comments", F("pr:review_comment_list_all")),
    ("GET", Scope::Api, r"/pulls/\d+/comments", F("pr:review_comment_list")),
    ("GET", Scope::Api, r"/pulls/comments/\d+", F("pr:review_comment_get")),
    ("POST", Scope::Api, r"/pulls/\d+/comments", F("pr:review_comment_create")),
    ("PATCH", Scope::Api, r"/pulls/comments/\d+", F("pr:review_comment_update")),
    ("DELETE", Scope::Api, r"/pulls/comments/\d+", F("pr:review_comment_delete")),
    (
        "POST",
        Scope::Api,
        r"/pulls/\d+/comments/\d+/replies",
        F("pr:review_comment_reply"),
    ),
    // reviews
    ("GET", Scope::Api, r"/pulls/\d+/reviews", F("pr:review_list")),
    ("GET", Scope::Api, r"/pulls/\d+/reviews/\d+", F("pr:review_get")),
    ("POST", Scope::Api, r"/pulls/\d+/reviews", B(ReviewCreate)),
    ("PUT", Scope::Api, r"/pulls/\d+/reviews/\d+", F("pr:review_update")),
    ("DELETE", Scope::Api, r"/pulls/\d+/reviews/\d+", F("pr:review_delete")),
    ("GET", Scope::Api, r"/pulls/\d+/reviews/\d+/comments", F("pr:review_comments")),
    ("PUT", Scope::Api, r"/pulls/\d+/reviews/\d+/dismissals", F("pr:review_dismiss")),
    ("POST", Scope::Api, r"/pulls/\d+/reviews/\d+/events", B(ReviewSubmit)),
    // review requests
    ("GET", Scope::Api, r"/pulls/\d+/requested_reviewers", F("pr:reviewer_list")),
    ("POST", Scope::Api, r"/pulls/\d+/requested_reviewers", F("pr:reviewer_request")),
    ("DELETE", Scope::Api, r"/pulls/\d+/requested_reviewers", F("pr:reviewer_remove")),
    // git smart-HTTP
    ("GET", Scope::Git, "/info/refs", B(GitInfoRefs)),
    ("POST", Scope::Git, "/git-upload-pack", F("git:read")),
    ("POST", Scope::Git, "/git-receive-pack", F("git:write")),
];

#[derive(Debug, Clone)]
struct Route {
    method: &'static str,
    regex: Regex,
    target: Target,
}

/// Compiled REST route table
#[derive(Debug, Clone)]
pub struct RestClassifier {
    routes: Vec<Route>,
}

impl RestClassifier {
    /// Compile the route table
    pub fn new() -> Result<Self, ConfigError> {
        let routes = ROUTES
            .iter()
            .map(|&(method, scope, suffix, target)| {
                let prefix = match scope {
                    Scope::Api => REPO_PREFIX,
                    Scope::Git => GIT_PREFIX,
                };
                let pattern = format!("{}{}$", prefix, suffix);
                let regex = Regex::new(&pattern).map_err(|e| ConfigError::InvalidPattern {
                    pattern: pattern.clone(),
                    reason: e.to_string(),
                })?;
                Ok(Route {
                    method,
                    regex,
                    target,
                })
            })
            .collect::<Result<Vec<_>, ConfigError>>()?;

        Ok(Self { routes })
    }

    /// Every action name the table can produce
    pub fn referenced_actions() -> impl Iterator<Item = &'static str> {
        ROUTES
            .iter()
            .flat_map(|(_, _, _, target)| match target {
                Target::Fixed(action) => std::slice::from_ref(action),
                Target::Branch(branch) => branch.actions(),
            })
            .copied()
    }

    /// Classify a REST request into its target repository and action.
    ///
    /// `path` may carry a query string, which is merged with `query`.
    pub fn classify(
        &self,
        method: &str,
        path: &str,
        query: Option<&str>,
        params: Option<&Value>,
    ) -> Result<(RepoId, &'static str), ClassificationError> {
        let method = method.to_ascii_uppercase();
        let (path, inline_query) = match path.split_once('?') {
            Some((p, q)) => (p, Some(q)),
            None => (path, None),
        };
        let query = query.or(inline_query);

        if !is_canonical(path) {
            return Err(ClassificationError::unknown_endpoint(&method, path));
        }

        for route in self.routes.iter().filter(|r| r.method == method) {
            let Some(caps) = route.regex.captures(path) else {
                continue;
            };

            let (Some(owner), Some(repo)) = (caps.name("owner"), caps.name("repo")) else {
                continue;
            };

            let action = match route.target {
                Target::Fixed(action) => action,
                Target::Branch(branch) => branch.resolve(params, query),
            };

            trace!(method = %method, path, action, "Matched REST route");
            return Ok((RepoId::new(owner.as_str(), repo.as_str()), action));
        }

        Err(ClassificationError::unknown_endpoint(&method, path))
    }
}

/// No encoded separators or backslashes, and no empty or dot segments
fn is_canonical(path: &str) -> bool {
    let lower = path.to_ascii_lowercase();
    if ["%2f", "%2e", "%5c", "\\"].iter().any(|s| lower.contains(s)) {
        return false;
    }
    path.strip_prefix('/')
        .unwrap_or(path)
        .split('/')
        .all(|segment| !matches!(segment, "" | "." | ".."))
}
