//! GraphQL document analysis
//!
//! Maps a parsed document onto the actions it would perform. Only a
//! documented, enumerable shape is supported:
//!
//! - mutations listed in [`MUTATIONS`], with shallow payload selections
//! - queries rooted at `repository(owner:, name:)` for the declared repository
//!
//! Below either root every field must appear in its parent's field table.
//! Everything else fails classification. Every operation in the document
//! contributes to the required set, not just the one named for execution.

use crate::access_control::RepoId;
use crate::classifier::graphql::document::{
    Document, Field, Fragment, Operation, OperationKind, Selection, Value,
};
use crate::error::ClassificationError;
use serde_json::{Map, Value as Json};
use std::collections::{BTreeSet, HashMap};

/// Maximum depth of a mutation payload selection
const MAX_PAYLOAD_DEPTH: usize = 3;

/// Maximum depth below `repository`
const MAX_QUERY_DEPTH: usize = 8;

/// Query root fields that carry no repository data
const IGNORED_QUERY_ROOTS: &[&str] = &["__typename", "rateLimit"];

/// How a mutation resolves to an action
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    Fixed(&'static str),
    /// `input.mergeMethod`
    MergeMethod,
    /// `input.event` on review creation
    ReviewEvent,
    /// `input.event` on pending review submission
    SubmitEvent,
    /// `input.draft`
    CreateDraft,
}

impl Mutation {
    pub const fn actions(self) -> &'static [&'static str] {
        match self {
            Mutation::Fixed(_) => &[],
            Mutation::MergeMethod => &["pr:merge_commit", "pr:merge_squash", "pr:merge_rebase"],
            Mutation::ReviewEvent => &[
                "pr:approve",
                "pr:request_changes",
                "pr:review_comment_only",
                "pr:review_pending",
            ],
            Mutation::SubmitEvent => &[
                "pr:review_submit_approve",
                "pr:review_submit_request_changes",
                "pr:review_submit_comment",
            ],
            Mutation::CreateDraft => &["pr:create", "pr:create_draft"],
        }
    }
}

use Mutation::{CreateDraft, Fixed, MergeMethod, ReviewEvent, SubmitEvent};

/// Supported mutations. Node-ID mutations are attributed to the declared repository.
pub const MUTATIONS: &[(&str, Mutation)] = &[
    // pull requests
    ("createPullRequest", CreateDraft),
    ("updatePullRequest", Fixed("pr:update")),
    ("closePullRequest", Fixed("pr:close")),
    ("reopenPullRequest", Fixed("pr:reopen")),
    ("convertPullRequestToDraft", Fixed("pr:convert_to_draft")),
    ("markPullRequestReadyForReview", Fixed("pr:mark_ready")),
    ("updatePullRequestBranch", Fixed("pr:update_branch")),
    ("mergePullRequest", MergeMethod),
    ("enablePullRequestAutoMerge", Fixed("pr:auto_merge_enable")),
    ("disablePullRequestAutoMerge", Fixed("pr:auto_merge_disable")),
    ("enqueuePullRequest", Fixed("pr:merge_queue_enqueue")),
    ("dequeuePullRequest", Fixed("pr:merge_queue_dequeue")),
    ("markFileAsViewed", Fixed("pr:file_viewed_mark")),
    ("unmarkFileAsViewed", Fixed("pr:file_viewed_unmark")),
    ("resolveReviewThread", Fixed("pr:review_thread_resolve")),
    ("unresolveReviewThread", Fixed("pr:review_thread_unresolve")),
    ("revertPullRequest", Fixed("pr:revert")),
    ("addComment", Fixed("pr:comment_create")),
    ("updateIssueComment", Fixed("pr:comment_update")),
    ("deleteIssueComment", Fixed("pr:comment_delete")),
    ("addPullRequestReview", ReviewEvent),
    ("submitPullRequestReview", SubmitEvent),
    ("updatePullRequestReview", Fixed("pr:review_update")),
    ("deletePullRequestReview", Fixed("pr:review_delete")),
    ("dismissPullRequestReview", Fixed("pr:review_dismiss")),
    ("addPullRequestReviewComment", Fixed("pr:review_comment_create")),
    ("addPullRequestReviewThread", Fixed("pr:review_comment_create")),
    ("updatePullRequestReviewComment", Fixed("pr:review_comment_update")),
    ("deletePullRequestReviewComment", Fixed("pr:review_comment_delete")),
    ("addPullRequestReviewThreadReply", Fixed("pr:review_comment_reply")),
    ("requestReviews", Fixed("pr:reviewer_request")),
    // issues
    ("createIssue", Fixed("issues:write")),
    ("updateIssue", Fixed("issues:write")),
    ("closeIssue", Fixed("issues:write")),
    ("reopenIssue", Fixed("issues:write")),
    ("addLabelsToLabelable", Fixed("issues:write")),
    ("removeLabelsFromLabelable", Fixed("issues:write")),
    // sub-issues
    ("addSubIssue", Fixed("subissues:add")),
    ("removeSubIssue", Fixed("subissues:remove")),
    ("reprioritizeSubIssue", Fixed("subissues:reprioritize")),
    // discussions
    ("createDiscussion", Fixed("discussions:create")),
    ("updateDiscussion", Fixed("discussions:update")),
    ("deleteDiscussion", Fixed("discussions:delete")),
    ("closeDiscussion", Fixed("discussions:close")),
    ("reopenDiscussion", Fixed("discussions:reopen")),
    ("addDiscussionComment", Fixed("discussions:comment_add")),
    ("updateDiscussionComment", Fixed("discussions:comment_edit")),
    ("deleteDiscussionComment", Fixed("discussions:comment_delete")),
    ("markDiscussionCommentAsAnswer", Fixed("discussions:answer")),
    ("unmarkDiscussionCommentAsAnswer", Fixed("discussions:unanswer")),
    ("addDiscussionPollVote", Fixed("discussions:poll_vote")),
];

/// Object types with a known field table.
///
/// A field missing from its parent's table fails classification, so every
/// table is an allowlist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Entity {
    Repository,
    PullRequest,
    PullRequestCommit,
    ChangedFile,
    ReviewRequest,
    Review,
    ReviewThread,
    Comment,
    Issue,
    SubIssuesSummary,
    Discussion,
    Actor,
    Label,
    Milestone,
    /// Languages, licenses, topics and discussion categories
    Named,
    RepositoryTopic,
    Ref,
    GitObject,
    GitActor,
    TreeEntry,
    PageInfo,
    /// Fields of any supported mutation payload
    Payload,
}

/// What a field yields
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Shape {
    /// A leaf; any selection below it fails
    Scalar,
    Object(Entity),
    /// `nodes`, `edges`, `totalCount` and `pageInfo` over the entity
    Connection(Entity),
    /// `node` and `cursor`
    Edge(Entity),
}

#[derive(Debug, Clone, Copy)]
struct FieldRule {
    name: &'static str,
    action: Option<&'static str>,
    shape: Shape,
}

const fn scalar(name: &'static str) -> FieldRule {
    FieldRule {
        name,
        action: None,
        shape: Shape::Scalar,
    }
}

const fn object(name: &'static str, entity: Entity) -> FieldRule {
    FieldRule {
        name,
        action: None,
        shape: Shape::Object(entity),
    }
}

const fn connection(name: &'static str, entity: Entity) -> FieldRule {
    FieldRule {
        name,
        action: None,
        shape: Shape::Connection(entity),
    }
}

/// Selecting `rule` requires `action`
const fn guarded(action: &'static str, rule: FieldRule) -> FieldRule {
    FieldRule {
        action: Some(action),
        ..rule
    }
}

const META: &str = "metadata:read";

const REPOSITORY_FIELDS: &[FieldRule] = &[
    guarded("pr:list", connection("pullRequests", Entity::PullRequest)),
    guarded("pr:get", object("pullRequest", Entity::PullRequest)),
    guarded("issues:read", connection("issues", Entity::Issue)),
    guarded("issues:read", object("issue", Entity::Issue)),
    guarded("issues:read", connection("labels", Entity::Label)),
    guarded("issues:read", object("label", Entity::Label)),
    guarded("issues:read", connection("milestones", Entity::Milestone)),
    guarded("issues:read", object("milestone", Entity::Milestone)),
    guarded("discussions:list", connection("discussions", Entity::Discussion)),
    guarded("discussions:list", connection("discussionCategories", Entity::Named)),
    guarded("discussions:get", object("discussion", Entity::Discussion)),
    guarded("code:read", connection("refs", Entity::Ref)),
    guarded("code:read", object("ref", Entity::Ref)),
    guarded("code:read", object("object", Entity::GitObject)),
    guarded(META, object("defaultBranchRef", Entity::Ref)),
    guarded(META, object("owner", Entity::Actor)),
    guarded(META, object("primaryLanguage", Entity::Named)),
    guarded(META, connection("languages", Entity::Named)),
    guarded(META, object("licenseInfo", Entity::Named)),
    guarded(META, connection("repositoryTopics", Entity::RepositoryTopic)),
    guarded(META, scalar("id")),
    guarded(META, scalar("name")),
    guarded(META, scalar("nameWithOwner")),
    guarded(META, scalar("description")),
    guarded(META, scalar("url")),
    guarded(META, scalar("homepageUrl")),
    guarded(META, scalar("isPrivate")),
    guarded(META, scalar("isFork")),
    guarded(META, scalar("isArchived")),
    guarded(META, scalar("isTemplate")),
    guarded(META, scalar("visibility")),
    guarded(META, scalar("createdAt")),
    guarded(META, scalar("updatedAt")),
    guarded(META, scalar("pushedAt")),
    guarded(META, scalar("stargazerCount")),
    guarded(META, scalar("forkCount")),
    guarded(META, scalar("hasIssuesEnabled")),
    guarded(META, scalar("hasDiscussionsEnabled")),
    guarded(META, scalar("hasWikiEnabled")),
    guarded(META, scalar("viewerPermission")),
];

const PULL_REQUEST_FIELDS: &[FieldRule] = &[
    guarded("pr:review_list", connection("reviews", Entity::Review)),
    guarded("pr:review_list", connection("latestReviews", Entity::Review)),
    guarded("pr:comment_list", connection("comments", Entity::Comment)),
    guarded(
        "pr:review_comment_list",
        connection("reviewThreads", Entity::ReviewThread),
    ),
    guarded("pr:commits", connection("commits", Entity::PullRequestCommit)),
    guarded("pr:files", connection("files", Entity::ChangedFile)),
    guarded(
        "pr:reviewer_list",
        connection("reviewRequests", Entity::ReviewRequest),
    ),
    guarded("pr:merge_status", scalar("mergeable")),
    guarded("pr:merge_status", scalar("mergeStateStatus")),
    object("author", Entity::Actor),
    object("mergedBy", Entity::Actor),
    connection("assignees", Entity::Actor),
    connection("labels", Entity::Label),
    object("milestone", Entity::Milestone),
    scalar("id"),
    scalar("databaseId"),
    scalar("number"),
    scalar("title"),
    scalar("body"),
    scalar("bodyText"),
    scalar("state"),
    scalar("url"),
    scalar("isDraft"),
    scalar("locked"),
    scalar("merged"),
    scalar("mergedAt"),
    scalar("closed"),
    scalar("closedAt"),
    scalar("createdAt"),
    scalar("updatedAt"),
    scalar("additions"),
    scalar("deletions"),
    scalar("changedFiles"),
    scalar("headRefName"),
    scalar("headRefOid"),
    scalar("baseRefName"),
    scalar("baseRefOid"),
    scalar("reviewDecision"),
];

const PULL_REQUEST_COMMIT_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("url"),
    object("commit", Entity::GitObject),
];

const CHANGED_FILE_FIELDS: &[FieldRule] = &[
    scalar("path"),
    scalar("additions"),
    scalar("deletions"),
    scalar("changeType"),
    scalar("viewerViewedState"),
];

const REVIEW_REQUEST_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("asCodeOwner"),
    object("requestedReviewer", Entity::Actor),
];

const REVIEW_FIELDS: &[FieldRule] = &[
    guarded("pr:review_comments", connection("comments", Entity::Comment)),
    object("author", Entity::Actor),
    scalar("id"),
    scalar("databaseId"),
    scalar("state"),
    scalar("body"),
    scalar("bodyText"),
    scalar("url"),
    scalar("createdAt"),
    scalar("submittedAt"),
];

const REVIEW_THREAD_FIELDS: &[FieldRule] = &[
    connection("comments", Entity::Comment),
    object("resolvedBy", Entity::Actor),
    scalar("id"),
    scalar("isResolved"),
    scalar("isOutdated"),
    scalar("path"),
    scalar("line"),
    scalar("startLine"),
    scalar("diffSide"),
];

/// Issue, pull request, review and discussion comments
const COMMENT_FIELDS: &[FieldRule] = &[
    object("author", Entity::Actor),
    connection("replies", Entity::Comment),
    scalar("id"),
    scalar("databaseId"),
    scalar("body"),
    scalar("bodyText"),
    scalar("url"),
    scalar("createdAt"),
    scalar("updatedAt"),
    scalar("isMinimized"),
    scalar("isAnswer"),
    scalar("upvoteCount"),
    scalar("path"),
    scalar("line"),
    scalar("diffHunk"),
];

const ISSUE_FIELDS: &[FieldRule] = &[
    guarded("subissues:list", connection("subIssues", Entity::Issue)),
    guarded(
        "subissues:list",
        object("subIssuesSummary", Entity::SubIssuesSummary),
    ),
    guarded("subissues:parent", object("parent", Entity::Issue)),
    object("author", Entity::Actor),
    connection("assignees", Entity::Actor),
    connection("labels", Entity::Label),
    connection("comments", Entity::Comment),
    object("milestone", Entity::Milestone),
    scalar("id"),
    scalar("databaseId"),
    scalar("number"),
    scalar("title"),
    scalar("body"),
    scalar("bodyText"),
    scalar("state"),
    scalar("stateReason"),
    scalar("url"),
    scalar("locked"),
    scalar("closed"),
    scalar("closedAt"),
    scalar("createdAt"),
    scalar("updatedAt"),
];

const SUB_ISSUES_SUMMARY_FIELDS: &[FieldRule] = &[
    scalar("total"),
    scalar("completed"),
    scalar("percentCompleted"),
];

const DISCUSSION_FIELDS: &[FieldRule] = &[
    guarded(
        "discussions:comment_list",
        connection("comments", Entity::Comment),
    ),
    object("author", Entity::Actor),
    object("answer", Entity::Comment),
    object("category", Entity::Named),
    connection("labels", Entity::Label),
    scalar("id"),
    scalar("number"),
    scalar("title"),
    scalar("body"),
    scalar("bodyText"),
    scalar("url"),
    scalar("locked"),
    scalar("closed"),
    scalar("closedAt"),
    scalar("isAnswered"),
    scalar("upvoteCount"),
    scalar("createdAt"),
    scalar("updatedAt"),
];

/// Users, organizations, bots and teams, identity only
const ACTOR_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("login"),
    scalar("name"),
    scalar("slug"),
    scalar("url"),
    scalar("avatarUrl"),
];

const LABEL_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("name"),
    scalar("color"),
    scalar("description"),
    scalar("isDefault"),
    scalar("url"),
];

const MILESTONE_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("number"),
    scalar("title"),
    scalar("description"),
    scalar("state"),
    scalar("closed"),
    scalar("dueOn"),
    scalar("url"),
];

const NAMED_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("name"),
    scalar("color"),
    scalar("description"),
    scalar("url"),
    scalar("key"),
    scalar("spdxId"),
    scalar("slug"),
    scalar("emoji"),
    scalar("isAnswerable"),
];

const REPOSITORY_TOPIC_FIELDS: &[FieldRule] = &[
    scalar("id"),
    scalar("url"),
    object("topic", Entity::Named),
];

/// `target` is commit data and needs `code:read` even under `defaultBranchRef`
const REF_FIELDS: &[FieldRule] = &[
    guarded("code:read", object("target", Entity::GitObject)),
    scalar("id"),
    scalar("name"),
    scalar("prefix"),
];

/// Commits, trees and blobs, reached only through `code:read` fields
const GIT_OBJECT_FIELDS: &[FieldRule] = &[
    object("author", Entity::GitActor),
    object("committer", Entity::GitActor),
    object("entries", Entity::TreeEntry),
    scalar("id"),
    scalar("oid"),
    scalar("abbreviatedOid"),
    scalar("url"),
    scalar("commitUrl"),
    scalar("message"),
    scalar("messageHeadline"),
    scalar("committedDate"),
    scalar("authoredDate"),
    scalar("text"),
    scalar("byteSize"),
    scalar("isBinary"),
    scalar("isTruncated"),
];

const GIT_ACTOR_FIELDS: &[FieldRule] = &[scalar("name"), scalar("email"), scalar("date")];

const TREE_ENTRY_FIELDS: &[FieldRule] = &[
    scalar("name"),
    scalar("path"),
    scalar("type"),
    scalar("mode"),
    scalar("oid"),
];

const PAGE_INFO_FIELDS: &[FieldRule] = &[
    scalar("hasNextPage"),
    scalar("hasPreviousPage"),
    scalar("startCursor"),
    scalar("endCursor"),
];

/// Payload objects are the ones the mutation touched; their guarded
/// fields still add actions.
const PAYLOAD_FIELDS: &[FieldRule] = &[
    scalar("clientMutationId"),
    object("pullRequest", Entity::PullRequest),
    object("revertPullRequest", Entity::PullRequest),
    object("issue", Entity::Issue),
    object("subIssue", Entity::Issue),
    object("comment", Entity::Comment),
    object("pullRequestReviewComment", Entity::Comment),
    FieldRule {
        name: "commentEdge",
        action: None,
        shape: Shape::Edge(Entity::Comment),
    },
    object("pullRequestReview", Entity::Review),
    object("review", Entity::Review),
    object("thread", Entity::ReviewThread),
    object("discussion", Entity::Discussion),
];

const ENTITIES: &[Entity] = &[
    Entity::Repository,
    Entity::PullRequest,
    Entity::PullRequestCommit,
    Entity::ChangedFile,
    Entity::ReviewRequest,
    Entity::Review,
    Entity::ReviewThread,
    Entity::Comment,
    Entity::Issue,
    Entity::SubIssuesSummary,
    Entity::Discussion,
    Entity::Actor,
    Entity::Label,
    Entity::Milestone,
    Entity::Named,
    Entity::RepositoryTopic,
    Entity::Ref,
    Entity::GitObject,
    Entity::GitActor,
    Entity::TreeEntry,
    Entity::PageInfo,
    Entity::Payload,
];

impl Entity {
    fn rules(self) -> &'static [FieldRule] {
        match self {
            Entity::Repository => REPOSITORY_FIELDS,
            Entity::PullRequest => PULL_REQUEST_FIELDS,
            Entity::PullRequestCommit => PULL_REQUEST_COMMIT_FIELDS,
            Entity::ChangedFile => CHANGED_FILE_FIELDS,
            Entity::ReviewRequest => REVIEW_REQUEST_FIELDS,
            Entity::Review => REVIEW_FIELDS,
            Entity::ReviewThread => REVIEW_THREAD_FIELDS,
            Entity::Comment => COMMENT_FIELDS,
            Entity::Issue => ISSUE_FIELDS,
            Entity::SubIssuesSummary => SUB_ISSUES_SUMMARY_FIELDS,
            Entity::Discussion => DISCUSSION_FIELDS,
            Entity::Actor => ACTOR_FIELDS,
            Entity::Label => LABEL_FIELDS,
            Entity::Milestone => MILESTONE_FIELDS,
            Entity::Named => NAMED_FIELDS,
            Entity::RepositoryTopic => REPOSITORY_TOPIC_FIELDS,
            Entity::Ref => REF_FIELDS,
            Entity::GitObject => GIT_OBJECT_FIELDS,
            Entity::GitActor => GIT_ACTOR_FIELDS,
            Entity::TreeEntry => TREE_ENTRY_FIELDS,
            Entity::PageInfo => PAGE_INFO_FIELDS,
            Entity::Payload => PAYLOAD_FIELDS,
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Entity::Repository => "repository field",
            Entity::Payload => "mutation payload field",
            _ => "field",
        }
    }
}

impl Shape {
    /// The rule for `name` selected below this shape
    fn field(self, name: &str) -> Option<FieldRule> {
        match self {
            Shape::Scalar => None,
            Shape::Object(entity) => entity.rules().iter().find(|r| r.name == name).copied(),
            Shape::Connection(entity) => match name {
                "nodes" => Some(object("nodes", entity)),
                "edges" => Some(FieldRule {
                    name: "edges",
                    action: None,
                    shape: Shape::Edge(entity),
                }),
                "pageInfo" => Some(object("pageInfo", Entity::PageInfo)),
                "totalCount" => Some(scalar("totalCount")),
                _ => None,
            },
            Shape::Edge(entity) => match name {
                "node" => Some(object("node", entity)),
                "cursor" => Some(scalar("cursor")),
                _ => None,
            },
        }
    }

    fn kind(self) -> &'static str {
        match self {
            Shape::Scalar => "scalar field",
            Shape::Object(entity) => entity.kind(),
            Shape::Connection(_) => "connection field",
            Shape::Edge(_) => "edge field",
        }
    }
}

/// Every action name the analysis can produce
pub fn referenced_actions() -> impl Iterator<Item = &'static str> {
    let mutations = MUTATIONS.iter().flat_map(|(_, mutation)| match mutation {
        Mutation::Fixed(action) => std::slice::from_ref(action),
        other => other.actions(),
    });
    let fields = ENTITIES
        .iter()
        .flat_map(|entity| entity.rules())
        .filter_map(|rule| rule.action.as_ref());
    mutations.chain(fields).copied()
}

/// Analyze a parsed document for the declared repository
pub fn analyze(
    document: &Document,
    variables: Option<&Json>,
    operation_name: Option<&str>,
    repo: &RepoId,
) -> Result<BTreeSet<&'static str>, ClassificationError> {
    let variables = match variables {
        None | Some(Json::Null) => None,
        Some(Json::Object(map)) => Some(map),
        Some(_) => return Err(ClassificationError::new("GraphQL variables must be an object")),
    };

    let mut fragments = HashMap::new();
    for fragment in document.fragments() {
        if fragments.insert(fragment.name.as_str(), fragment).is_some() {
            return Err(ClassificationError::new(format!(
                "duplicate GraphQL fragment '{}'",
                fragment.name
            )));
        }
    }

    if document.operations().next().is_none() {
        return Err(ClassificationError::new(
            "GraphQL document contains no operations",
        ));
    }

    if let Some(name) = operation_name
        && !document
            .operations()
            .any(|op| op.name.as_deref() == Some(name))
    {
        return Err(ClassificationError::new(format!(
            "GraphQL operation '{}' not found in document",
            name
        )));
    }

    let analyzer = Analyzer {
        fragments,
        variables,
        repo,
    };

    let mut actions = BTreeSet::new();
    for operation in document.operations() {
        let scope = Scope {
            analyzer: &analyzer,
            operation,
        };
        match operation.kind {
            OperationKind::Query => scope.query(&mut actions)?,
            OperationKind::Mutation => scope.mutation(&mut actions)?,
            OperationKind::Subscription => {
                return Err(ClassificationError::unknown_field(
                    "operation type",
                    operation.kind.as_str(),
                ));
            }
        }
    }

    Ok(actions)
}

struct Analyzer<'a> {
    fragments: HashMap<&'a str, &'a Fragment>,
    variables: Option<&'a Map<String, Json>>,
    repo: &'a RepoId,
}

/// One operation being analyzed, for variable resolution
struct Scope<'s, 'a> {
    analyzer: &'s Analyzer<'a>,
    operation: &'a Operation,
}

impl<'s, 'a> Scope<'s, 'a> {
    /// Top-level fields of the operation. Fragments are not accepted here.
    fn root_fields(&self) -> Result<Vec<&'a Field>, ClassificationError> {
        self.operation
            .selection_set
            .iter()
            .map(|selection| match selection {
                Selection::Field(field) => Ok(field),
                _ => Err(ClassificationError::new(format!(
                    "fragments at the top level of a {} are not supported",
                    self.operation.kind.as_str()
                ))),
            })
            .collect()
    }

    fn mutation(&self, actions: &mut BTreeSet<&'static str>) -> Result<(), ClassificationError> {
        for field in self.root_fields()? {
            if field.name == "__typename" {
                continue;
            }

            let mutation = MUTATIONS
                .iter()
                .find(|(name, _)| *name == field.name)
                .map(|(_, m)| *m)
                .ok_or_else(|| ClassificationError::unknown_field("mutation", &field.name))?;

            self.walk(
                &field.selection_set,
                Shape::Object(Entity::Payload),
                1,
                MAX_PAYLOAD_DEPTH,
                &mut Vec::new(),
                actions,
            )?;
            actions.insert(self.resolve_mutation(field, mutation)?);
        }
        Ok(())
    }

    fn resolve_mutation(
        &self,
        field: &Field,
        mutation: Mutation,
    ) -> Result<&'static str, ClassificationError> {
        let unsupported = |value: &Json| {
            ClassificationError::new(format!(
                "unsupported value {} in {} input",
                value, field.name
            ))
        };

        match mutation {
            Mutation::Fixed(action) => Ok(action),
            Mutation::MergeMethod => match self.input_field(field, "mergeMethod")? {
                None => Ok("pr:merge_commit"),
                Some(Json::String(m)) if m == "MERGE" => Ok("pr:merge_commit"),
                Some(Json::String(m)) if m == "SQUASH" => Ok("pr:merge_squash"),
                Some(Json::String(m)) if m == "REBASE" => Ok("pr:merge_rebase"),
                Some(other) => Err(unsupported(&other)),
            },
            Mutation::ReviewEvent => match self.input_field(field, "event")? {
                None => Ok("pr:review_pending"),
                Some(Json::String(e)) if e == "APPROVE" => Ok("pr:approve"),
                Some(Json::String(e)) if e == "REQUEST_CHANGES" => Ok("pr:request_changes"),
                Some(Json::String(e)) if e == "COMMENT" => Ok("pr:review_comment_only"),
                Some(other) => Err(unsupported(&other)),
            },
            Mutation::SubmitEvent => match self.input_field(field, "event")? {
                Some(Json::String(e)) if e == "APPROVE" => Ok("pr:review_submit_approve"),
                Some(Json::String(e)) if e == "REQUEST_CHANGES" => {
                    Ok("pr:review_submit_request_changes")
                }
                Some(Json::String(e)) if e == "COMMENT" => Ok("pr:review_submit_comment"),
                Some(other) => Err(unsupported(&other)),
                None => Err(ClassificationError::new(format!(
                    "{} requires an event",
                    field.name
                ))),
            },
            Mutation::CreateDraft => match self.input_field(field, "draft")? {
                Some(Json::Bool(true)) => Ok("pr:create_draft"),
                _ => Ok("pr:create"),
            },
        }
    }

    /// A key of the `input` argument, with variables substituted
    fn input_field(&self, field: &Field, key: &str) -> Result<Option<Json>, ClassificationError> {
        let unresolved = || {
            ClassificationError::new(format!("cannot resolve 'input' of {}", field.name))
        };

        let input = field.argument("input").ok_or_else(unresolved)?;
        match self.resolve(input).ok_or_else(unresolved)? {
            Json::Object(mut map) => Ok(map.remove(key).filter(|v| !v.is_null())),
            _ => Err(unresolved()),
        }
    }

    fn query(&self, actions: &mut BTreeSet<&'static str>) -> Result<(), ClassificationError> {
        for field in self.root_fields()? {
            if IGNORED_QUERY_ROOTS.contains(&field.name.as_str()) {
                continue;
            }
            if field.name != "repository" {
                return Err(ClassificationError::unknown_field("query field", &field.name));
            }

            self.check_repository(field)?;
            self.walk(
                &field.selection_set,
                Shape::Object(Entity::Repository),
                1,
                MAX_QUERY_DEPTH,
                &mut Vec::new(),
                actions,
            )?;
        }
        Ok(())
    }

    /// `repository(owner:, name:)` must address the declared repository
    fn check_repository(&self, field: &Field) -> Result<(), ClassificationError> {
        let arg = |name: &str| match field.argument(name).and_then(|v| self.resolve(v)) {
            Some(Json::String(s)) => Ok(s),
            _ => Err(ClassificationError::new(format!(
                "cannot resolve repository argument '{}'",
                name
            ))),
        };

        let requested = RepoId::new(arg("owner")?, arg("name")?);
        if !requested.same_as(self.analyzer.repo) {
            return Err(ClassificationError::repository_mismatch(
                &requested.full_name(),
                &self.analyzer.repo.full_name(),
            ));
        }
        Ok(())
    }

    /// Classify a selection set under `shape`, collecting actions
    fn walk(
        &self,
        selections: &'a [Selection],
        shape: Shape,
        depth: usize,
        limit: usize,
        active: &mut Vec<&'a str>,
        actions: &mut BTreeSet<&'static str>,
    ) -> Result<(), ClassificationError> {
        if selections.is_empty() {
            return Ok(());
        }
        if depth > limit {
            return Err(ClassificationError::new(
                "GraphQL selection is nested too deeply to classify",
            ));
        }

        for selection in selections {
            match selection {
                Selection::Field(field) => {
                    self.walk_field(field, shape, depth, limit, active, actions)?
                }
                Selection::InlineFragment { selection_set, .. } => {
                    self.walk(selection_set, shape, depth, limit, active, actions)?
                }
                Selection::FragmentSpread(name) => {
                    let fragment: &'a Fragment = *self
                        .analyzer
                        .fragments
                        .get(name.as_str())
                        .ok_or_else(|| ClassificationError::unknown_field("fragment", name))?;
                    if active.contains(&name.as_str()) {
                        return Err(ClassificationError::new(format!(
                            "GraphQL fragment '{}' spreads itself",
                            name
                        )));
                    }
                    active.push(name.as_str());
                    self.walk(&fragment.selection_set, shape, depth, limit, active, actions)?;
                    active.pop();
                }
            }
        }
        Ok(())
    }

    fn walk_field(
        &self,
        field: &'a Field,
        shape: Shape,
        depth: usize,
        limit: usize,
        active: &mut Vec<&'a str>,
        actions: &mut BTreeSet<&'static str>,
    ) -> Result<(), ClassificationError> {
        let name = field.name.as_str();
        if name == "__typename" {
            return Ok(());
        }

        let rule = shape
            .field(name)
            .ok_or_else(|| ClassificationError::unknown_field(shape.kind(), name))?;
        if let Some(action) = rule.action {
            actions.insert(action);
        }

        match (rule.shape, field.selection_set.is_empty()) {
            (Shape::Scalar, true) => Ok(()),
            (Shape::Scalar, false) => Err(ClassificationError::new(format!(
                "GraphQL field '{}' is a leaf and takes no selection",
                name
            ))),
            (_, true) => Err(ClassificationError::new(format!(
                "GraphQL field '{}' requires a selection",
                name
            ))),
            (child, false) => {
                self.walk(&field.selection_set, child, depth + 1, limit, active, actions)
            }
        }
    }

    /// Convert a document value to JSON, substituting variables.
    ///
    /// `None` if a variable is neither supplied nor defaulted.
    fn resolve(&self, value: &Value) -> Option<Json> {
        Some(match value {
            Value::Variable(name) => {
                if let Some(v) = self.analyzer.variables.and_then(|vars| vars.get(name)) {
                    return Some(v.clone());
                }
                return self
                    .operation
                    .variable_default(name)
                    .and_then(|default| self.resolve(default));
            }
            Value::Int(n) => n.parse::<i64>().ok().map(Json::from)?,
            Value::Float(n) => n
                .parse::<f64>()
                .ok()
                .and_then(serde_json::Number::from_f64)
                .map(Json::Number)?,
            Value::String(s) | Value::Enum(s) => Json::String(s.clone()),
            Value::Boolean(b) => Json::Bool(*b),
            Value::Null => Json::Null,
            Value::List(items) => Json::Array(
                items
                    .iter()
                    .map(|item| self.resolve(item))
                    .collect::<Option<Vec<_>>>()?,
            ),
            Value::Object(fields) => Json::Object(
                fields
                    .iter()
                    .map(|(k, v)| self.resolve(v).map(|v| (k.clone(), v)))
                    .collect::<Option<Map<_, _>>>()?,
            ),
        })
    }
}
