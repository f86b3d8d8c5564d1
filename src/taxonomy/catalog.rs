//! The GitHub action catalog
//!
//! This list is an externally documented contract. Changes must be additive:
//! removing or renaming an action breaks existing policies.

use crate::error::ConfigError;
use crate::taxonomy::registry::{Taxonomy, TaxonomyBuilder};

const REPOSITORY_ACTIONS: &[&str] = &[
    "metadata:read",
    "actions:read",
    "statuses:read",
    "code:read",
    "code:write",
    "git:read",
    "git:write",
];

const ISSUE_ACTIONS: &[&str] = &[
    "issues:read",
    "issues:write",
    "issues:edit",
    "issues:comment_edit",
];

const SUBISSUE_ACTIONS: &[&str] = &[
    "subissues:list",
    "subissues:parent",
    "subissues:add",
    "subissues:remove",
    "subissues:reprioritize",
];

const DISCUSSION_READ_ACTIONS: &[&str] = &[
    "discussions:list",
    "discussions:get",
    "discussions:comment_list",
];

const DISCUSSION_WRITE_ONLY_ACTIONS: &[&str] = &[
    "discussions:create",
    "discussions:update",
    "discussions:close",
    "discussions:reopen",
    "discussions:delete",
    "discussions:comment_add",
    "discussions:comment_edit",
    "discussions:comment_delete",
    "discussions:answer",
    "discussions:unanswer",
    "discussions:poll_vote",
];

const PULL_REQUESTS_READ_ACTIONS: &[&str] = &[
    "pr:list",
    "pr:get",
    "pr:commits",
    "pr:files",
    "pr:merge_status",
    "pr:reviewer_list",
    "pr:review_list",
    "pr:review_get",
    "pr:review_comments",
    "pr:review_comment_list_all",
    "pr:review_comment_list",
    "pr:review_comment_get",
    "pr:comment_list_all",
    "pr:comment_list",
    "pr:comment_get",
];

const PULL_REQUESTS_WRITE_ONLY_ACTIONS: &[&str] = &[
    "pr:create",
    "pr:create_draft",
    "pr:update",
    "pr:close",
    "pr:reopen",
    "pr:convert_to_draft",
    "pr:mark_ready",
    "pr:update_branch",
    "pr:reviewer_request",
    "pr:reviewer_remove",
    "pr:review_pending",
    "pr:approve",
    "pr:request_changes",
    "pr:review_comment_only",
    "pr:review_update",
    "pr:review_delete",
    "pr:review_dismiss",
    "pr:review_submit_approve",
    "pr:review_submit_request_changes",
    "pr:review_submit_comment",
    "pr:review_comment_create",
    "pr:review_comment_update",
    "pr:review_comment_delete",
    "pr:review_comment_reply",
    "pr:comment_create",
    "pr:comment_update",
    "pr:comment_delete",
];

const PULLS_CONTRIBUTE_ONLY_ACTIONS: &[&str] = &[
    "pr:create",
    "pr:create_draft",
    "pr:update",
    "pr:convert_to_draft",
    "pr:mark_ready",
    "pr:comment_create",
    "pr:comment_update",
    "pr:review_comment_create",
    "pr:review_comment_update",
    "pr:review_comment_reply",
    "pr:review_pending",
    "pr:approve",
    "pr:request_changes",
    "pr:review_comment_only",
    "pr:review_update",
    "pr:review_submit_approve",
    "pr:review_submit_request_changes",
    "pr:review_submit_comment",
    "pr:reviewer_request",
];

const PR_MERGE_ACTIONS: &[&str] = &["pr:merge_commit", "pr:merge_squash", "pr:merge_rebase"];

// No confirmed minimum permission upstream. Kept out of every bundle so they
// are granted only by name, `pr:*` or `*`.
const PR_UNCONFIRMED_ACTIONS: &[&str] = &[
    "pr:auto_merge_enable",
    "pr:auto_merge_disable",
    "pr:merge_queue_enqueue",
    "pr:merge_queue_dequeue",
    "pr:file_viewed_mark",
    "pr:file_viewed_unmark",
    "pr:review_thread_resolve",
    "pr:review_thread_unresolve",
    "pr:revert",
];

/// Build the GitHub taxonomy
pub fn github() -> Result<Taxonomy, ConfigError> {
    let mut builder = TaxonomyBuilder::new();

    builder
        .primitives(REPOSITORY_ACTIONS)?
        .primitives(ISSUE_ACTIONS)?
        .primitives(SUBISSUE_ACTIONS)?
        .primitives(DISCUSSION_READ_ACTIONS)?
        .primitives(DISCUSSION_WRITE_ONLY_ACTIONS)?
        .primitives(PULL_REQUESTS_READ_ACTIONS)?
        .primitives(PULL_REQUESTS_WRITE_ONLY_ACTIONS)?
        .primitives(PR_MERGE_ACTIONS)?
        .primitives(PR_UNCONFIRMED_ACTIONS)?;

    builder
        .bundle("pull-requests:read", PULL_REQUESTS_READ_ACTIONS)?
        .bundle(
            "pulls:contribute",
            &with_base("pull-requests:read", PULLS_CONTRIBUTE_ONLY_ACTIONS),
        )?
        .bundle(
            "pull-requests:write",
            &with_base("pull-requests:read", PULL_REQUESTS_WRITE_ONLY_ACTIONS),
        )?
        .bundle("pr:merge", PR_MERGE_ACTIONS)?
        .bundle("discussions:read", DISCUSSION_READ_ACTIONS)?
        .bundle(
            "discussions:write",
            &with_base("discussions:read", DISCUSSION_WRITE_ONLY_ACTIONS),
        )?
        .bundle("subissues:read", &["subissues:list", "subissues:parent"])?
        .bundle(
            "subissues:write",
            &[
                "subissues:read",
                "subissues:add",
                "subissues:remove",
                "subissues:reprioritize",
            ],
        )?;

    Ok(builder.build())
}

fn with_base<'a>(base: &'a str, extra: &[&'a str]) -> Vec<&'a str> {
    std::iter::once(base).chain(extra.iter().copied()).collect()
}
