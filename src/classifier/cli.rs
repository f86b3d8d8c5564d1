//! CLI argument-vector classification
//!
//! gh-shaped argument vectors are matched against an ordered command table.
//! Each command declares the flags it accepts; values are consumed while
//! parsing, so a flag given as another flag's value is never mistaken for
//! one. Unknown flags fail classification. Composite commands that resolve
//! node IDs before mutating require the union of every operation they
//! perform.

use crate::access_control::RepoId;
use crate::error::ClassificationError;
use std::collections::BTreeSet;
use tracing::trace;

/// A flag accepted by a command
struct Flag {
    /// Long name first, then the short alias if any
    names: &'static [&'static str],
    takes_value: bool,
    /// Actions giving the flag adds to the command's own
    adds: &'static [&'static str],
}

impl Flag {
    fn long(&self) -> &'static str {
        self.names.first().copied().unwrap_or_default()
    }
}

const fn switch(names: &'static [&'static str]) -> Flag {
    Flag {
        names,
        takes_value: false,
        adds: &[],
    }
}

const fn value(names: &'static [&'static str]) -> Flag {
    Flag {
        names,
        takes_value: true,
        adds: &[],
    }
}

const fn adding(flag: Flag, adds: &'static [&'static str]) -> Flag {
    Flag { adds, ..flag }
}

/// One row of the command table
struct Command {
    /// Leading positional words
    path: &'static [&'static str],
    /// Flags the command accepts
    flags: &'static [Flag],
    /// Flag groups that must all be present, by long name; any flag within a group satisfies it
    requires: &'static [&'static [&'static str]],
    /// Required actions; empty rejects the command
    actions: &'static [&'static str],
}

const fn cmd(
    path: &'static [&'static str],
    flags: &'static [Flag],
    requires: &'static [&'static [&'static str]],
    actions: &'static [&'static str],
) -> Command {
    Command {
        path,
        flags,
        requires,
        actions,
    }
}

const NONE: &[&[&str]] = &[];
const OLD_AND_NEW: &[&[&str]] = &[&["--old"], &["--new"]];

/// Accepted anywhere; must name the declared repository
const REPO_FLAG: &[&str] = &["--repo", "-R"];

/// At most one flag of each group may be given, by long name
const EXCLUSIVE: &[&[&str]] = &[
    &["--merge", "--rebase", "--squash"],
    &["--auto", "--disable-auto"],
    &["--approve", "--request-changes", "--comment"],
    &["--edit-last", "--delete-last"],
    &["--before", "--after"],
];

const TITLE: Flag = value(&["--title", "-t"]);
const BODY: Flag = value(&["--body", "-b"]);
const BODY_FILE: Flag = value(&["--body-file", "-F"]);
const JSON: Flag = value(&["--json"]);
const JQ: Flag = value(&["--jq", "-q"]);
const TEMPLATE: Flag = value(&["--template", "-t"]);
const LIMIT: Flag = value(&["--limit", "-L"]);

const NO_FLAGS: &[Flag] = &[];

const ISSUE_LIST: &[Flag] = &[
    value(&["--label", "-l"]),
    value(&["--state", "-s"]),
    value(&["--assignee", "-a"]),
    value(&["--author", "-A"]),
    value(&["--milestone", "-m"]),
    value(&["--search", "-S"]),
    value(&["--mention"]),
    LIMIT,
    JSON,
    JQ,
    TEMPLATE,
];
const ISSUE_VIEW: &[Flag] = &[switch(&["--comments", "-c"]), JSON, JQ, TEMPLATE];
const ISSUE_STATUS: &[Flag] = &[JSON, JQ, TEMPLATE];
const ISSUE_CREATE: &[Flag] = &[
    TITLE,
    BODY,
    BODY_FILE,
    value(&["--label", "-l"]),
    value(&["--assignee", "-a"]),
    value(&["--milestone", "-m"]),
];
const ISSUE_CLOSE: &[Flag] = &[value(&["--comment", "-c"]), value(&["--reason", "-r"])];
const ISSUE_REOPEN: &[Flag] = &[value(&["--comment", "-c"])];
const ISSUE_EDIT: &[Flag] = &[
    TITLE,
    BODY,
    BODY_FILE,
    value(&["--add-label"]),
    value(&["--remove-label"]),
    value(&["--add-assignee"]),
    value(&["--remove-assignee"]),
    value(&["--milestone", "-m"]),
    switch(&["--remove-milestone"]),
    value(&["--old"]),
    value(&["--new"]),
    switch(&["--replace-all"]),
];
const COMMENT_REPLACE: &[Flag] = &[value(&["--old"]), value(&["--new"]), switch(&["--replace-all"])];
const ISSUE_COMMENT: &[Flag] = &[BODY, BODY_FILE, switch(&["--edit-last"])];

const SUB_ISSUE_REORDER: &[Flag] = &[value(&["--before"]), value(&["--after"])];

const DISCUSSION_LIST: &[Flag] = &[value(&["--category", "-c"]), LIMIT];
const DISCUSSION_CREATE: &[Flag] = &[TITLE, BODY, value(&["--category", "-c"])];
const DISCUSSION_EDIT: &[Flag] = &[TITLE, BODY];
const DISCUSSION_COMMENT: &[Flag] = &[BODY, value(&["--reply-to"])];
const DISCUSSION_COMMENT_EDIT: &[Flag] = &[BODY];

const PR_LIST: &[Flag] = &[
    value(&["--state", "-s"]),
    value(&["--label", "-l"]),
    value(&["--base", "-B"]),
    value(&["--head", "-H"]),
    value(&["--author", "-A"]),
    value(&["--assignee", "-a"]),
    value(&["--search", "-S"]),
    switch(&["--draft", "-d"]),
    LIMIT,
    JSON,
    JQ,
    TEMPLATE,
];
const PR_STATUS: &[Flag] = &[switch(&["--conflict-status", "-c"]), JSON, JQ, TEMPLATE];
const PR_VIEW: &[Flag] = &[
    adding(switch(&["--comments", "-c"]), &["pr:comment_list"]),
    JSON,
    JQ,
    TEMPLATE,
];
const PR_DIFF: &[Flag] = &[
    switch(&["--name-only"]),
    switch(&["--patch"]),
    value(&["--color"]),
];
const PR_CHECKS: &[Flag] = &[
    switch(&["--required"]),
    switch(&["--watch"]),
    switch(&["--fail-fast"]),
    value(&["--interval", "-i"]),
    JSON,
    JQ,
    TEMPLATE,
];
const PR_CHECKOUT: &[Flag] = &[
    value(&["--branch", "-b"]),
    switch(&["--detach"]),
    switch(&["--force", "-f"]),
    switch(&["--recurse-submodules"]),
];
const PR_CREATE: &[Flag] = &[
    TITLE,
    BODY,
    BODY_FILE,
    value(&["--base", "-B"]),
    value(&["--head", "-H"]),
    switch(&["--draft", "-d"]),
    switch(&["--fill", "-f"]),
    switch(&["--fill-first"]),
    switch(&["--fill-verbose"]),
    switch(&["--no-maintainer-edit"]),
    adding(value(&["--label", "-l"]), &["issues:write"]),
    adding(value(&["--assignee", "-a"]), &["issues:write"]),
    adding(value(&["--milestone", "-m"]), &["issues:write"]),
    adding(value(&["--reviewer", "-r"]), &["pr:reviewer_request"]),
];
const PR_EDIT: &[Flag] = &[
    TITLE,
    BODY,
    BODY_FILE,
    value(&["--base", "-B"]),
    adding(value(&["--add-label"]), &["issues:write"]),
    adding(value(&["--remove-label"]), &["issues:write"]),
    adding(value(&["--add-assignee"]), &["issues:write"]),
    adding(value(&["--remove-assignee"]), &["issues:write"]),
    adding(value(&["--milestone", "-m"]), &["issues:write"]),
    adding(switch(&["--remove-milestone"]), &["issues:write"]),
    adding(value(&["--add-reviewer"]), &["pr:reviewer_request"]),
    adding(value(&["--remove-reviewer"]), &["pr:reviewer_remove"]),
];
const PR_CLOSE: &[Flag] = &[
    adding(value(&["--comment", "-c"]), &["pr:comment_create"]),
    adding(switch(&["--delete-branch", "-d"]), &["code:write"]),
];
const PR_REOPEN: &[Flag] = &[adding(value(&["--comment", "-c"]), &["pr:comment_create"])];
const PR_READY: &[Flag] = &[switch(&["--undo"])];
const PR_UPDATE_BRANCH: &[Flag] = &[switch(&["--rebase"])];
const PR_COMMENT: &[Flag] = &[
    BODY,
    BODY_FILE,
    switch(&["--edit-last"]),
    switch(&["--delete-last"]),
    adding(switch(&["--create-if-none"]), &["pr:comment_create"]),
    switch(&["--yes"]),
];
const PR_MERGE: &[Flag] = &[
    switch(&["--auto"]),
    switch(&["--disable-auto"]),
    switch(&["--merge", "-m"]),
    switch(&["--rebase", "-r"]),
    switch(&["--squash", "-s"]),
    adding(switch(&["--delete-branch", "-d"]), &["code:write"]),
    BODY,
    BODY_FILE,
    value(&["--subject", "-t"]),
    value(&["--match-head-commit"]),
    value(&["--author-email", "-A"]),
];
const PR_REVIEW: &[Flag] = &[
    switch(&["--approve", "-a"]),
    switch(&["--request-changes", "-r"]),
    switch(&["--comment", "-c"]),
    BODY,
    BODY_FILE,
];

const RUN_LIST: &[Flag] = &[
    value(&["--workflow", "-w"]),
    value(&["--branch", "-b"]),
    value(&["--status", "-s"]),
    value(&["--event", "-e"]),
    value(&["--user", "-u"]),
    value(&["--commit", "-c"]),
    value(&["--created"]),
    LIMIT,
    JSON,
    JQ,
    TEMPLATE,
];
const RUN_VIEW: &[Flag] = &[
    switch(&["--log"]),
    switch(&["--log-failed"]),
    switch(&["--verbose", "-v"]),
    switch(&["--exit-status"]),
    value(&["--job", "-j"]),
    value(&["--attempt", "-a"]),
    JSON,
    JQ,
    TEMPLATE,
];
const REPO_VIEW: &[Flag] = &[value(&["--branch", "-b"]), JSON, JQ, TEMPLATE];

/// First match wins. Rows sharing a path share its flags.
const COMMANDS: &[Command] = &[
    // issues
    cmd(&["issue", "list"], ISSUE_LIST, NONE, &["issues:read"]),
    cmd(&["issue", "view"], ISSUE_VIEW, NONE, &["issues:read"]),
    cmd(&["issue", "status"], ISSUE_STATUS, NONE, &["issues:read"]),
    cmd(&["issue", "create"], ISSUE_CREATE, NONE, &["issues:write"]),
    cmd(&["issue", "close"], ISSUE_CLOSE, NONE, &["issues:write"]),
    cmd(&["issue", "reopen"], ISSUE_REOPEN, NONE, &["issues:write"]),
    cmd(&["issue", "edit"], ISSUE_EDIT, OLD_AND_NEW, &["issues:edit"]),
    cmd(&["issue", "edit"], ISSUE_EDIT, NONE, &["issues:write"]),
    cmd(
        &["issue", "comment", "edit"],
        COMMENT_REPLACE,
        OLD_AND_NEW,
        &["issues:comment_edit"],
    ),
    cmd(&["issue", "comment", "edit"], COMMENT_REPLACE, NONE, &[]),
    cmd(&["issue", "comment"], ISSUE_COMMENT, NONE, &["issues:write"]),
    // sub-issues
    cmd(&["sub-issue", "list"], NO_FLAGS, NONE, &["subissues:list"]),
    cmd(&["sub-issue", "parent"], NO_FLAGS, NONE, &["subissues:parent"]),
    cmd(
        &["sub-issue", "add"],
        NO_FLAGS,
        NONE,
        &["issues:read", "subissues:add"],
    ),
    cmd(
        &["sub-issue", "remove"],
        NO_FLAGS,
        NONE,
        &["issues:read", "subissues:remove"],
    ),
    cmd(
        &["sub-issue", "reorder"],
        SUB_ISSUE_REORDER,
        &[&["--before", "--after"]],
        &["issues:read", "subissues:reprioritize"],
    ),
    // discussions
    cmd(
        &["discussion", "list"],
        DISCUSSION_LIST,
        NONE,
        &["discussions:list"],
    ),
    cmd(
        &["discussion", "view"],
        NO_FLAGS,
        NONE,
        &["discussions:get", "discussions:comment_list"],
    ),
    cmd(
        &["discussion", "create"],
        DISCUSSION_CREATE,
        NONE,
        &["metadata:read", "discussions:list", "discussions:create"],
    ),
    cmd(
        &["discussion", "edit"],
        DISCUSSION_EDIT,
        NONE,
        &["discussions:get", "discussions:update"],
    ),
    cmd(
        &["discussion", "comment", "edit"],
        DISCUSSION_COMMENT_EDIT,
        NONE,
        &["discussions:comment_edit"],
    ),
    cmd(
        &["discussion", "comment"],
        DISCUSSION_COMMENT,
        NONE,
        &["discussions:get", "discussions:comment_add"],
    ),
    // pull requests
    cmd(&["pr", "list"], PR_LIST, NONE, &["pr:list"]),
    cmd(&["pr", "status"], PR_STATUS, NONE, &["pr:list"]),
    cmd(&["pr", "view"], PR_VIEW, NONE, &["pr:get"]),
    cmd(&["pr", "diff"], PR_DIFF, NONE, &["pr:files"]),
    cmd(&["pr", "checks"], PR_CHECKS, NONE, &["statuses:read"]),
    cmd(&["pr", "checkout"], PR_CHECKOUT, NONE, &["pr:get", "git:read"]),
    cmd(&["pr", "create"], PR_CREATE, &[&["--draft"]], &["pr:create_draft"]),
    cmd(&["pr", "create"], PR_CREATE, NONE, &["pr:create"]),
    cmd(&["pr", "edit"], PR_EDIT, NONE, &["pr:update"]),
    cmd(&["pr", "close"], PR_CLOSE, NONE, &["pr:close"]),
    cmd(&["pr", "reopen"], PR_REOPEN, NONE, &["pr:reopen"]),
    cmd(&["pr", "ready"], PR_READY, &[&["--undo"]], &["pr:convert_to_draft"]),
    cmd(&["pr", "ready"], PR_READY, NONE, &["pr:mark_ready"]),
    cmd(
        &["pr", "update-branch"],
        PR_UPDATE_BRANCH,
        NONE,
        &["pr:update_branch"],
    ),
    cmd(
        &["pr", "comment"],
        PR_COMMENT,
        &[&["--edit-last"]],
        &["pr:comment_update"],
    ),
    cmd(
        &["pr", "comment"],
        PR_COMMENT,
        &[&["--delete-last"]],
        &["pr:comment_delete"],
    ),
    cmd(&["pr", "comment"], PR_COMMENT, NONE, &["pr:comment_create"]),
    cmd(
        &["pr", "merge"],
        PR_MERGE,
        &[&["--disable-auto"]],
        &["pr:auto_merge_disable"],
    ),
    cmd(&["pr", "merge"], PR_MERGE, &[&["--auto"]], &["pr:auto_merge_enable"]),
    cmd(&["pr", "merge"], PR_MERGE, &[&["--squash"]], &["pr:merge_squash"]),
    cmd(&["pr", "merge"], PR_MERGE, &[&["--rebase"]], &["pr:merge_rebase"]),
    cmd(&["pr", "merge"], PR_MERGE, &[&["--merge"]], &["pr:merge_commit"]),
    cmd(&["pr", "review"], PR_REVIEW, &[&["--approve"]], &["pr:approve"]),
    cmd(
        &["pr", "review"],
        PR_REVIEW,
        &[&["--request-changes"]],
        &["pr:request_changes"],
    ),
    cmd(
        &["pr", "review"],
        PR_REVIEW,
        &[&["--comment"]],
        &["pr:review_comment_only"],
    ),
    // workflow runs and repository
    cmd(&["run", "list"], RUN_LIST, NONE, &["actions:read"]),
    cmd(&["run", "view"], RUN_VIEW, NONE, &["actions:read"]),
    cmd(&["repo", "view"], REPO_VIEW, NONE, &["metadata:read"]),
];

/// Every action name the table can produce
pub fn referenced_actions() -> impl Iterator<Item = &'static str> {
    let flags = COMMANDS
        .iter()
        .flat_map(|c| c.flags)
        .flat_map(|f| f.adds.iter().copied());
    COMMANDS
        .iter()
        .flat_map(|c| c.actions.iter().copied())
        .chain(flags)
}

/// Classify an argument vector declared for `repo`
pub fn classify(args: &[String], repo: &RepoId) -> Result<BTreeSet<&'static str>, ClassificationError> {
    let unknown = || ClassificationError::unknown_command(args);
    let mut iter = args.iter().map(String::as_str).peekable();

    // only the repository flag may precede the command
    while let Some(arg) = iter.next_if(|arg| arg.starts_with('-')) {
        match split_flag(arg)? {
            Some((name, inline)) if REPO_FLAG.contains(&name) => {
                check_repo(flag_value(name, inline, &mut iter)?, repo)?
            }
            _ => return Err(unknown()),
        }
    }

    let words: Vec<&str> = std::iter::from_fn(|| iter.next_if(|arg| !arg.starts_with('-'))).collect();
    let path = COMMANDS
        .iter()
        .find(|c| words.starts_with(c.path))
        .ok_or_else(unknown)?
        .path;
    let rows = || COMMANDS.iter().filter(move |c| c.path == path);
    let accepted = rows().next().ok_or_else(unknown)?.flags;

    let given = parse_flags(iter, accepted, repo)?;
    let present = |name: &str| given.iter().any(|flag| flag.long() == name);

    let command = rows()
        .find(|c| c.requires.iter().all(|group| group.iter().any(|&name| present(name))))
        .filter(|c| !c.actions.is_empty())
        .ok_or_else(unknown)?;

    trace!(command = %command.path.join(" "), flags = given.len(), "Matched CLI command");
    let mut actions: BTreeSet<&'static str> = command.actions.iter().copied().collect();
    actions.extend(given.iter().flat_map(|flag| flag.adds.iter().copied()));
    Ok(actions)
}

/// Parse the flags after the command path against `accepted`, consuming values
fn parse_flags<'a>(
    mut args: impl Iterator<Item = &'a str>,
    accepted: &'static [Flag],
    repo: &RepoId,
) -> Result<Vec<&'static Flag>, ClassificationError> {
    let mut given: Vec<&'static Flag> = Vec::new();

    while let Some(arg) = args.next() {
        if arg == "--" {
            break;
        }
        let Some((name, inline)) = split_flag(arg)? else {
            continue;
        };

        if REPO_FLAG.contains(&name) {
            check_repo(flag_value(name, inline, &mut args)?, repo)?;
            continue;
        }

        let flag = accepted
            .iter()
            .find(|flag| flag.names.contains(&name))
            .ok_or_else(|| ClassificationError::new(format!("unsupported flag '{}'", name)))?;
        if flag.takes_value {
            flag_value(name, inline, &mut args)?;
        } else if inline.is_some() {
            return Err(ClassificationError::new(format!(
                "flag '{}' does not take a value",
                name
            )));
        }
        given.push(flag);
    }

    for group in EXCLUSIVE {
        let count = group
            .iter()
            .filter(|name| given.iter().any(|flag| flag.long() == **name))
            .count();
        if count > 1 {
            return Err(ClassificationError::new(format!(
                "flags {} cannot be combined",
                group.join(", ")
            )));
        }
    }

    Ok(given)
}

/// Split a flag token into its name and attached value; `None` for positionals
fn split_flag(arg: &str) -> Result<Option<(&str, Option<&str>)>, ClassificationError> {
    if arg == "-" || !arg.starts_with('-') {
        return Ok(None);
    }
    if arg.starts_with("--") {
        return Ok(Some(match arg.split_once('=') {
            Some((name, value)) => (name, Some(value)),
            None => (arg, None),
        }));
    }
    match arg.split_at_checked(2) {
        Some((name, "")) => Ok(Some((name, None))),
        Some((name, value)) => Ok(Some((name, Some(value)))),
        None => Err(ClassificationError::new(format!("unsupported flag '{}'", arg))),
    }
}

/// The flag's attached value, or the next argument
fn flag_value<'a>(
    name: &str,
    inline: Option<&'a str>,
    args: &mut impl Iterator<Item = &'a str>,
) -> Result<&'a str, ClassificationError> {
    inline
        .or_else(|| args.next())
        .ok_or_else(|| ClassificationError::new(format!("{} requires a value", name)))
}

/// `-R/--repo` must name the declared repository
fn check_repo(value: &str, repo: &RepoId) -> Result<(), ClassificationError> {
    match RepoId::parse(value) {
        Some(requested) if requested.same_as(repo) => Ok(()),
        Some(requested) => Err(ClassificationError::repository_mismatch(
            &requested.full_name(),
            &repo.full_name(),
        )),
        None => Err(ClassificationError::new(format!(
            "invalid repository '{}'",
            value
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn run(args: &[&str]) -> Result<Vec<&'static str>, ClassificationError> {
        let args: Vec<String> = args.iter().map(ToString::to_string).collect();
        classify(&args, &RepoId::new("owner", "repo")).map(|set| set.into_iter().collect())
    }

    #[rstest]
    #[case(&["issue", "list", "--label", "bug"], &["issues:read"])]
    #[case(&["issue", "comment", "12", "--body", "hi"], &["issues:write"])]
    #[case(&["issue", "edit", "3", "--old", "a", "--new", "b"], &["issues:edit"])]
    #[case(&["issue", "edit", "3", "--title", "t"], &["issues:write"])]
    #[case(&["issue", "comment", "edit", "99", "--old=a", "--new=b"], &["issues:comment_edit"])]
    #[case(&["pr", "create", "--draft", "--title", "t"], &["pr:create_draft"])]
    #[case(&["pr", "create", "--title", "t"], &["pr:create"])]
    #[case(&["pr", "merge", "5", "--squash"], &["pr:merge_squash"])]
    #[case(&["pr", "merge", "5", "--auto", "--squash"], &["pr:auto_merge_enable"])]
    #[case(&["pr", "merge", "5", "--disable-auto"], &["pr:auto_merge_disable"])]
    #[case(&["pr", "review", "5", "--approve"], &["pr:approve"])]
    #[case(&["pr", "ready", "5", "--undo"], &["pr:convert_to_draft"])]
    #[case(&["pr", "checkout", "5"], &["git:read", "pr:get"])]
    #[case(&["run", "view", "123"], &["actions:read"])]
    #[case(&["sub-issue", "add", "1", "2"], &["issues:read", "subissues:add"])]
    #[case(&["sub-issue", "reorder", "1", "2", "--before", "3"], &["issues:read", "subissues:reprioritize"])]
    #[case(&["discussion", "create", "--title", "t"], &["discussions:create", "discussions:list", "metadata:read"])]
    #[case(&["discussion", "comment", "4", "--body", "b"], &["discussions:comment_add", "discussions:get"])]
    #[case(&["discussion", "comment", "edit", "DC_1", "--body", "b"], &["discussions:comment_edit"])]
    #[case(&["pr", "view", "5", "-c"], &["pr:comment_list", "pr:get"])]
    #[case(&["pr", "create", "-tTitle", "-d"], &["pr:create_draft"])]
    #[case(&["pr", "list", "--", "--draft"], &["pr:list"])]
    fn test_commands(#[case] args: &[&str], #[case] expected: &[&str]) {
        assert_eq!(run(args).unwrap(), expected);
    }

    #[rstest]
    #[case(&[])]
    #[case(&["pr", "merge", "5"])]
    #[case(&["pr", "review", "5"])]
    #[case(&["issue", "comment", "edit", "99", "--body", "x"])]
    #[case(&["sub-issue", "reorder", "1", "2"])]
    #[case(&["repo", "delete"])]
    #[case(&["api", "/repos/owner/repo"])]
    #[case(&["--help"])]
    #[case(&["pr", "view", "5", "--web"])]
    #[case(&["pr", "merge", "5", "--admin", "--squash"])]
    #[case(&["pr", "merge", "5", "--squash=true"])]
    #[case(&["pr", "merge", "5", "--squash", "--rebase"])]
    #[case(&["pr", "merge", "5", "-sd"])]
    #[case(&["pr", "review", "5", "--approve", "--comment"])]
    #[case(&["pr", "comment", "5", "--edit-last", "--delete-last"])]
    #[case(&["issue", "list", "--label"])]
    #[case(&["sub-issue", "reorder", "1", "2", "--before", "3", "--after", "4"])]
    fn test_unknown_commands(#[case] args: &[&str]) {
        assert!(run(args).is_err());
    }

    #[test]
    fn test_repo_flag_must_match() {
        assert_eq!(
            run(&["pr", "list", "-R", "Owner/Repo"]).unwrap(),
            vec!["pr:list"]
        );
        assert_eq!(
            run(&["-R", "owner/repo", "pr", "list"]).unwrap(),
            vec!["pr:list"]
        );
        assert!(run(&["pr", "list", "--repo", "other/repo"]).is_err());
        assert!(run(&["pr", "list", "--repo=other/repo"]).is_err());
        assert!(run(&["pr", "list", "-Rother/repo"]).is_err());
        assert!(run(&["pr", "list", "-R"]).is_err());
        assert!(run(&["pr", "list", "-R", "nonsense"]).is_err());
    }

    #[test]
    fn test_flag_values_are_not_flags() {
        assert_eq!(
            run(&["pr", "merge", "5", "--body", "--squash", "--merge"]).unwrap(),
            vec!["pr:merge_commit"]
        );
        assert_eq!(
            run(&["pr", "create", "--title", "--draft", "--body", "x"]).unwrap(),
            vec!["pr:create"]
        );
        assert_eq!(
            run(&["issue", "comment", "1", "--body", "--repo"]).unwrap(),
            vec!["issues:write"]
        );
    }

    #[rstest]
    #[case(&["pr", "close", "5", "--delete-branch"], &["code:write", "pr:close"])]
    #[case(&["pr", "close", "5", "-c", "bye"], &["pr:close", "pr:comment_create"])]
    #[case(&["pr", "merge", "5", "--squash", "-d"], &["code:write", "pr:merge_squash"])]
    #[case(&["pr", "comment", "5", "--edit-last", "--body", "x"], &["pr:comment_update"])]
    #[case(&["pr", "comment", "5", "--edit-last", "--create-if-none", "-b", "x"], &["pr:comment_create", "pr:comment_update"])]
    #[case(&["pr", "comment", "5", "--delete-last", "--yes"], &["pr:comment_delete"])]
    #[case(&["pr", "edit", "5", "--add-reviewer", "octo"], &["pr:reviewer_request", "pr:update"])]
    #[case(&["pr", "edit", "5", "--remove-reviewer=octo", "--title", "t"], &["pr:reviewer_remove", "pr:update"])]
    #[case(&["pr", "create", "--title", "t", "--reviewer", "octo", "--label", "bug"], &["issues:write", "pr:create", "pr:reviewer_request"])]
    fn test_side_effect_flags(#[case] args: &[&str], #[case] expected: &[&str]) {
        assert_eq!(run(args).unwrap(), expected);
    }

    #[test]
    fn test_every_flag_action_is_referenced() {
        let referenced: BTreeSet<&str> = referenced_actions().collect();
        for action in ["code:write", "pr:reviewer_remove", "pr:comment_list"] {
            assert!(referenced.contains(action), "{action}");
        }
    }
}
