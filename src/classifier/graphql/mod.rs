//! GraphQL classification
//!
//! Documents are parsed with a small executable-document parser and then
//! analyzed against fixed mutation and query tables. Anything the tables do
//! not cover fails closed.

pub mod analysis;
pub mod document;
pub mod parser;

pub use analysis::{MUTATIONS, Mutation, analyze, referenced_actions};
pub use document::Document;
pub use parser::parse;

use crate::access_control::RepoId;
use crate::error::ClassificationError;
use serde_json::Value;
use std::collections::BTreeSet;

/// Parse and analyze a document addressed to `repo`
pub fn classify(
    query: &str,
    variables: Option<&Value>,
    operation_name: Option<&str>,
    repo: &RepoId,
) -> Result<BTreeSet<&'static str>, ClassificationError> {
    let document = parse(query)?;
    analyze(&document, variables, operation_name, repo)
}
