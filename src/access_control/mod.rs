//! Access control module
//!
//! Deny-wins policy evaluation over action × repository.
//!
//! ## Evaluation Model
//!
//! Rules are `{effect, actions, repos}`. For one request:
//!
//! 1. **Explicit deny** - any matching deny rule rejects the request
//! 2. **Full coverage** - matching allow rules must together cover every required action
//! 3. **Default deny** - a request no rule matches is rejected
//!
//! List position never changes the outcome; it only decides which rule is
//! reported.
//!
//! ## Example Configuration
//!
//! ```toml
//! [[rules]]
//! effect = "allow"
//! actions = ["pull-requests:read", "pr:create"]
//! repos = ["owner/*"]
//!
//! [[rules]]
//! effect = "deny"
//! actions = ["pr:merge"]
//! repos = ["*"]
//! ```

pub mod evaluator;
pub mod patterns;
pub mod types;

pub use evaluator::{Evaluation, PolicyEvaluator, Rule};
pub use patterns::{PatternMatcher, RepoPattern};
pub use types::{DenyReason, Effect, RepoId, RuleSummary};
