//! Action taxonomy
//!
//! The authorization vocabulary shared by the classifier and the policy
//! evaluator:
//!
//! - **Primitive actions** (layer 1): one per distinct operation, e.g. `pr:approve`
//! - **Bundles** (layer 2): named sets of primitives, e.g. `pull-requests:read`
//! - **Wildcards**: `namespace:*` and `*`
//!
//! ```text
//! pull-requests:read ⊂ pulls:contribute ⊂ pull-requests:write
//! ```

pub mod action;
pub mod catalog;
pub mod registry;

pub use action::{Action, ActionSet, join_actions};
pub use catalog::github;
pub use registry::{Taxonomy, TaxonomyBuilder, WILDCARD};
