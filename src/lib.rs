//! finegate
//!
//! An authorization kernel for GitHub access with IAM-style, per-action
//! policies. Agents present the request they want to make; finegate
//! decides whether it is allowed and which credential should carry it.
//!
//! ## Features
//!
//! - **Action taxonomy** of primitive actions, bundles and wildcards
//! - **Request classification** for REST, git smart-HTTP, GraphQL and `gh` CLI argv
//! - **Deny-wins evaluation** with full coverage of every required action
//! - **Credential selection** from repository-scoped tokens with a fallback
//!
//! ## Decision Model
//!
//! ```text
//! request → required actions + repo → rules → allow (credential) | deny (reason)
//! ```
//!
//! - Any deny rule covering a required action on the repo denies the request
//! - Otherwise every required action must be covered by some allow rule
//! - Anything that cannot be classified is denied
//!
//! ## Example Configuration
//!
//! ```toml
//! [credentials]
//! # classic_pat from GITHUB_TOKEN env var
//!
//! [[credentials.fine_grained]]
//! name = "org-apps"
//! pat = "github_pat_..."
//! repos = ["org/*"]
//!
//! [[rules]]
//! effect = "allow"
//! actions = ["pulls:contribute"]
//! repos = ["org/*"]
//!
//! [[rules]]
//! effect = "deny"
//! actions = ["pr:merge"]
//! repos = ["*"]
//! ```

pub mod access_control;
pub mod classifier;
pub mod config;
pub mod credentials;
pub mod error;
pub mod kernel;
pub mod server;
pub mod taxonomy;
pub mod transport;
pub mod upstream;
pub mod util;

// Re-export main types
pub use classifier::Request;
pub use config::{AppConfig, load_config};
pub use error::{AppError, Result};
pub use kernel::{Decision, Kernel, Outcome, SharedKernel};
