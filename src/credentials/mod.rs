//! Credential selection
//!
//! Chooses which configured token is presented upstream for an allowed
//! request, and renders it into the header each transport expects.

pub mod header;
pub mod selector;

pub use header::{AuthHeader, Transport};
pub use selector::{Credential, CredentialSet, FALLBACK_NAME};
