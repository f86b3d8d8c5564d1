//! Upstream API access
//!
//! Only used to report whether configured credentials are accepted
//! upstream. Allowed requests are forwarded by the transport layer.

pub mod client;
pub mod types;

pub use client::{CredentialProbe, UpstreamClient};
pub use types::{CredentialStatus, UserInfo, parse_scopes};
