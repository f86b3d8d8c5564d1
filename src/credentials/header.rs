//! Upstream authentication headers
//!
//! The API accepts the token as a bearer credential; git smart-HTTP wants
//! HTTP Basic with the fixed `x-access-token` user name.

use crate::util::SecretString;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::fmt;

/// User name GitHub expects for token-authenticated git transport
const GIT_TOKEN_USER: &str = "x-access-token";

/// How an allowed request reaches upstream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    /// REST and GraphQL API
    Api,
    /// git smart-HTTP
    Git,
}

/// Authentication header to use with upstream requests
#[derive(Clone)]
pub enum AuthHeader {
    /// `Authorization: Bearer <token>` (REST and GraphQL API)
    Bearer(SecretString),
    /// `Authorization: Basic <base64>` (git smart-HTTP)
    Basic(SecretString),
}

impl AuthHeader {
    /// Bearer header for API calls
    pub fn bearer(token: &SecretString) -> Self {
        AuthHeader::Bearer(token.clone())
    }

    /// Basic header for git transport
    pub fn git_basic(token: &SecretString) -> Self {
        let raw = format!("{}:{}", GIT_TOKEN_USER, token.expose_secret());
        AuthHeader::Basic(SecretString::new(STANDARD.encode(raw)))
    }

    /// Get the header name for this auth type
    pub fn header_name(&self) -> &'static str {
        "Authorization"
    }

    /// Get the header value for this auth type
    pub fn header_value(&self) -> String {
        match self {
            AuthHeader::Bearer(token) => format!("Bearer {}", token.expose_secret()),
            AuthHeader::Basic(encoded) => format!("Basic {}", encoded.expose_secret()),
        }
    }

    pub fn scheme(&self) -> &'static str {
        match self {
            AuthHeader::Bearer(_) => "Bearer",
            AuthHeader::Basic(_) => "Basic",
        }
    }
}

impl fmt::Debug for AuthHeader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AuthHeader({} [REDACTED])", self.scheme())
    }
}
