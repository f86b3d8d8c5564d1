//! Upstream API types

use serde::{Deserialize, Serialize};

/// The subset of `GET /user` the status probe reads
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct UserInfo {
    pub login: String,
}

/// Result of probing one configured credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CredentialStatus {
    pub name: String,
    /// `classic` for the fallback, `fine_grained` for scoped credentials
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub valid: bool,
    pub masked_token: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    /// OAuth scopes reported upstream (classic tokens only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scopes: Option<Vec<String>>,
    /// Configured repository patterns (scoped credentials only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repos: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Parse an `X-OAuth-Scopes` header value
pub fn parse_scopes(header: &str) -> Vec<String> {
    header
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_scopes() {
        assert_eq!(parse_scopes("repo, read:org,  "), vec!["repo", "read:org"]);
        assert!(parse_scopes("").is_empty());
    }

    #[test]
    fn test_status_serialization_skips_empty_fields() {
        let status = CredentialStatus {
            name: "classic_pat".into(),
            kind: "classic",
            valid: true,
            masked_token: "ghp_...abcd".into(),
            user: Some("octocat".into()),
            scopes: Some(vec!["repo".into()]),
            repos: None,
            error: None,
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["type"], "classic");
        assert_eq!(json["user"], "octocat");
        assert!(json.get("repos").is_none());
        assert!(json.get("error").is_none());
    }
}
