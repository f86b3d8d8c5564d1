//! Credential selection
//!
//! Scoped credentials are tried in configured order and the first whose
//! repository patterns match wins. The fallback has no pattern restriction.
//! Unlike policy evaluation, position matters here: operators list narrow
//! grants ahead of broad ones.

use crate::access_control::PatternMatcher;
use crate::config::CredentialsConfig;
use crate::credentials::header::{AuthHeader, Transport};
use crate::error::ConfigError;
use crate::util::SecretString;
use std::sync::Arc;
use tracing::debug;

/// Name reported for the fallback credential
pub const FALLBACK_NAME: &str = "classic_pat";

/// A configured credential
///
/// The secret is never logged or serialized; only `name` leaves the process.
#[derive(Debug, Clone)]
pub struct Credential {
    name: String,
    secret: SecretString,
    repos: PatternMatcher,
    fallback: bool,
}

impl Credential {
    /// A credential restricted to `repos`
    pub fn scoped(
        name: impl Into<String>,
        secret: SecretString,
        repos: &[String],
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            name: name.into(),
            secret,
            repos: PatternMatcher::new(repos)?,
            fallback: false,
        })
    }

    /// The unrestricted fallback credential
    pub fn fallback(secret: SecretString) -> Self {
        Self {
            name: FALLBACK_NAME.to_string(),
            secret,
            repos: PatternMatcher::empty(),
            fallback: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn secret(&self) -> &SecretString {
        &self.secret
    }

    /// Repository patterns; empty for the fallback
    pub fn repos(&self) -> &PatternMatcher {
        &self.repos
    }

    pub fn is_fallback(&self) -> bool {
        self.fallback
    }

    /// Header for REST and GraphQL calls
    pub fn api_auth_header(&self) -> AuthHeader {
        AuthHeader::bearer(&self.secret)
    }

    /// Header for git smart-HTTP
    pub fn git_auth_header(&self) -> AuthHeader {
        AuthHeader::git_basic(&self.secret)
    }

    /// Header in the form `transport` expects
    pub fn auth_header(&self, transport: Transport) -> AuthHeader {
        match transport {
            Transport::Api => self.api_auth_header(),
            Transport::Git => self.git_auth_header(),
        }
    }
}

/// Ordered scoped credentials plus one fallback
#[derive(Debug, Clone)]
pub struct CredentialSet {
    scoped: Vec<Arc<Credential>>,
    fallback: Arc<Credential>,
}

impl CredentialSet {
    pub fn new(scoped: Vec<Credential>, fallback: Credential) -> Self {
        Self {
            scoped: scoped.into_iter().map(Arc::new).collect(),
            fallback: Arc::new(fallback),
        }
    }

    /// Build from configuration
    pub fn from_config(config: &CredentialsConfig) -> Result<Self, ConfigError> {
        let classic = config
            .classic_pat
            .as_ref()
            .filter(|pat| !pat.expose_secret().is_empty())
            .ok_or_else(|| ConfigError::Missing {
                field: "credentials.classic_pat (or set GITHUB_TOKEN)".to_string(),
            })?;

        let scoped = config
            .fine_grained
            .iter()
            .enumerate()
            .map(|(i, fg)| {
                let name = fg
                    .name
                    .clone()
                    .unwrap_or_else(|| format!("fine_grained[{}]", i));
                Credential::scoped(name, fg.pat.clone(), &fg.repos)
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self::new(scoped, Credential::fallback(classic.clone())))
    }

    /// Pick the credential for `repo`: first matching scoped credential, else the fallback
    pub fn select(&self, repo: &str) -> &Arc<Credential> {
        match self.scoped.iter().find(|c| c.repos.matches(repo)) {
            Some(credential) => {
                debug!(repo, credential = credential.name(), "Selected scoped credential");
                credential
            }
            None => {
                debug!(repo, "No scoped credential matched, using fallback");
                &self.fallback
            }
        }
    }

    pub fn scoped(&self) -> &[Arc<Credential>] {
        &self.scoped
    }

    pub fn fallback(&self) -> &Arc<Credential> {
        &self.fallback
    }

    /// All credentials, scoped first
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Credential>> {
        self.scoped.iter().chain(std::iter::once(&self.fallback))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FineGrainedConfig;

    fn set(entries: &[(&str, &str)]) -> CredentialSet {
        let scoped = entries
            .iter()
            .map(|(name, pattern)| {
                Credential::scoped(
                    *name,
                    SecretString::new(format!("github_pat_{}", name)),
                    &[pattern.to_string()],
                )
                .unwrap()
            })
            .collect();
        CredentialSet::new(scoped, Credential::fallback(SecretString::new("ghp_classic")))
    }

    #[test]
    fn test_first_match_wins() {
        let creds = set(&[("A", "org/*"), ("B", "*")]);
        assert_eq!(creds.select("org/x").name(), "A");
        assert_eq!(creds.select("Org/X").name(), "A");
    }

    #[test]
    fn test_order_sensitive() {
        let creds = set(&[("B", "*"), ("A", "org/*")]);
        assert_eq!(creds.select("org/x").name(), "B");
    }

    #[test]
    fn test_fallback_when_nothing_matches() {
        let creds = set(&[("A", "org/*"), ("C", "other/lib")]);
        let selected = creds.select("other/x");
        assert_eq!(selected.name(), FALLBACK_NAME);
        assert!(selected.is_fallback());
        assert_eq!(selected.secret().expose_secret(), "ghp_classic");
    }

    #[test]
    fn test_from_config_default_names() {
        let config = CredentialsConfig {
            classic_pat: Some(SecretString::new("ghp_classic")),
            fine_grained: vec![
                FineGrainedConfig {
                    name: Some("work".into()),
                    pat: SecretString::new("github_pat_work"),
                    repos: vec!["work/*".into()],
                },
                FineGrainedConfig {
                    name: None,
                    pat: SecretString::new("github_pat_mine"),
                    repos: vec!["me/repo".into()],
                },
            ],
        };
        let creds = CredentialSet::from_config(&config).unwrap();
        let names: Vec<_> = creds.iter().map(|c| c.name().to_string()).collect();
        assert_eq!(names, vec!["work", "fine_grained[1]", FALLBACK_NAME]);
        assert_eq!(creds.select("me/repo").name(), "fine_grained[1]");
    }

    #[test]
    fn test_from_config_requires_fallback() {
        let config = CredentialsConfig::default();
        assert!(matches!(
            CredentialSet::from_config(&config),
            Err(ConfigError::Missing { .. })
        ));
    }

    #[test]
    fn test_fallback_is_explicit() {
        let unrestricted =
            Credential::scoped("empty", SecretString::new("github_pat_x"), &[]).unwrap();
        assert!(unrestricted.repos().is_empty());
        assert!(!unrestricted.is_fallback());

        let creds = CredentialSet::new(
            vec![unrestricted],
            Credential::fallback(SecretString::new("ghp_classic")),
        );
        assert!(creds.select("any/repo").is_fallback());
        assert_eq!(creds.iter().filter(|c| c.is_fallback()).count(), 1);
    }

    #[test]
    fn test_auth_header_follows_transport() {
        let credential = Credential::fallback(SecretString::new("ghp_abc"));
        assert_eq!(
            credential.auth_header(Transport::Api).header_value(),
            "Bearer ghp_abc"
        );
        assert_eq!(credential.auth_header(Transport::Git).scheme(), "Basic");
    }

    #[test]
    fn test_credential_debug_redacts_secret() {
        let credential = Credential::fallback(SecretString::new("ghp_topsecret"));
        assert!(!format!("{:?}", credential).contains("ghp_topsecret"));
    }
}
