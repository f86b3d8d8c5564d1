//! GitHub API client for the credential status probe

use crate::config::UpstreamConfig;
use crate::credentials::Credential;
use crate::error::{UpstreamError, UpstreamResult};
use crate::upstream::types::{CredentialStatus, UserInfo, parse_scopes};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, instrument, warn};

const GITHUB_ACCEPT: &str = "application/vnd.github+json";
const GITHUB_API_VERSION: &str = "2022-11-28";

/// Checks a credential against the upstream API
#[async_trait]
pub trait CredentialProbe: Send + Sync {
    async fn probe(&self, credential: &Credential) -> CredentialStatus;
}

/// GitHub API client
#[derive(Debug, Clone)]
pub struct UpstreamClient {
    http: Client,
    config: UpstreamConfig,
}

impl UpstreamClient {
    /// Create a new client from configuration
    pub fn new(config: &UpstreamConfig) -> UpstreamResult<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(format!("finegate/{}", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(UpstreamError::Request)?;

        Ok(Self {
            http,
            config: config.clone(),
        })
    }

    /// `GET /user` with the credential, returning the login and OAuth scopes
    #[instrument(skip(self, credential), fields(credential = credential.name()))]
    pub async fn current_user(
        &self,
        credential: &Credential,
    ) -> UpstreamResult<(UserInfo, Vec<String>)> {
        let header = credential.api_auth_header();
        let response = self
            .http
            .get(self.config.endpoint("/user"))
            .header(header.header_name(), header.header_value())
            .header(reqwest::header::ACCEPT, GITHUB_ACCEPT)
            .header("X-GitHub-Api-Version", GITHUB_API_VERSION)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::from_response(status.as_u16(), &body));
        }

        let scopes = response
            .headers()
            .get("X-OAuth-Scopes")
            .and_then(|v| v.to_str().ok())
            .map(parse_scopes)
            .unwrap_or_default();

        let user: UserInfo = response.json().await.map_err(|e| {
            UpstreamError::InvalidResponse(format!("Failed to parse response: {}", e))
        })?;

        debug!(login = %user.login, "Credential is valid");
        Ok((user, scopes))
    }
}

#[async_trait]
impl CredentialProbe for UpstreamClient {
    async fn probe(&self, credential: &Credential) -> CredentialStatus {
        let fallback = credential.is_fallback();
        let mut status = CredentialStatus {
            name: credential.name().to_string(),
            kind: if fallback { "classic" } else { "fine_grained" },
            valid: false,
            masked_token: credential.secret().masked(),
            user: None,
            scopes: None,
            repos: (!fallback).then(|| {
                credential
                    .repos()
                    .patterns()
                    .iter()
                    .map(ToString::to_string)
                    .collect()
            }),
            error: None,
        };

        match self.current_user(credential).await {
            Ok((user, scopes)) => {
                status.valid = true;
                status.user = Some(user.login);
                if fallback {
                    status.scopes = Some(scopes);
                }
            }
            Err(e) => {
                warn!(credential = credential.name(), error = %e, "Credential probe failed");
                status.error = Some(e.to_string());
            }
        }

        status
    }
}
