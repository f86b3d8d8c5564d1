//! Authorization kernel
//!
//! Composes classification, policy evaluation and credential selection into
//! one decision function:
//!
//! ```text
//! request → Classifier → required actions + repo
//!                      → PolicyEvaluator → allow / deny
//!                      → CredentialSet (allow only) → Decision
//! ```
//!
//! A [`Kernel`] is an immutable snapshot of taxonomy, rules and credentials.
//! [`SharedKernel`] swaps snapshots atomically for configuration reloads.

pub mod decision;

pub use decision::{Decision, Outcome};

use crate::access_control::{DenyReason, Evaluation, PolicyEvaluator, RepoId};
use crate::classifier::{Classifier, Request};
use crate::config::AppConfig;
use crate::credentials::CredentialSet;
use crate::error::ConfigError;
use crate::taxonomy::{self, ActionSet, Taxonomy, join_actions};
use std::sync::{Arc, RwLock};
use tracing::{info, warn};

/// Immutable authorization snapshot
#[derive(Debug, Clone)]
pub struct Kernel {
    classifier: Classifier,
    evaluator: PolicyEvaluator,
    credentials: CredentialSet,
}

impl Kernel {
    pub fn new(
        taxonomy: Arc<Taxonomy>,
        evaluator: PolicyEvaluator,
        credentials: CredentialSet,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            classifier: Classifier::new(taxonomy)?,
            evaluator,
            credentials,
        })
    }

    /// Build a snapshot from loaded configuration with the GitHub catalog
    pub fn from_config(config: &AppConfig) -> Result<Self, ConfigError> {
        let taxonomy = Arc::new(taxonomy::github()?);
        let evaluator = PolicyEvaluator::new(&config.rules, &taxonomy)?;
        let credentials = CredentialSet::from_config(&config.credentials)?;
        Self::new(taxonomy, evaluator, credentials)
    }

    /// Decide one request.
    ///
    /// Classification and evaluation complete before any credential is
    /// looked at; a denied request never selects one.
    pub fn authorize(&self, request: &Request) -> Decision {
        let classification = match self.classifier.classify(request) {
            Ok(classification) => classification,
            Err(e) => {
                let repo = request.declared_repo().and_then(RepoId::parse);
                warn!(
                    kind = request.kind(),
                    repo = ?repo.as_ref().map(RepoId::full_name),
                    reason = %e,
                    "Denied unclassified request"
                );
                return Decision::deny(
                    repo,
                    ActionSet::new(),
                    DenyReason::Unclassified { reason: e.reason },
                );
            }
        };

        let repo_name = classification.repo.full_name();
        match self.evaluator.evaluate(&classification.actions, &repo_name) {
            Evaluation::Deny(reason) => {
                warn!(
                    repo = %repo_name,
                    actions = %join_actions(&classification.actions),
                    reason = %reason,
                    "Access denied"
                );
                Decision::deny(Some(classification.repo), classification.actions, reason)
            }
            Evaluation::Allow { rule } => {
                let credential = Arc::clone(self.credentials.select(&repo_name));
                info!(
                    repo = %repo_name,
                    actions = %join_actions(&classification.actions),
                    rule = %rule,
                    credential = credential.name(),
                    "Access allowed"
                );
                Decision::allow(classification.repo, classification.actions, rule, credential)
            }
        }
    }

    pub fn taxonomy(&self) -> &Arc<Taxonomy> {
        self.classifier.taxonomy()
    }

    pub fn evaluator(&self) -> &PolicyEvaluator {
        &self.evaluator
    }

    pub fn credentials(&self) -> &CredentialSet {
        &self.credentials
    }
}

/// The active kernel snapshot, replaceable at runtime
///
/// Readers clone the `Arc` and drop the lock before authorizing, so a swap
/// is never observed half-done.
#[derive(Debug)]
pub struct SharedKernel {
    current: RwLock<Arc<Kernel>>,
}

impl SharedKernel {
    pub fn new(kernel: Kernel) -> Self {
        Self {
            current: RwLock::new(Arc::new(kernel)),
        }
    }

    /// The snapshot in effect right now
    pub fn current(&self) -> Arc<Kernel> {
        match self.current.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Install a new snapshot; in-flight calls finish on the old one
    pub fn replace(&self, kernel: Kernel) {
        let next = Arc::new(kernel);
        match self.current.write() {
            Ok(mut guard) => *guard = next,
            Err(poisoned) => *poisoned.into_inner() = next,
        }
    }

    /// Authorize against the current snapshot
    pub fn authorize(&self, request: &Request) -> Decision {
        self.current().authorize(request)
    }
}
