//! Action registry
//!
//! Holds the primitive actions (layer 1), grouped by namespace, and the
//! bundles (layer 2) with their flattened expansions. A [`Taxonomy`] is built
//! once through [`TaxonomyBuilder`] and never mutated afterwards.

use crate::error::ConfigError;
use crate::taxonomy::action::{Action, ActionSet};
use std::collections::BTreeMap;
use tracing::trace;

/// Universal wildcard, expands to every primitive action
pub const WILDCARD: &str = "*";

/// Builder for an immutable [`Taxonomy`].
///
/// Every registration is validated immediately. A bundle may only reference
/// primitives and bundles registered before it, so the bundle graph is
/// acyclic by construction; a bundle naming itself is reported as a cycle.
#[derive(Debug, Default)]
pub struct TaxonomyBuilder {
    namespaces: BTreeMap<String, ActionSet>,
    primitives: ActionSet,
    bundles: BTreeMap<Action, ActionSet>,
}

impl TaxonomyBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a single primitive action
    pub fn primitive(&mut self, name: &str) -> Result<&mut Self, ConfigError> {
        let action = Action::parse(name)?;
        if self.primitives.contains(name) || self.bundles.contains_key(name) {
            return Err(ConfigError::Duplicate {
                name: name.to_string(),
            });
        }

        self.namespaces
            .entry(action.namespace().to_string())
            .or_default()
            .insert(action.clone());
        self.primitives.insert(action);
        Ok(self)
    }

    /// Register several primitive actions
    pub fn primitives(&mut self, names: &[&str]) -> Result<&mut Self, ConfigError> {
        for name in names {
            self.primitive(name)?;
        }
        Ok(self)
    }

    /// Register a bundle over previously registered primitives and bundles.
    ///
    /// The flattened expansion is computed here and memoized.
    pub fn bundle(&mut self, name: &str, members: &[&str]) -> Result<&mut Self, ConfigError> {
        let bundle = Action::parse(name)?;
        if self.primitives.contains(name) || self.bundles.contains_key(name) {
            return Err(ConfigError::Duplicate {
                name: name.to_string(),
            });
        }

        let mut expansion = ActionSet::new();
        for member in members {
            if *member == name {
                return Err(ConfigError::CyclicBundle {
                    bundle: name.to_string(),
                    path: format!("{} -> {}", name, member),
                });
            }
            if let Some(primitive) = self.primitives.get(*member) {
                expansion.insert(primitive.clone());
            } else if let Some(nested) = self.bundles.get(*member) {
                expansion.extend(nested.iter().cloned());
            } else {
                return Err(ConfigError::UnknownAction {
                    action: member.to_string(),
                });
            }
        }

        if expansion.is_empty() {
            return Err(ConfigError::EmptyBundle {
                bundle: name.to_string(),
            });
        }

        trace!(bundle = name, size = expansion.len(), "Registered bundle");
        self.bundles.insert(bundle, expansion);
        Ok(self)
    }

    pub fn build(self) -> Taxonomy {
        Taxonomy {
            namespaces: self.namespaces,
            primitives: self.primitives,
            bundles: self.bundles,
        }
    }
}

/// Immutable registry of actions and bundles
#[derive(Debug, Clone)]
pub struct Taxonomy {
    namespaces: BTreeMap<String, ActionSet>,
    primitives: ActionSet,
    bundles: BTreeMap<Action, ActionSet>,
}

impl Taxonomy {
    /// Expand an action pattern into the primitive actions it denotes.
    ///
    /// Accepts the universal wildcard `*`, a bundle name, a namespace
    /// wildcard `ns:*`, or a literal primitive. Anything else is an error.
    pub fn expand(&self, pattern: &str) -> Result<ActionSet, ConfigError> {
        if pattern == WILDCARD {
            return Ok(self.primitives.clone());
        }

        if let Some(expansion) = self.bundles.get(pattern) {
            return Ok(expansion.clone());
        }

        if let Some(namespace) = pattern.strip_suffix(":*") {
            return self
                .namespaces
                .get(namespace)
                .cloned()
                .ok_or_else(|| ConfigError::UnknownNamespace {
                    namespace: namespace.to_string(),
                });
        }

        if let Some(action) = self.primitives.get(pattern) {
            return Ok(ActionSet::from([action.clone()]));
        }

        if pattern.contains('*') {
            return Err(ConfigError::Invalid {
                message: format!(
                    "action pattern '{}' uses an unsupported wildcard (only '*' and 'namespace:*' are allowed)",
                    pattern
                ),
            });
        }

        Err(ConfigError::UnknownAction {
            action: pattern.to_string(),
        })
    }

    /// Check whether `action` is a registered primitive
    pub fn is_known(&self, action: &str) -> bool {
        self.primitives.contains(action)
    }

    /// Check whether `name` is a registered bundle
    pub fn is_bundle(&self, name: &str) -> bool {
        self.bundles.contains_key(name)
    }

    /// Look up a registered primitive by name
    pub fn action(&self, name: &str) -> Result<Action, ConfigError> {
        self.primitives
            .get(name)
            .cloned()
            .ok_or_else(|| ConfigError::UnknownAction {
                action: name.to_string(),
            })
    }

    /// All primitive actions
    pub fn primitive_actions(&self) -> &ActionSet {
        &self.primitives
    }

    /// Registered namespaces with their primitives
    pub fn namespaces(&self) -> impl Iterator<Item = (&str, &ActionSet)> {
        self.namespaces.iter().map(|(ns, set)| (ns.as_str(), set))
    }

    /// Registered bundles with their flattened expansions
    pub fn bundles(&self) -> impl Iterator<Item = (&Action, &ActionSet)> {
        self.bundles.iter()
    }
}
