//! Action identifiers
//!
//! An action is an immutable, case-sensitive `namespace:verb` string.

use crate::error::ConfigError;
use serde::{Serialize, Serializer};
use std::borrow::Borrow;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

/// Ordered set of actions. Ordering keeps decisions and log output deterministic.
pub type ActionSet = BTreeSet<Action>;

/// A concrete action or bundle name of the form `namespace:verb`
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Action(Arc<str>);

impl Action {
    /// Parse and validate an action name.
    ///
    /// Both segments must be non-empty and consist of lowercase ASCII letters,
    /// digits, `_` or `-`. Wildcards are not actions.
    pub fn parse(name: &str) -> Result<Self, ConfigError> {
        let malformed = || ConfigError::MalformedAction {
            action: name.to_string(),
        };

        let (namespace, verb) = name.split_once(':').ok_or_else(malformed)?;
        if !is_segment(namespace) || !is_segment(verb) {
            return Err(malformed());
        }

        Ok(Self(Arc::from(name)))
    }

    /// The resource category, e.g. `pr` for `pr:approve`
    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(&self.0)
    }

    /// The operation, e.g. `approve` for `pr:approve`
    pub fn verb(&self) -> &str {
        self.0.split_once(':').map(|(_, v)| v).unwrap_or("")
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_segment(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'_' || b == b'-')
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Action({})", self.0)
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for Action {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Action {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Serialize for Action {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.0)
    }
}

/// Render a set of actions as a comma separated list
pub fn join_actions<'a>(actions: impl IntoIterator<Item = &'a Action>) -> String {
    actions
        .into_iter()
        .map(Action::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
