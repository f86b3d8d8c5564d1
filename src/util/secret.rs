//! Secret string type for safe token handling.
//!
//! Provides a wrapper type that prevents accidental logging of sensitive values.

use serde::Deserialize;
use std::fmt;

/// Number of characters kept visible at each end by [`SecretString::masked`]
const MASK_KEEP: usize = 4;

/// A wrapper for secrets that prevents accidental logging.
///
/// `Debug` and `Display` print `[REDACTED]`; the value is only reachable
/// through [`SecretString::expose_secret`].
///
/// # Example
/// ```ignore
/// let token = SecretString::new("ghp_0123456789abcdef");
///
/// println!("{:?}", token);        // [REDACTED]
/// println!("{}", token.masked()); // ghp_...cdef
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct SecretString(String);

impl SecretString {
    /// Create a new secret from any string-like value.
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Explicitly expose the secret value.
    ///
    /// Use this method only when the secret value is actually needed,
    /// such as when constructing authentication headers.
    #[inline]
    pub fn expose_secret(&self) -> &str {
        &self.0
    }

    /// A display form showing only the first and last four characters.
    ///
    /// Short secrets are fully hidden.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() <= 3 * MASK_KEEP {
            return "****".to_string();
        }
        let head: String = chars[..MASK_KEEP].iter().collect();
        let tail: String = chars[chars.len() - MASK_KEEP..].iter().collect();
        format!("{}...{}", head, tail)
    }
}

impl fmt::Debug for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl fmt::Display for SecretString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[REDACTED]")
    }
}

impl Drop for SecretString {
    fn drop(&mut self) {
        // Best-effort only; copies made elsewhere are not cleared.
        self.0.clear();
        self.0.shrink_to_fit();
    }
}

impl<'de> Deserialize<'de> for SecretString {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(SecretString::new)
    }
}
