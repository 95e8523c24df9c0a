//! Provider credential handling.

use std::fmt;

use derive_more::From;

/// API key used to authenticate against a completion provider.
///
/// The key is never printed: `Debug` and `Display` show a masked form that
/// keeps only the scope prefix.
#[derive(Clone, PartialEq, Eq, From)]
pub struct ApiCredential(String);

impl ApiCredential {
    /// Number of leading characters kept when masking.
    const VISIBLE_PREFIX: usize = 8;

    /// Wraps a raw API key.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Returns the raw key for building authorization headers.
    pub fn expose(&self) -> &str {
        &self.0
    }

    /// Returns true if the key is empty or whitespace only.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }

    /// Returns true if the key starts with the given prefix.
    pub fn has_prefix(&self, prefix: &str) -> bool {
        !prefix.is_empty() && self.0.starts_with(prefix)
    }

    /// Returns the key with everything past the scope prefix hidden.
    pub fn masked(&self) -> String {
        let visible: String = self.0.chars().take(Self::VISIBLE_PREFIX).collect();
        if self.0.chars().count() <= Self::VISIBLE_PREFIX {
            "****".to_owned()
        } else {
            format!("{visible}****")
        }
    }
}

impl From<&str> for ApiCredential {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl fmt::Debug for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ApiCredential").field(&self.masked()).finish()
    }
}

impl fmt::Display for ApiCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}
