//! Identity token verification keys.

use std::fmt;
use std::sync::Arc;

use jsonwebtoken::{Algorithm, DecodingKey, Validation};

/// Shared secret used to verify HS256 identity tokens.
///
/// Built from an optional secret; without one every caller is anonymous.
#[derive(Clone, Default)]
pub struct AuthKeys {
    inner: Option<Arc<AuthKeysInner>>,
}

struct AuthKeysInner {
    decoding_key: DecodingKey,
    validation: Validation,
}

impl AuthKeys {
    /// Creates keys from a shared secret. A blank secret disables verification.
    pub fn from_secret(secret: &str) -> Self {
        if secret.trim().is_empty() {
            return Self::disabled();
        }

        let inner = AuthKeysInner {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation: Validation::new(Algorithm::HS256),
        };

        Self {
            inner: Some(Arc::new(inner)),
        }
    }

    /// Keys that never verify a token.
    pub fn disabled() -> Self {
        Self { inner: None }
    }

    /// Returns true if tokens can be verified.
    pub fn is_enabled(&self) -> bool {
        self.inner.is_some()
    }

    /// Returns the decoding key and validation rules, if enabled.
    pub fn verification(&self) -> Option<(&DecodingKey, &Validation)> {
        self.inner
            .as_deref()
            .map(|inner| (&inner.decoding_key, &inner.validation))
    }
}

impl fmt::Debug for AuthKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthKeys")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}
