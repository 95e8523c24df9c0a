//! Optional caller identity from a bearer token.
//!
//! Callers may send `Authorization: Bearer <jwt>` signed with HS256. The
//! extractor never rejects: a missing, malformed or unverifiable token is
//! treated as an anonymous caller, and agents requiring identity reject
//! anonymous callers further down.

use std::convert::Infallible;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use axum_extra::typed_header::TypedHeaderRejectionReason;
use immigra_gateway::Caller;
use jsonwebtoken::errors::Error as JwtError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::AuthKeys;

/// Tracing target for identity extraction.
const TRACING_TARGET: &str = "immigra_server::extract::identity";

/// Claims carried by identity tokens.
#[must_use]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthClaims {
    /// User id of the caller.
    pub sub: Uuid,
    /// Expiration time (seconds since the epoch).
    pub exp: i64,
    /// Issued-at time (seconds since the epoch).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<i64>,
}

impl AuthClaims {
    /// Verifies the token signature and expiry and returns its claims.
    pub fn decode(token: &str, auth_keys: &AuthKeys) -> Option<Result<Self, JwtError>> {
        let (decoding_key, validation) = auth_keys.verification()?;
        Some(jsonwebtoken::decode::<Self>(token, decoding_key, validation).map(|data| data.claims))
    }
}

/// Caller identity extractor.
#[must_use]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Identity(pub Caller);

impl Identity {
    /// Returns the caller.
    #[inline]
    pub fn caller(&self) -> Caller {
        self.0
    }

    fn from_bearer(token: &str, auth_keys: &AuthKeys) -> Self {
        match AuthClaims::decode(token, auth_keys) {
            Some(Ok(claims)) => Self(Caller::Authenticated(claims.sub)),
            Some(Err(error)) => {
                tracing::debug!(
                    target: TRACING_TARGET,
                    error = %error,
                    "Bearer token rejected, continuing as anonymous"
                );
                Self::default()
            }
            None => {
                tracing::trace!(
                    target: TRACING_TARGET,
                    "Token verification is not configured, continuing as anonymous"
                );
                Self::default()
            }
        }
    }
}

impl<S> FromRequestParts<S> for Identity
where
    S: Sync + Send,
    AuthKeys: FromRef<S>,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(identity) = parts.extensions.get::<Self>() {
            return Ok(*identity);
        }

        type AuthBearerHeader = TypedHeader<Authorization<Bearer>>;
        let auth_keys = AuthKeys::from_ref(state);

        let identity = match AuthBearerHeader::from_request_parts(parts, state).await {
            Ok(TypedHeader(Authorization(bearer))) => Self::from_bearer(bearer.token(), &auth_keys),
            Err(rejection) => {
                if let TypedHeaderRejectionReason::Error(error) = rejection.reason() {
                    tracing::debug!(
                        target: TRACING_TARGET,
                        error = %error,
                        "Malformed authorization header, continuing as anonymous"
                    );
                }
                Self::default()
            }
        };

        parts.extensions.insert(identity);
        Ok(identity)
    }
}

impl aide::OperationInput for Identity {}

#[cfg(test)]
mod tests {
    use axum::extract::FromRequestParts;
    use axum::http::Request;
    use jsonwebtoken::{EncodingKey, Header};

    use super::*;

    const SECRET: &str = "test-secret";

    fn token(claims: &AuthClaims, secret: &str) -> anyhow::Result<String> {
        let key = EncodingKey::from_secret(secret.as_bytes());
        Ok(jsonwebtoken::encode(&Header::default(), claims, &key)?)
    }

    fn claims(user_id: Uuid) -> AuthClaims {
        AuthClaims {
            sub: user_id,
            exp: jiff::Timestamp::now().as_second() + 3600,
            iat: None,
        }
    }

    async fn extract(authorization: Option<String>, keys: &AuthKeys) -> Identity {
        let mut builder = Request::builder().uri("/visa");
        if let Some(value) = authorization {
            builder = builder.header("authorization", value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        let Ok(identity) = Identity::from_request_parts(&mut parts, keys).await;
        identity
    }

    #[tokio::test]
    async fn valid_token_is_authenticated() -> anyhow::Result<()> {
        let keys = AuthKeys::from_secret(SECRET);
        let user_id = Uuid::new_v4();
        let bearer = format!("Bearer {}", token(&claims(user_id), SECRET)?);

        let identity = extract(Some(bearer), &keys).await;
        assert_eq!(identity.caller(), Caller::Authenticated(user_id));
        Ok(())
    }

    #[tokio::test]
    async fn missing_or_bad_tokens_are_anonymous() -> anyhow::Result<()> {
        let keys = AuthKeys::from_secret(SECRET);

        assert_eq!(extract(None, &keys).await.caller(), Caller::Anonymous);
        assert_eq!(
            extract(Some("Bearer not-a-jwt".into()), &keys).await.caller(),
            Caller::Anonymous
        );

        let forged = format!("Bearer {}", token(&claims(Uuid::new_v4()), "other")?);
        assert_eq!(extract(Some(forged), &keys).await.caller(), Caller::Anonymous);

        let mut expired = claims(Uuid::new_v4());
        expired.exp = jiff::Timestamp::now().as_second() - 3600;
        let expired = format!("Bearer {}", token(&expired, SECRET)?);
        assert_eq!(extract(Some(expired), &keys).await.caller(), Caller::Anonymous);
        Ok(())
    }

    #[tokio::test]
    async fn disabled_keys_ignore_tokens() -> anyhow::Result<()> {
        let keys = AuthKeys::disabled();
        let bearer = format!("Bearer {}", token(&claims(Uuid::new_v4()), SECRET)?);
        assert_eq!(extract(Some(bearer), &keys).await.caller(), Caller::Anonymous);
        Ok(())
    }
}
