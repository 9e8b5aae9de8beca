//! The verified user identity and the ID-token claims it is derived from.

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::Error;

/// A verified user identity derived from the identity provider's signed
/// ID token.
///
/// Identities are transient: they are re-derived by verifying a token, never
/// persisted by this application. The email address is the key that scopes
/// every ledger operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    /// The user's email address.
    pub email: String,
    /// The user's display name. Falls back to the email address when the
    /// provider does not supply a name.
    pub name: String,
    /// URL of the user's profile picture, if the provider supplied one.
    pub picture: Option<String>,
    /// When the underlying token was issued.
    #[serde(with = "time::serde::rfc3339")]
    pub issued_at: OffsetDateTime,
    /// When the underlying token expires.
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
}

/// The claims carried by the provider's ID token.
///
/// Only the claims this application consumes are listed; everything else in
/// the token is ignored during deserialization.
#[derive(Debug, Serialize, Deserialize)]
pub struct IdTokenClaims {
    /// The token issuer.
    pub iss: String,
    /// The audience the token was minted for. Must equal this application's
    /// client ID.
    pub aud: String,
    /// Expiry as seconds since the Unix epoch.
    pub exp: i64,
    /// Issued-at as seconds since the Unix epoch.
    pub iat: i64,
    /// The user's email address.
    pub email: String,
    /// The user's display name.
    #[serde(default)]
    pub name: Option<String>,
    /// URL of the user's profile picture.
    #[serde(default)]
    pub picture: Option<String>,
}

impl TryFrom<IdTokenClaims> for Identity {
    type Error = Error;

    fn try_from(claims: IdTokenClaims) -> Result<Self, Self::Error> {
        let issued_at = OffsetDateTime::from_unix_timestamp(claims.iat)
            .map_err(|error| Error::TokenRejected(format!("invalid iat claim: {error}")))?;
        let expires_at = OffsetDateTime::from_unix_timestamp(claims.exp)
            .map_err(|error| Error::TokenRejected(format!("invalid exp claim: {error}")))?;

        let name = claims.name.unwrap_or_else(|| claims.email.clone());

        Ok(Self {
            email: claims.email,
            name,
            picture: claims.picture,
            issued_at,
            expires_at,
        })
    }
}

#[cfg(test)]
impl Identity {
    /// An identity for tests that do not care about token plumbing.
    pub(crate) fn test(email: &str) -> Self {
        let now = OffsetDateTime::now_utc();

        Self {
            email: email.to_owned(),
            name: email.to_owned(),
            picture: None,
            issued_at: now,
            expires_at: now + time::Duration::hours(1),
        }
    }
}
