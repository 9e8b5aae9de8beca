//! ID-token verification against the identity provider's signing keys.
//!
//! Every acceptance path into an authenticated session, whether a fresh OAuth
//! callback or a cookie restore, goes through [TokenVerifier::verify] so that
//! the signature, audience, issuer, and expiry checks cannot be bypassed.

use std::collections::HashMap;

use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode, decode_header};
use serde::Deserialize;
use tokio::sync::RwLock;

use crate::{
    Error,
    auth::identity::{IdTokenClaims, Identity},
};

/// The tolerated clock skew, in seconds, when checking token expiry.
const CLOCK_SKEW_SECONDS: u64 = 10;

/// Where Google publishes its current token signing keys (JWK set).
const GOOGLE_CERTS_URI: &str = "https://www.googleapis.com/oauth2/v3/certs";

/// The issuer values Google uses in ID tokens.
const GOOGLE_ISSUERS: [&str; 2] = ["https://accounts.google.com", "accounts.google.com"];

/// Verifies identity-provider ID tokens.
///
/// Holds the provider's public signing keys, keyed by key ID. Keys are
/// fetched lazily and refreshed when a token arrives signed by an unknown
/// key, which is how provider key rotation is absorbed without restarts.
pub struct TokenVerifier {
    client_id: String,
    algorithm: Algorithm,
    issuers: Vec<String>,
    certs_uri: Option<String>,
    http: reqwest::Client,
    keys: RwLock<HashMap<String, DecodingKey>>,
}

/// One entry in the provider's published JWK set.
#[derive(Debug, Deserialize)]
struct Jwk {
    kid: String,
    n: String,
    e: String,
}

#[derive(Debug, Deserialize)]
struct JwkSet {
    keys: Vec<Jwk>,
}

impl TokenVerifier {
    /// Create a verifier for Google-issued ID tokens minted for `client_id`.
    pub fn new(client_id: &str) -> Self {
        Self {
            client_id: client_id.to_owned(),
            algorithm: Algorithm::RS256,
            issuers: GOOGLE_ISSUERS.iter().map(|s| (*s).to_owned()).collect(),
            certs_uri: Some(GOOGLE_CERTS_URI.to_owned()),
            http: reqwest::Client::new(),
            keys: RwLock::new(HashMap::new()),
        }
    }

    /// Create a verifier with a fixed key set and algorithm.
    ///
    /// No network access is performed: a token signed by a key that is not in
    /// `keys` is rejected outright. Intended for tests and for deployments
    /// that pin the provider keys.
    pub fn with_keys(
        client_id: &str,
        algorithm: Algorithm,
        issuers: &[&str],
        keys: HashMap<String, DecodingKey>,
    ) -> Self {
        Self {
            client_id: client_id.to_owned(),
            algorithm,
            issuers: issuers.iter().map(|s| (*s).to_owned()).collect(),
            certs_uri: None,
            http: reqwest::Client::new(),
            keys: RwLock::new(keys),
        }
    }

    /// Verify `token` and derive the [Identity] it asserts.
    ///
    /// Checks, in order: the token parses, the signing key is known (fetching
    /// fresh provider keys once if not), the signature is valid, the audience
    /// equals the configured client ID, the issuer is recognized, and the
    /// token has not expired (with [CLOCK_SKEW_SECONDS] of leeway).
    ///
    /// # Errors
    /// Returns [Error::TokenRejected] describing the first check that failed.
    pub async fn verify(&self, token: &str) -> Result<Identity, Error> {
        let header = decode_header(token)
            .map_err(|error| Error::TokenRejected(format!("malformed token: {error}")))?;
        let kid = header
            .kid
            .ok_or_else(|| Error::TokenRejected("token header is missing a key id".to_owned()))?;

        let key = match self.get_key(&kid).await {
            Some(key) => key,
            None => {
                self.refresh_keys().await?;
                self.get_key(&kid).await.ok_or_else(|| {
                    Error::TokenRejected(format!("no signing key with id {kid:?}"))
                })?
            }
        };

        let mut validation = Validation::new(self.algorithm);
        validation.set_audience(&[&self.client_id]);
        validation.set_issuer(&self.issuers);
        validation.leeway = CLOCK_SKEW_SECONDS;

        let token_data = decode::<IdTokenClaims>(token, &key, &validation)
            .map_err(|error| Error::TokenRejected(error.to_string()))?;

        Identity::try_from(token_data.claims)
    }

    async fn get_key(&self, kid: &str) -> Option<DecodingKey> {
        self.keys.read().await.get(kid).cloned()
    }

    /// Fetch the provider's current JWK set and replace the cached keys.
    ///
    /// # Errors
    /// Returns [Error::TokenRejected] if no certs URI is configured, or
    /// [Error::ExchangeFailed] if the fetch itself fails.
    async fn refresh_keys(&self) -> Result<(), Error> {
        let certs_uri = self.certs_uri.as_ref().ok_or_else(|| {
            Error::TokenRejected("token signed by an unknown key".to_owned())
        })?;

        let jwk_set: JwkSet = self
            .http
            .get(certs_uri)
            .send()
            .await
            .map_err(|error| Error::ExchangeFailed(error.to_string()))?
            .error_for_status()
            .map_err(|error| Error::ExchangeFailed(error.to_string()))?
            .json()
            .await
            .map_err(|error| Error::ExchangeFailed(error.to_string()))?;

        let mut keys = HashMap::with_capacity(jwk_set.keys.len());
        for jwk in jwk_set.keys {
            match DecodingKey::from_rsa_components(&jwk.n, &jwk.e) {
                Ok(key) => {
                    keys.insert(jwk.kid, key);
                }
                Err(error) => {
                    tracing::warn!("Skipping unusable signing key {:?}: {error}", jwk.kid);
                }
            }
        }

        tracing::debug!("Loaded {} provider signing keys", keys.len());
        *self.keys.write().await = keys;

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_tokens {
    //! Helpers for minting HS256 tokens that exercise the verifier without
    //! touching the network.

    use std::collections::HashMap;

    use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, encode};
    use time::{Duration, OffsetDateTime};

    use crate::auth::identity::IdTokenClaims;

    use super::TokenVerifier;

    pub(crate) const TEST_CLIENT_ID: &str = "test-client-id.apps.example";
    pub(crate) const TEST_ISSUER: &str = "https://accounts.google.com";
    pub(crate) const TEST_KEY_ID: &str = "test-key-1";
    const TEST_SECRET: &[u8] = b"an-hmac-secret-for-tests-only";

    pub(crate) fn get_test_verifier() -> TokenVerifier {
        let keys = HashMap::from([(
            TEST_KEY_ID.to_owned(),
            DecodingKey::from_secret(TEST_SECRET),
        )]);

        TokenVerifier::with_keys(TEST_CLIENT_ID, Algorithm::HS256, &[TEST_ISSUER], keys)
    }

    pub(crate) fn get_test_claims(email: &str) -> IdTokenClaims {
        let now = OffsetDateTime::now_utc();

        IdTokenClaims {
            iss: TEST_ISSUER.to_owned(),
            aud: TEST_CLIENT_ID.to_owned(),
            exp: (now + Duration::hours(1)).unix_timestamp(),
            iat: now.unix_timestamp(),
            email: email.to_owned(),
            name: Some("Test User".to_owned()),
            picture: None,
        }
    }

    pub(crate) fn encode_token(claims: &IdTokenClaims) -> String {
        encode_token_with_key_id(claims, TEST_KEY_ID)
    }

    pub(crate) fn encode_token_with_key_id(claims: &IdTokenClaims, key_id: &str) -> String {
        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(key_id.to_owned());

        encode(&header, claims, &EncodingKey::from_secret(TEST_SECRET))
            .expect("could not encode test token")
    }
}

#[cfg(test)]
mod verify_tests {
    use time::{Duration, OffsetDateTime};

    use crate::Error;

    use super::test_tokens::{
        encode_token, encode_token_with_key_id, get_test_claims, get_test_verifier,
    };

    #[tokio::test]
    async fn verify_accepts_valid_token() {
        let verifier = get_test_verifier();
        let token = encode_token(&get_test_claims("foo@bar.baz"));

        let identity = verifier.verify(&token).await.unwrap();

        assert_eq!(identity.email, "foo@bar.baz");
        assert_eq!(identity.name, "Test User");
    }

    #[tokio::test]
    async fn verify_rejects_wrong_audience() {
        let verifier = get_test_verifier();
        let mut claims = get_test_claims("foo@bar.baz");
        claims.aud = "someone-elses-client-id".to_owned();
        let token = encode_token(&claims);

        let result = verifier.verify(&token).await;

        // Signature and expiry are valid here; the audience check alone must
        // reject the token.
        assert!(
            matches!(result, Err(Error::TokenRejected(_))),
            "got {result:?}, want Err(TokenRejected)"
        );
    }

    #[tokio::test]
    async fn verify_rejects_wrong_issuer() {
        let verifier = get_test_verifier();
        let mut claims = get_test_claims("foo@bar.baz");
        claims.iss = "https://evil.example".to_owned();
        let token = encode_token(&claims);

        let result = verifier.verify(&token).await;

        assert!(
            matches!(result, Err(Error::TokenRejected(_))),
            "got {result:?}, want Err(TokenRejected)"
        );
    }

    #[tokio::test]
    async fn verify_rejects_expired_token() {
        let verifier = get_test_verifier();
        let mut claims = get_test_claims("foo@bar.baz");
        claims.exp = (OffsetDateTime::now_utc() - Duration::hours(1)).unix_timestamp();
        let token = encode_token(&claims);

        let result = verifier.verify(&token).await;

        assert!(
            matches!(result, Err(Error::TokenRejected(_))),
            "got {result:?}, want Err(TokenRejected)"
        );
    }

    #[tokio::test]
    async fn verify_tolerates_clock_skew() {
        let verifier = get_test_verifier();
        let mut claims = get_test_claims("foo@bar.baz");
        // Expired five seconds ago, which is within the ten second leeway.
        claims.exp = (OffsetDateTime::now_utc() - Duration::seconds(5)).unix_timestamp();
        let token = encode_token(&claims);

        let result = verifier.verify(&token).await;

        assert!(result.is_ok(), "got {result:?}, want Ok");
    }

    #[tokio::test]
    async fn verify_rejects_unknown_signing_key() {
        let verifier = get_test_verifier();
        let token = encode_token_with_key_id(&get_test_claims("foo@bar.baz"), "rotated-away");

        let result = verifier.verify(&token).await;

        assert!(
            matches!(result, Err(Error::TokenRejected(_))),
            "got {result:?}, want Err(TokenRejected)"
        );
    }

    #[tokio::test]
    async fn verify_rejects_tampered_token() {
        let verifier = get_test_verifier();
        let token = encode_token(&get_test_claims("foo@bar.baz"));
        // Flip a character in the payload segment.
        let tampered = token.replace('.', ".A");

        let result = verifier.verify(&tampered).await;

        assert!(
            matches!(result, Err(Error::TokenRejected(_))),
            "got {result:?}, want Err(TokenRejected)"
        );
    }
}
