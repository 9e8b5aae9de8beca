//! The OAuth2 client half of the login flow: building the authorization URL
//! and exchanging an authorization code for the provider's tokens.

use serde::{Deserialize, Serialize};

use crate::Error;

/// Google's OAuth2 authorization endpoint.
const GOOGLE_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's OAuth2 token endpoint.
const GOOGLE_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// The scopes requested at login.
const SCOPES: [&str; 3] = [
    "openid",
    "https://www.googleapis.com/auth/userinfo.email",
    "https://www.googleapis.com/auth/userinfo.profile",
];

/// Fixed client configuration for the OAuth2 authorization-code flow, plus
/// the HTTP client used to talk to the provider.
#[derive(Clone)]
pub struct OAuthProvider {
    client_id: String,
    client_secret: String,
    redirect_uri: String,
    auth_uri: String,
    token_uri: String,
    http: reqwest::Client,
}

/// The provider's response to a successful authorization-code exchange.
///
/// Only the ID token is consumed by this application; the access token is
/// carried along for completeness but never used to call provider APIs.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenExchange {
    /// The signed OpenID identity token.
    pub id_token: String,
    /// The OAuth2 access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Lifetime of the access token in seconds.
    #[serde(default)]
    pub expires_in: Option<i64>,
}

impl OAuthProvider {
    /// Create a provider configuration for Google with the registered
    /// `redirect_uri`.
    pub fn new(client_id: &str, client_secret: &str, redirect_uri: &str) -> Self {
        Self::with_endpoints(
            client_id,
            client_secret,
            redirect_uri,
            GOOGLE_AUTH_URI,
            GOOGLE_TOKEN_URI,
        )
    }

    /// Create a provider configuration with explicit endpoint URIs.
    ///
    /// Used by tests to point the token exchange at a local stub server.
    pub fn with_endpoints(
        client_id: &str,
        client_secret: &str,
        redirect_uri: &str,
        auth_uri: &str,
        token_uri: &str,
    ) -> Self {
        Self {
            client_id: client_id.to_owned(),
            client_secret: client_secret.to_owned(),
            redirect_uri: redirect_uri.to_owned(),
            auth_uri: auth_uri.to_owned(),
            token_uri: token_uri.to_owned(),
            http: reqwest::Client::new(),
        }
    }

    /// The client ID this application is registered under.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// Build the URL the user should follow to start a login.
    ///
    /// The URL is a pure function of the fixed client configuration: the
    /// same configuration always produces the same URL. It is presented to
    /// the client as a link, never followed by the server itself.
    pub fn authorization_url(&self) -> String {
        let query = serde_urlencoded::to_string([
            ("response_type", "code"),
            ("client_id", &self.client_id),
            ("redirect_uri", &self.redirect_uri),
            ("scope", &SCOPES.join(" ")),
            ("prompt", "consent"),
        ])
        .expect("authorization URL query serialization cannot fail");

        format!("{}?{}", self.auth_uri, query)
    }

    /// Exchange a single-use authorization `code` for the provider's tokens.
    ///
    /// The request is synchronous from the caller's perspective and is not
    /// retried: an invalid, expired, or replayed code simply fails.
    ///
    /// # Errors
    /// Returns [Error::ExchangeFailed] if the provider cannot be reached,
    /// answers with a non-success status, or answers with a body that is not
    /// a token response.
    pub async fn exchange_code(&self, code: &str) -> Result<TokenExchange, Error> {
        let params = [
            ("code", code),
            ("client_id", &self.client_id),
            ("client_secret", &self.client_secret),
            ("redirect_uri", &self.redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(&self.token_uri)
            .form(&params)
            .send()
            .await
            .map_err(|error| {
                tracing::error!("Could not reach the token endpoint: {error}");
                Error::ExchangeFailed(error.to_string())
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            tracing::error!("Token exchange failed with HTTP {status}: {body}");
            return Err(Error::ExchangeFailed(format!("HTTP {status}: {body}")));
        }

        response
            .json::<TokenExchange>()
            .await
            .map_err(|error| Error::ExchangeFailed(error.to_string()))
    }
}
