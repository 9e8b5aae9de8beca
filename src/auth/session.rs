//! Route handlers for the session lifecycle: log in, OAuth callback, session
//! lookup, and log out.
//!
//! The session state machine is Anonymous -> PendingCallback (the redirect
//! back from the provider carries an authorization code) -> Authenticated
//! (the code exchanged and the ID token verified). Any failure along the way
//! lands back in Anonymous with a surfaced reason, never an automatic retry.

use std::sync::Arc;

use axum::{
    Json,
    extract::{FromRef, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    auth::{
        Identity, OAuthProvider, TokenVerifier,
        cookie::{get_token_from_cookies, invalidate_session_cookie, set_session_cookie},
    },
    endpoints,
};

/// The state needed by the session route handlers.
#[derive(Clone)]
pub struct SessionState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which the session cookie is valid.
    pub cookie_duration: Duration,
    /// The OAuth2 client configuration.
    pub oauth: Arc<OAuthProvider>,
    /// The ID-token verifier.
    pub verifier: Arc<TokenVerifier>,
}

impl FromRef<AppState> for SessionState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            oauth: state.oauth.clone(),
            verifier: state.verifier.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<SessionState> for Key {
    fn from_ref(state: &SessionState) -> Self {
        state.cookie_key.clone()
    }
}

/// The query parameters the provider's redirect may carry.
///
/// Parsed into a typed structure at the boundary; parameters other than
/// these are ignored.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// The single-use authorization code.
    pub code: Option<String>,
    /// Opaque state echoed by the provider. Parsed but unused: the
    /// authorization URL carries no per-request state.
    pub state: Option<String>,
}

/// The body returned by the log-in route.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginLink {
    /// The provider URL to follow to start a login.
    pub authorization_url: String,
}

/// The body returned by the session route.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionInfo {
    /// Whether the request resolved to a verified identity.
    pub authenticated: bool,
    /// The resolved identity, when authenticated.
    pub identity: Option<Identity>,
    /// Why the session is anonymous, when it is.
    pub reason: Option<String>,
}

/// Return the authorization URL the client should present as its login
/// affordance.
pub async fn get_log_in(State(state): State<SessionState>) -> Json<LoginLink> {
    Json(LoginLink {
        authorization_url: state.oauth.authorization_url(),
    })
}

/// Complete a login from the provider's redirect.
///
/// On success the raw ID token is stored in the session cookie and the
/// client is redirected to the root route. On failure the client is
/// redirected back to the log-in route with an `error` reason. Either way
/// the redirect drops the query string, so a page refresh can never replay
/// the single-use authorization code.
pub async fn get_callback(
    State(state): State<SessionState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let Some(code) = params.code else {
        tracing::warn!("OAuth callback was requested without an authorization code");
        return login_failure_redirect(&Error::MissingAuthCode);
    };

    match complete_login(&code, &state.oauth, &state.verifier).await {
        Ok((identity, raw_token)) => {
            tracing::info!("Logged in {}", identity.email);
            let jar = set_session_cookie(jar, &raw_token, state.cookie_duration);

            (jar, Redirect::to(endpoints::ROOT)).into_response()
        }
        Err(error) => {
            tracing::warn!("Login failed: {error}");
            login_failure_redirect(&error)
        }
    }
}

/// Report who the current user is, if anyone.
///
/// This is the `resolveSession` boundary: it never errors. The cookie token
/// is re-verified on every call, and a cookie that fails verification is
/// cleared in the same response.
pub async fn get_session(State(state): State<SessionState>, jar: PrivateCookieJar) -> Response {
    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(_) => {
            let body = SessionInfo {
                authenticated: false,
                identity: None,
                reason: Some("not signed in".to_owned()),
            };
            return (jar, Json(body)).into_response();
        }
    };

    match state.verifier.verify(&token).await {
        Ok(identity) => {
            let body = SessionInfo {
                authenticated: true,
                identity: Some(identity),
                reason: None,
            };
            (jar, Json(body)).into_response()
        }
        Err(error) => {
            tracing::warn!("Clearing session cookie that failed verification: {error}");
            let jar = invalidate_session_cookie(jar);
            let body = SessionInfo {
                authenticated: false,
                identity: None,
                reason: Some("session expired, please sign in again".to_owned()),
            };
            (jar, Json(body)).into_response()
        }
    }
}

/// Invalidate the session cookie and redirect the client to the log-in
/// route. Safe to call when already logged out.
pub async fn get_log_out(jar: PrivateCookieJar) -> Response {
    let jar = invalidate_session_cookie(jar);

    (jar, Redirect::to(endpoints::LOG_IN)).into_response()
}

/// Exchange `code` and verify the resulting ID token.
///
/// This is the only path from an authorization code to an [Identity], and it
/// runs the same verification as the cookie-restore path.
async fn complete_login(
    code: &str,
    oauth: &OAuthProvider,
    verifier: &TokenVerifier,
) -> Result<(Identity, String), Error> {
    let exchange = oauth.exchange_code(code).await?;
    let identity = verifier.verify(&exchange.id_token).await?;

    Ok((identity, exchange.id_token))
}

/// Redirect back to the log-in route with a user-facing reason.
fn login_failure_redirect(error: &Error) -> Response {
    let reason = match error {
        Error::MissingAuthCode => "Sign-in was cancelled or the authorization code is missing",
        Error::ExchangeFailed(_) => "The identity provider rejected the sign-in attempt",
        Error::TokenRejected(_) => "The identity token could not be verified",
        _ => "Sign-in failed",
    };

    let query = serde_urlencoded::to_string([("error", reason)])
        .expect("error query serialization cannot fail");

    Redirect::to(&format!("{}?{}", endpoints::LOG_IN, query)).into_response()
}
