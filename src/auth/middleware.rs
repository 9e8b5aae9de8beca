//! Authentication middleware that re-verifies the session cookie on every
//! request and makes the resolved identity available to route handlers.

use std::sync::Arc;

use axum::{
    extract::{FromRef, FromRequestParts, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};

use crate::{
    AppState, Error,
    auth::{
        TokenVerifier,
        cookie::{get_token_from_cookies, invalidate_session_cookie},
    },
};

/// The state needed for the auth middleware.
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The ID-token verifier.
    pub verifier: Arc<TokenVerifier>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            verifier: state.verifier.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that requires a session cookie carrying a token that
/// verifies. The token is re-verified on every request; no trust decision
/// outlives the request that made it.
///
/// **Note**: Route handlers can use the function argument
/// `Extension(identity): Extension<Identity>` to receive the verified
/// identity.
///
/// A request without a valid session is answered with 401 and, when a stale
/// cookie was presented, the cookie is cleared in the same response.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return Error::CookieMissing.into_response();
        }
    };

    let token = match get_token_from_cookies(&jar) {
        Ok(token) => token,
        Err(error) => return error.into_response(),
    };

    let identity = match state.verifier.verify(&token).await {
        Ok(identity) => identity,
        Err(error) => {
            tracing::warn!("Rejecting request with a cookie that failed verification: {error}");
            return (invalidate_session_cookie(jar), error).into_response();
        }
    };

    parts.extensions.insert(identity);
    let request = Request::from_parts(parts, body);

    next.run(request).await
}
