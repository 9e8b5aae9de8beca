//! Establishes and maintains the mapping from an inbound request to a
//! verified user identity, using an external OAuth2/OpenID provider and a
//! durable cookie for persistence across restarts.

mod cookie;
mod identity;
mod middleware;
mod provider;
mod session;
mod verify;

pub use identity::Identity;
pub use middleware::{AuthState, auth_guard};
pub use provider::OAuthProvider;
pub use session::{
    CallbackParams, LoginLink, SessionInfo, SessionState, get_callback, get_log_in, get_log_out,
    get_session,
};
pub use verify::TokenVerifier;

pub(crate) use cookie::DEFAULT_COOKIE_DURATION;

#[cfg(test)]
pub(crate) use cookie::{COOKIE_ID_TOKEN, set_session_cookie};

#[cfg(test)]
pub(crate) use provider::stub_provider;

#[cfg(test)]
pub(crate) use verify::test_tokens;
