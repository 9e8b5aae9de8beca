//! The durable session cookie that carries the provider's raw ID token.
//!
//! The cookie only short-circuits the login redirect: its value is never
//! trusted as-is and is re-verified against the provider's signing keys on
//! every request that reads it.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::Error;

/// The name of the cookie holding the raw ID token.
pub(crate) const COOKIE_ID_TOKEN: &str = "id_token";

/// How long the session cookie persists.
pub(crate) const DEFAULT_COOKIE_DURATION: Duration = Duration::hours(24);

/// Store `token` in the session cookie, valid for `duration` from now.
///
/// Returns the cookie jar with the cookie added.
pub(crate) fn set_session_cookie(
    jar: PrivateCookieJar,
    token: &str,
    duration: Duration,
) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_ID_TOKEN, token.to_owned()))
            .expires(OffsetDateTime::now_utc() + duration)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Set the session cookie to an empty value and set its max age to zero,
/// which should delete the cookie on the client side.
pub(crate) fn invalidate_session_cookie(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.add(
        Cookie::build((COOKIE_ID_TOKEN, ""))
            .expires(OffsetDateTime::UNIX_EPOCH)
            .max_age(Duration::ZERO)
            .path("/")
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    )
}

/// Read the raw ID token from the session cookie.
///
/// An empty value counts as a cleared cookie.
///
/// # Errors
/// Returns [Error::CookieMissing] if the cookie is absent or empty.
pub(crate) fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<String, Error> {
    match jar.get(COOKIE_ID_TOKEN) {
        Some(cookie) if !cookie.value_trimmed().is_empty() => {
            Ok(cookie.value_trimmed().to_owned())
        }
        _ => Err(Error::CookieMissing),
    }
}
