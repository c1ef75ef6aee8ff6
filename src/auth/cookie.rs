//! Reading and writing the encrypted cookie that identifies the owner of a request.

use axum_extra::extract::{
    PrivateCookieJar,
    cookie::{Cookie, SameSite},
};
use time::{Duration, OffsetDateTime};

use crate::auth::{AuthError, Token, UserID};

/// The name of the cookie holding the serialized [Token].
pub const COOKIE_TOKEN: &str = "token";

/// The default duration for which auth cookies are valid.
pub const DEFAULT_COOKIE_DURATION: Duration = Duration::minutes(30);

/// Add an auth cookie for `user_id` to the cookie jar.
///
/// Issuing cookies is the job of whichever service logs users in; it only has
/// to share the cookie key with this server. The cookie and the token inside it
/// both expire `duration` from now.
///
/// # Errors
///
/// Returns [AuthError::Serialization] if the token cannot be serialized.
pub fn set_auth_cookie(
    jar: PrivateCookieJar,
    user_id: UserID,
    duration: Duration,
) -> Result<PrivateCookieJar, AuthError> {
    let expires_at = OffsetDateTime::now_utc() + duration;
    let token = Token {
        user_id,
        expires_at,
    };
    let token_string =
        serde_json::to_string(&token).map_err(|error| AuthError::Serialization(error.to_string()))?;

    Ok(jar.add(
        Cookie::build((COOKIE_TOKEN, token_string))
            .expires(expires_at)
            .http_only(true)
            .same_site(SameSite::Strict)
            .secure(true),
    ))
}

/// Get the token from the auth cookie in `jar`.
///
/// # Errors
///
/// Returns:
/// - [AuthError::CookieMissing] if the jar has no auth cookie, which includes
///   cookies that could not be decrypted with the server's key,
/// - [AuthError::InvalidToken] if the cookie does not hold a valid token,
/// - [AuthError::Expired] if the token has expired.
pub fn get_token_from_cookies(jar: &PrivateCookieJar) -> Result<Token, AuthError> {
    let cookie = jar.get(COOKIE_TOKEN).ok_or(AuthError::CookieMissing)?;
    let token: Token =
        serde_json::from_str(cookie.value_trimmed()).map_err(|_| AuthError::InvalidToken)?;

    if token.is_expired_at(OffsetDateTime::now_utc()) {
        return Err(AuthError::Expired);
    }

    Ok(token)
}

#[cfg(test)]
mod cookie_tests {
    use axum_extra::extract::{
        PrivateCookieJar,
        cookie::{Cookie, Key},
    };
    use sha2::{Digest, Sha512};
    use time::Duration;

    use crate::auth::{
        AuthError, UserID,
        cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, get_token_from_cookies, set_auth_cookie},
    };

    fn get_jar() -> PrivateCookieJar {
        let hash = Sha512::digest(b"foobar");
        let key = Key::from(&hash);

        PrivateCookieJar::new(key)
    }

    #[test]
    fn set_cookie_round_trips_user_id() {
        let user_id = UserID::new(12);

        let jar = set_auth_cookie(get_jar(), user_id, DEFAULT_COOKIE_DURATION).unwrap();
        let token = get_token_from_cookies(&jar).unwrap();

        assert_eq!(token.user_id, user_id);
    }

    #[test]
    fn empty_jar_has_no_cookie() {
        assert_eq!(
            get_token_from_cookies(&get_jar()),
            Err(AuthError::CookieMissing)
        );
    }

    #[test]
    fn garbage_token_is_invalid() {
        let jar = get_jar().add(Cookie::new(COOKIE_TOKEN, "not a token"));

        assert_eq!(get_token_from_cookies(&jar), Err(AuthError::InvalidToken));
    }

    #[test]
    fn expired_token_is_rejected() {
        let jar = set_auth_cookie(get_jar(), UserID::new(1), Duration::seconds(-1)).unwrap();

        assert_eq!(get_token_from_cookies(&jar), Err(AuthError::Expired));
    }
}
