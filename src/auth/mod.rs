//! Resolves which user a request belongs to.
//!
//! Logging users in is handled elsewhere; this module only verifies the
//! encrypted cookie such a service issues and hands the resulting [UserID] to
//! the route handlers.

mod cookie;
mod middleware;
mod token;
mod user;

pub use cookie::{COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, set_auth_cookie};
pub use middleware::{AuthState, auth_guard};
pub(crate) use token::Token;
pub use user::UserID;

/// The ways an auth cookie can fail verification.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum AuthError {
    /// The request has no auth cookie, or it could not be decrypted.
    #[error("no auth cookie in the cookie jar")]
    CookieMissing,

    /// The cookie decrypted but did not contain a token.
    #[error("the auth cookie does not contain a valid token")]
    InvalidToken,

    /// The token's expiry has passed.
    #[error("the auth token has expired")]
    Expired,

    /// The token could not be serialized into a cookie.
    #[error("could not serialize the auth token: {0}")]
    Serialization(String),
}
