//! Authentication middleware that resolves the owner of each request.

use axum::{
    Json,
    extract::{FromRef, FromRequestParts, Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use serde_json::json;

use crate::{
    AppState,
    auth::{AuthError, cookie::get_token_from_cookies},
};

/// The state needed for the auth middleware
#[derive(Clone)]
pub struct AuthState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<AuthState> for Key {
    fn from_ref(state: &AuthState) -> Self {
        state.cookie_key.clone()
    }
}

/// Middleware function that checks for a valid auth cookie.
///
/// If the cookie holds an unexpired token, the token's [UserID](crate::UserID)
/// is placed into the request extensions and the request is executed normally.
/// A request without a cookie gets a 401 response and a request with an
/// invalid or expired token gets a 403 response, both with a JSON body of the
/// form `{"error": "..."}`.
///
/// **Note**: Route handlers can use the function argument `Extension(user_id): Extension<UserID>` to receive the user ID.
pub async fn auth_guard(State(state): State<AuthState>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let jar = match PrivateCookieJar::from_request_parts(&mut parts, &state).await {
        Ok(jar) => jar,
        Err(err) => {
            tracing::error!("Error getting cookie jar: {err:?}");
            return auth_error_response(StatusCode::UNAUTHORIZED, "Access token is required");
        }
    };

    let user_id = match get_token_from_cookies(&jar) {
        Ok(token) => token.user_id,
        Err(AuthError::CookieMissing) => {
            return auth_error_response(StatusCode::UNAUTHORIZED, "Access token is required");
        }
        Err(error) => {
            tracing::debug!("Rejecting request with bad auth cookie: {error}");
            return auth_error_response(StatusCode::FORBIDDEN, "Invalid or expired token");
        }
    };

    parts.extensions.insert(user_id);
    next.run(Request::from_parts(parts, body)).await
}

fn auth_error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}

#[cfg(test)]
mod auth_guard_tests {
    use axum::{
        Extension, Router,
        extract::State,
        middleware,
        routing::{get, post},
    };
    use axum_extra::extract::{PrivateCookieJar, cookie::Key};
    use axum_test::TestServer;
    use sha2::Digest;
    use time::Duration;

    use crate::auth::{
        AuthError, AuthState, COOKIE_TOKEN, DEFAULT_COOKIE_DURATION, UserID, auth_guard,
        set_auth_cookie,
    };

    async fn test_handler(Extension(user_id): Extension<UserID>) -> String {
        user_id.to_string()
    }

    async fn stub_log_in_route(
        State(_state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, String> {
        set_auth_cookie(jar, UserID::new(42), DEFAULT_COOKIE_DURATION)
            .map_err(|error: AuthError| error.to_string())
    }

    async fn stub_expired_log_in_route(
        State(_state): State<AuthState>,
        jar: PrivateCookieJar,
    ) -> Result<PrivateCookieJar, String> {
        set_auth_cookie(jar, UserID::new(42), Duration::seconds(-10))
            .map_err(|error: AuthError| error.to_string())
    }

    const TEST_PROTECTED_ROUTE: &str = "/api/protected";

    fn get_test_server() -> TestServer {
        let hash = sha2::Sha512::digest("nafstenoas");
        let state = AuthState {
            cookie_key: Key::from(&hash),
        };

        let app = Router::new()
            .route(TEST_PROTECTED_ROUTE, get(test_handler))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard))
            .route("/log_in", post(stub_log_in_route))
            .route("/log_in_expired", post(stub_expired_log_in_route))
            .with_state(state);

        TestServer::try_new(app).expect("Could not create test server.")
    }

    #[tokio::test]
    async fn valid_cookie_passes_user_id_to_handler() {
        let server = get_test_server();
        let response = server.post("/log_in").await;
        response.assert_status_ok();
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_ok();
        response.assert_text("42");
    }

    #[tokio::test]
    async fn missing_cookie_is_unauthorized() {
        let server = get_test_server();

        let response = server.get(TEST_PROTECTED_ROUTE).await;

        response.assert_status_unauthorized();
        response.assert_json(&serde_json::json!({ "error": "Access token is required" }));
    }

    #[tokio::test]
    async fn expired_cookie_is_forbidden() {
        let server = get_test_server();
        let response = server.post("/log_in_expired").await;
        let token_cookie = response.cookie(COOKIE_TOKEN);

        let response = server
            .get(TEST_PROTECTED_ROUTE)
            .add_cookie(token_cookie)
            .await;

        response.assert_status_forbidden();
    }
}
