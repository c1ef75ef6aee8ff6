//! Middleware for logging requests and responses.

use axum::{
    body::{Body, Bytes},
    extract::Request,
    http::{HeaderMap, StatusCode, header::CONTENT_TYPE},
    middleware::Next,
    response::{IntoResponse, Response},
};

/// The number of characters of a body that are logged at the `info` level.
pub const LOG_BODY_LENGTH_LIMIT: usize = 64;

/// Log the request and response for each request.
///
/// Both the request and response are logged at the `info` level.
/// If a text body is longer than [LOG_BODY_LENGTH_LIMIT] bytes, it is
/// truncated and the full body is logged at the `debug` level. Binary bodies,
/// such as PDF reports, are logged by their length only.
pub async fn logging_middleware(request: Request, next: Next) -> Response {
    let (parts, body) = request.into_parts();
    let body = match buffer_body(body).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read request body: {error}");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    tracing::info!(
        "Received request: {} {}\nbody: {}",
        parts.method,
        parts.uri,
        describe_body(&parts.headers, &body)
    );
    log_full_body(&parts.headers, &body);

    let response = next.run(Request::from_parts(parts, Body::from(body))).await;

    let (parts, body) = response.into_parts();
    let body = match buffer_body(body).await {
        Ok(body) => body,
        Err(error) => {
            tracing::error!("Could not read response body: {error}");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };

    tracing::info!(
        "Sending response: {}\nbody: {}",
        parts.status,
        describe_body(&parts.headers, &body)
    );
    log_full_body(&parts.headers, &body);

    Response::from_parts(parts, Body::from(body))
}

async fn buffer_body(body: Body) -> Result<Bytes, axum::Error> {
    axum::body::to_bytes(body, usize::MAX).await
}

fn is_text(headers: &HeaderMap) -> bool {
    match headers
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
    {
        Some(content_type) => {
            content_type.starts_with("text/")
                || content_type.starts_with("application/json")
                || content_type.starts_with("application/x-www-form-urlencoded")
        }
        None => true,
    }
}

/// A short, printable description of `body`.
fn describe_body(headers: &HeaderMap, body: &Bytes) -> String {
    if !is_text(headers) {
        return format!("<{} bytes>", body.len());
    }

    let text = String::from_utf8_lossy(body);
    match text.char_indices().nth(LOG_BODY_LENGTH_LIMIT) {
        Some((end, _)) => format!("{:?}...", &text[..end]),
        None => format!("{text:?}"),
    }
}

fn log_full_body(headers: &HeaderMap, body: &Bytes) {
    if is_text(headers) && body.len() > LOG_BODY_LENGTH_LIMIT {
        tracing::debug!("Full body: {:?}", String::from_utf8_lossy(body));
    }
}

#[cfg(test)]
mod logging_middleware_tests {
    use axum::{
        Router,
        body::Bytes,
        http::{HeaderMap, HeaderValue, header::CONTENT_TYPE},
        middleware,
        routing::{get, post},
    };
    use axum_test::TestServer;

    use crate::logging::{LOG_BODY_LENGTH_LIMIT, describe_body, logging_middleware};

    fn headers(content_type: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static(content_type));
        headers
    }

    #[test]
    fn binary_bodies_are_summarised() {
        let body = Bytes::from_static(b"%PDF-1.7 binary");

        assert_eq!(
            describe_body(&headers("application/pdf"), &body),
            "<15 bytes>"
        );
    }

    #[test]
    fn long_text_bodies_are_truncated() {
        let body = Bytes::from("a".repeat(LOG_BODY_LENGTH_LIMIT * 2));

        let description = describe_body(&headers("application/json"), &body);

        assert_eq!(
            description,
            format!("{:?}...", "a".repeat(LOG_BODY_LENGTH_LIMIT))
        );
    }

    #[tokio::test]
    async fn bodies_pass_through_unchanged() {
        let app = Router::new()
            .route("/echo", post(|body: String| async move { body }))
            .route("/bytes", get(|| async { vec![0u8, 159, 146, 150] }))
            .layer(middleware::from_fn(logging_middleware));
        let server = TestServer::try_new(app).expect("Could not create test server.");

        let response = server.post("/echo").text("hello").await;
        response.assert_status_ok();
        response.assert_text("hello");

        let response = server.get("/bytes").await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), &[0u8, 159, 146, 150]);
    }
}
