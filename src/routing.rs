//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Json, Router,
    http::StatusCode,
    middleware,
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::json;

use crate::{AppState, auth_guard, endpoints, report::export_pdf_endpoint, summary::get_summary};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route(endpoints::EXPORT_PDF, get(export_pdf_endpoint))
        .route(endpoints::SUMMARY, get(get_summary))
        .layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    protected_routes
        .fallback(get_404_not_found)
        .with_state(state)
}

async fn get_404_not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(json!({ "error": "Route not found" })),
    )
        .into_response()
}
