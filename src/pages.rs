//! Static pages: the informational pages and the error templates rendered by `AppError`.

use std::any::Any;

use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

use crate::error::AppError;

pub const NOT_FOUND: &str = include_str!("../templates/pages/404.html");
pub const CSRF_FAILURE: &str = include_str!("../templates/pages/403csrf.html");
pub const SERVER_ERROR: &str = include_str!("../templates/pages/500.html");

const ABOUT: &str = include_str!("../templates/pages/about.html");
const RULES: &str = include_str!("../templates/pages/rules.html");

/// about
///
/// [Public Route] The "about the project" page.
#[utoipa::path(
    get,
    path = "/pages/about/",
    responses((status = 200, description = "About page", body = String, content_type = "text/html"))
)]
pub async fn about() -> Html<&'static str> {
    Html(ABOUT)
}

/// rules
///
/// [Public Route] The community rules page.
#[utoipa::path(
    get,
    path = "/pages/rules/",
    responses((status = 200, description = "Rules page", body = String, content_type = "text/html"))
)]
pub async fn rules() -> Html<&'static str> {
    Html(RULES)
}

/// Router fallback: any unknown path renders the 404 page.
pub async fn page_not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}

/// Converts a handler panic into the 500 page. Used by `CatchPanicLayer`.
pub fn server_error(panic: Box<dyn Any + Send + 'static>) -> Response {
    let detail = panic
        .downcast_ref::<String>()
        .map(String::as_str)
        .or_else(|| panic.downcast_ref::<&str>().copied())
        .unwrap_or("unknown panic");
    tracing::error!(panic = detail, "handler panicked");
    (StatusCode::INTERNAL_SERVER_ERROR, Html(SERVER_ERROR)).into_response()
}
