//! Cross-site request forgery check for state-changing requests.
//!
//! Browsers attach `Origin` (or at least `Referer`) to cross-site form posts and fetches.
//! An unsafe request whose origin is neither trusted nor the host it was sent to is
//! rejected with the CSRF failure page before any handler runs. Requests carrying
//! neither header (API clients using bearer tokens) pass.

use axum::{
    extract::{Request, State},
    http::{HeaderMap, Method, header},
    middleware::Next,
    response::Response,
};

use crate::{config::AppConfig, error::AppError};

pub async fn csrf_protect(
    State(config): State<AppConfig>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if is_safe(request.method()) {
        return Ok(next.run(request).await);
    }

    if let Some(origin) = request_origin(request.headers()) {
        if !origin_allowed(&origin, request.headers(), &config.csrf_trusted_origins) {
            tracing::warn!(%origin, method = %request.method(), uri = %request.uri(), "CSRF check failed");
            return Err(AppError::CsrfFailed(format!("origin {origin} is not trusted")));
        }
    }

    Ok(next.run(request).await)
}

fn is_safe(method: &Method) -> bool {
    matches!(
        *method,
        Method::GET | Method::HEAD | Method::OPTIONS | Method::TRACE
    )
}

/// `scheme://host[:port]` of the request, from `Origin` or else from `Referer`.
fn request_origin(headers: &HeaderMap) -> Option<String> {
    if let Some(origin) = headers.get(header::ORIGIN) {
        return Some(origin.to_str().unwrap_or("null").trim_end_matches('/').to_string());
    }

    let referer = headers.get(header::REFERER)?.to_str().ok()?;
    let (scheme, rest) = referer.split_once("://")?;
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    Some(format!("{scheme}://{authority}"))
}

fn origin_allowed(origin: &str, headers: &HeaderMap, trusted: &[String]) -> bool {
    if trusted.iter().any(|candidate| candidate == origin) {
        return true;
    }

    // Same-origin: the authority part matches the Host the request was sent to.
    let host = headers.get(header::HOST).and_then(|value| value.to_str().ok());
    match (origin.split_once("://"), host) {
        (Some((_, authority)), Some(host)) => authority.eq_ignore_ascii_case(host),
        _ => false,
    }
}
