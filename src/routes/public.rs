use crate::{
    AppState,
    handlers::{account, posts, profiles},
    pages,
};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable by anonymous readers. Post detail and profile resolve an optional
/// identity so that authors see their own hidden posts.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(|| async { "ok" }))
        // GET /?page=N
        // Visible posts, newest first.
        .route("/", get(posts::index))
        // GET /posts/{id}/
        // 404 unless visible or requested by its author.
        .route("/posts/{id}/", get(posts::post_detail))
        // GET /category/{slug}/?page=N
        .route("/category/{slug}/", get(posts::category_posts))
        // GET /profile/{username}?page=N
        .route("/profile/{username}", get(profiles::profile))
        // POST /auth/registration
        // Sign-up through the external identity provider.
        .route("/auth/registration", post(account::register_user))
        // Static pages.
        .route("/pages/about/", get(pages::about))
        .route("/pages/rules/", get(pages::rules))
}
