use crate::{AppState, handlers::admin};
use axum::{
    Router,
    routing::{get, patch, put},
};

/// Admin Router Module
///
/// Nested under `/admin`. Handlers authenticate through `AuthUser` and then require the
/// "admin" role, answering 403 otherwise.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // GET /admin/posts?search=&author=&category=&created_from=&created_to=&page=
        // All posts, ordered by title.
        .route("/posts", get(admin::list_posts))
        // PATCH /admin/posts/{id}
        // Publication flag and category, edited straight from the listing.
        .route("/posts/{id}", patch(admin::update_post))
        .route(
            "/categories",
            get(admin::list_categories).post(admin::create_category),
        )
        // PUT /admin/categories/{id}/status
        // Hiding a category hides every post in it.
        .route("/categories/{id}/status", put(admin::set_category_status))
        .route(
            "/locations",
            get(admin::list_locations).post(admin::create_location),
        )
}
