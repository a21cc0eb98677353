use crate::{
    AppState,
    handlers::{account, comments, posts, profiles},
};
use axum::{
    Router,
    routing::{get, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `AuthUser` layer, so anonymous requests are answered
/// with 401 before a handler (or its body extractor) runs. Edit and delete routes pair a
/// GET returning the form data with a POST performing the action; both redirect
/// non-authors to the resource's public page.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Posts ---
        .route("/posts/new", get(posts::new_post_form).post(posts::create_post))
        .route(
            "/posts/{id}/edit",
            get(posts::edit_post_form).post(posts::edit_post),
        )
        .route(
            "/posts/{id}/delete",
            get(posts::delete_post_form).post(posts::delete_post),
        )
        // --- Comments ---
        // POST /posts/{id}/comment
        // The post must be visible to the actor.
        .route("/posts/{id}/comment", post(comments::add_comment))
        .route(
            "/comments/{id}/edit",
            get(comments::edit_comment_form).post(comments::edit_comment),
        )
        .route(
            "/comments/{id}/delete",
            get(comments::delete_comment_form).post(comments::delete_comment),
        )
        // --- Profile ---
        .route(
            "/profile/{username}/edit",
            get(profiles::edit_profile_form).post(profiles::edit_profile),
        )
        // POST /upload/presigned
        // Short-lived S3 PUT URL for a post image.
        .route("/upload/presigned", post(account::get_presigned_url))
}
