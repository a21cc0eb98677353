use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};

use super::{to_post_detail, validated, visible_post};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    guard::can_modify,
    models::{Comment, CommentForm},
};

/// add_comment
///
/// [Authenticated Route] Comments on a post the actor can see. Anonymous requests are
/// rejected before anything is read. An invalid body creates nothing; the actor is sent
/// back to the post either way.
#[utoipa::path(
    post,
    path = "/posts/{id}/comment",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = CommentForm,
    responses(
        (status = 303, description = "Redirect to the post"),
        (status = 401, description = "Not authenticated"),
        (status = 404, description = "Unknown or not visible post")
    )
)]
pub async fn add_comment(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> AppResult<Redirect> {
    let post = visible_post(&state.repo, post_id, Some(&actor)).await?;

    match validated(payload) {
        Ok(form) => {
            state.repo.add_comment(post.id, actor.id, form.text).await?;
        }
        Err(err) => {
            tracing::warn!(post_id, actor = %actor.username, error = %err, "comment discarded");
        }
    }
    Ok(to_post_detail(post.id))
}

/// edit_comment_form
///
/// [Authenticated Route] The comment to edit, for its author only.
#[utoipa::path(
    get,
    path = "/comments/{id}/edit",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 303, description = "Not the author, redirect to the post")
    )
)]
pub async fn edit_comment_form(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let comment = existing_comment(&state, id).await?;
    if !can_modify(Some(&actor), &comment) {
        return Ok(to_post_detail(comment.post_id).into_response());
    }
    Ok(Json(comment).into_response())
}

/// edit_comment
///
/// [Authenticated Route] Replaces the text of a comment.
#[utoipa::path(
    post,
    path = "/comments/{id}/edit",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = CommentForm,
    responses(
        (status = 303, description = "Redirect to the post"),
        (status = 400, description = "Invalid form"),
        (status = 404, description = "Unknown comment")
    )
)]
pub async fn edit_comment(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<CommentForm>, JsonRejection>,
) -> AppResult<Redirect> {
    let comment = existing_comment(&state, id).await?;
    if !can_modify(Some(&actor), &comment) {
        return Ok(to_post_detail(comment.post_id));
    }

    let form = validated(payload)?;
    state
        .repo
        .update_comment(id, actor.id, form.text)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {id}")))?;
    Ok(to_post_detail(comment.post_id))
}

/// delete_comment_form
///
/// [Authenticated Route] The comment to confirm deletion of, for its author only.
#[utoipa::path(
    get,
    path = "/comments/{id}/delete",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 200, description = "Comment", body = Comment),
        (status = 303, description = "Not the author, redirect to the post")
    )
)]
pub async fn delete_comment_form(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let comment = existing_comment(&state, id).await?;
    if !can_modify(Some(&actor), &comment) {
        return Ok(to_post_detail(comment.post_id).into_response());
    }
    Ok(Json(comment).into_response())
}

/// delete_comment
///
/// [Authenticated Route] Deletes a comment. Only its author may; anyone else is
/// redirected to the post.
#[utoipa::path(
    post,
    path = "/comments/{id}/delete",
    params(("id" = i64, Path, description = "Comment ID")),
    responses(
        (status = 303, description = "Redirect to the post"),
        (status = 404, description = "Unknown comment")
    )
)]
pub async fn delete_comment(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let comment = existing_comment(&state, id).await?;
    if can_modify(Some(&actor), &comment) {
        state.repo.delete_comment(id, actor.id).await?;
    }
    Ok(to_post_detail(comment.post_id))
}

async fn existing_comment(state: &AppState, id: i64) -> AppResult<Comment> {
    state
        .repo
        .get_comment(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("comment {id}")))
}
