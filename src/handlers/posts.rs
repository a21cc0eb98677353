use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use super::{to_post_detail, to_profile, validated, visible_post};
use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    error::{AppError, AppResult},
    guard::can_modify,
    models::{CategoryPage, Post, PostDetail, PostEditPage, PostForm, PostFormChoices},
    pagination::{Page, PageQuery},
};

/// index
///
/// [Public Route] Visible posts, newest first, ten per page.
#[utoipa::path(
    get,
    path = "/",
    params(PageQuery),
    responses((status = 200, description = "Visible posts", body = Page<Post>))
)]
pub async fn index(
    State(state): State<AppState>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<Post>>> {
    let page = state
        .repo
        .list_visible_posts(Utc::now(), query.number())
        .await?;
    Ok(Json(page))
}

/// post_detail
///
/// [Public Route] A post with its comments, oldest comment first. Hidden and scheduled
/// posts are only shown to their author; everyone else gets the 404 page.
#[utoipa::path(
    get,
    path = "/posts/{id}/",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Found", body = PostDetail),
        (status = 404, description = "Unknown or not visible")
    )
)]
pub async fn post_detail(
    MaybeAuthUser(actor): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<PostDetail>> {
    let post = visible_post(&state.repo, id, actor.as_ref()).await?;
    let comments = state.repo.list_comments(post.id).await?;
    Ok(Json(PostDetail { post, comments }))
}

/// category_posts
///
/// [Public Route] Visible posts of a published category. An unknown or unpublished
/// category is a 404.
#[utoipa::path(
    get,
    path = "/category/{slug}/",
    params(("slug" = String, Path, description = "Category slug"), PageQuery),
    responses(
        (status = 200, description = "Category with its posts", body = CategoryPage),
        (status = 404, description = "Unknown or unpublished category")
    )
)]
pub async fn category_posts(
    State(state): State<AppState>,
    Path(slug): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<CategoryPage>> {
    let category = state
        .repo
        .get_category_by_slug(&slug)
        .await?
        .filter(|category| category.is_published)
        .ok_or_else(|| AppError::NotFound(format!("category {slug}")))?;

    let posts = state
        .repo
        .list_category_posts(category.id, Utc::now(), query.number())
        .await?;
    Ok(Json(CategoryPage { category, posts }))
}

/// new_post_form
///
/// [Authenticated Route] The choices offered by the post form.
#[utoipa::path(
    get,
    path = "/posts/new",
    responses((status = 200, description = "Form choices", body = PostFormChoices))
)]
pub async fn new_post_form(
    _actor: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<PostFormChoices>> {
    Ok(Json(form_choices(&state).await?))
}

/// create_post
///
/// [Authenticated Route] Publishes a post authored by the current actor and redirects to
/// their profile. The author and the publication flag are never taken from the body.
#[utoipa::path(
    post,
    path = "/posts/new",
    request_body = PostForm,
    responses(
        (status = 303, description = "Created, redirect to the author's profile"),
        (status = 400, description = "Invalid form")
    )
)]
pub async fn create_post(
    actor: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<PostForm>, JsonRejection>,
) -> AppResult<Redirect> {
    let form = validated(payload)?;
    check_references(&state, &form).await?;

    state.repo.create_post(actor.id, form).await?;
    Ok(to_profile(&actor.username))
}

/// edit_post_form
///
/// [Authenticated Route] The current post and form choices, for its author only.
#[utoipa::path(
    get,
    path = "/posts/{id}/edit",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Edit form data", body = PostEditPage),
        (status = 303, description = "Not the author, redirect to the post")
    )
)]
pub async fn edit_post_form(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = existing_post(&state, id).await?;
    if !can_modify(Some(&actor), &post) {
        return Ok(to_post_detail(post.id).into_response());
    }

    let choices = form_choices(&state).await?;
    Ok(Json(PostEditPage { post, choices }).into_response())
}

/// edit_post
///
/// [Authenticated Route] Updates a post. The ownership check runs before the body is
/// validated.
#[utoipa::path(
    post,
    path = "/posts/{id}/edit",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = PostForm,
    responses(
        (status = 303, description = "Redirect to the post"),
        (status = 400, description = "Invalid form"),
        (status = 404, description = "Unknown post")
    )
)]
pub async fn edit_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<PostForm>, JsonRejection>,
) -> AppResult<Redirect> {
    let post = existing_post(&state, id).await?;
    if !can_modify(Some(&actor), &post) {
        tracing::debug!(post_id = id, actor = %actor.username, "edit refused, not the author");
        return Ok(to_post_detail(post.id));
    }

    let form = validated(payload)?;
    check_references(&state, &form).await?;

    state
        .repo
        .update_post(id, actor.id, form)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
    Ok(to_post_detail(id))
}

/// delete_post_form
///
/// [Authenticated Route] The post to confirm deletion of, for its author only.
#[utoipa::path(
    get,
    path = "/posts/{id}/delete",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post to delete", body = Post),
        (status = 303, description = "Not the author, redirect to the post")
    )
)]
pub async fn delete_post_form(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let post = existing_post(&state, id).await?;
    if !can_modify(Some(&actor), &post) {
        return Ok(to_post_detail(post.id).into_response());
    }
    Ok(Json(post).into_response())
}

/// delete_post
///
/// [Authenticated Route] Deletes a post and its comments, then redirects to the author's
/// profile. Anyone else is sent back to the post, which stays untouched.
#[utoipa::path(
    post,
    path = "/posts/{id}/delete",
    params(("id" = i64, Path, description = "Post ID")),
    responses(
        (status = 303, description = "Redirect to the profile, or to the post when not the author"),
        (status = 404, description = "Unknown post")
    )
)]
pub async fn delete_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Redirect> {
    let post = existing_post(&state, id).await?;
    if !can_modify(Some(&actor), &post) {
        tracing::debug!(post_id = id, actor = %actor.username, "delete refused, not the author");
        return Ok(to_post_detail(post.id));
    }

    state.repo.delete_post(id, actor.id).await?;
    tracing::info!(post_id = id, author = %actor.username, "post deleted");
    Ok(to_profile(&actor.username))
}

async fn existing_post(state: &AppState, id: i64) -> AppResult<Post> {
    state
        .repo
        .get_post(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))
}

async fn form_choices(state: &AppState) -> AppResult<PostFormChoices> {
    Ok(PostFormChoices {
        categories: state.repo.list_categories(true).await?,
        locations: state.repo.list_locations().await?,
    })
}

// Referenced rows must exist; foreign keys would otherwise surface as a 500.
async fn check_references(state: &AppState, form: &PostForm) -> AppResult<()> {
    if let Some(category_id) = form.category_id {
        if state.repo.get_category(category_id).await?.is_none() {
            return Err(AppError::Validation(format!("unknown category {category_id}")));
        }
    }
    if let Some(location_id) = form.location_id {
        if state.repo.get_location(location_id).await?.is_none() {
            return Err(AppError::Validation(format!("unknown location {location_id}")));
        }
    }
    Ok(())
}
