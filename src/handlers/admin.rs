//! Administration of posts, categories and locations. Every handler requires the
//! "admin" role; other authenticated users get 403.

use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    http::StatusCode,
};

use super::{json_body, validated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        AdminPostRow, AdminPostUpdate, Category, CategoryForm, Location, LocationForm,
    },
    pagination::{Page, PageQuery},
    repository::AdminPostFilter,
};

fn require_admin(actor: &AuthUser) -> AppResult<()> {
    if actor.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden(format!("{} is not an administrator", actor.username)))
    }
}

/// list_posts
///
/// [Admin Route] All posts regardless of visibility, ordered by title.
#[utoipa::path(
    get,
    path = "/admin/posts",
    params(AdminPostFilter, PageQuery),
    responses(
        (status = 200, description = "Posts", body = Page<AdminPostRow>),
        (status = 403, description = "Not an administrator")
    )
)]
pub async fn list_posts(
    actor: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<AdminPostFilter>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<Page<AdminPostRow>>> {
    require_admin(&actor)?;
    let page = state.repo.list_admin_posts(&filter, query.number()).await?;
    Ok(Json(page.map(AdminPostRow::from)))
}

/// update_post
///
/// [Admin Route] Edits the list-editable columns of a post: publication flag and category.
#[utoipa::path(
    patch,
    path = "/admin/posts/{id}",
    params(("id" = i64, Path, description = "Post ID")),
    request_body = AdminPostUpdate,
    responses(
        (status = 200, description = "Updated", body = AdminPostRow),
        (status = 404, description = "Unknown post")
    )
)]
pub async fn update_post(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    payload: Result<Json<AdminPostUpdate>, JsonRejection>,
) -> AppResult<Json<AdminPostRow>> {
    require_admin(&actor)?;
    let update = json_body(payload)?;

    if let Some(Some(category_id)) = update.category_id {
        if state.repo.get_category(category_id).await?.is_none() {
            return Err(AppError::Validation(format!("unknown category {category_id}")));
        }
    }

    let post = state
        .repo
        .update_post_admin(id, update)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("post {id}")))?;
    tracing::info!(post_id = id, admin = %actor.username, "post moderated");
    Ok(Json(post.into()))
}

/// list_categories
#[utoipa::path(
    get,
    path = "/admin/categories",
    responses((status = 200, description = "All categories", body = [Category]))
)]
pub async fn list_categories(
    actor: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Category>>> {
    require_admin(&actor)?;
    Ok(Json(state.repo.list_categories(false).await?))
}

/// create_category
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryForm,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Slug taken")
    )
)]
pub async fn create_category(
    actor: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<CategoryForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Category>)> {
    require_admin(&actor)?;
    let form = validated(payload)?;
    let category = state.repo.create_category(form).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// set_category_status
///
/// [Admin Route] Publishes or hides a category. Hiding it hides all of its posts.
#[utoipa::path(
    put,
    path = "/admin/categories/{id}/status",
    params(("id" = i64, Path, description = "Category ID")),
    request_body = bool,
    responses(
        (status = 200, description = "Updated", body = Category),
        (status = 404, description = "Unknown category")
    )
)]
pub async fn set_category_status(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(is_published): Json<bool>,
) -> AppResult<Json<Category>> {
    require_admin(&actor)?;
    let category = state
        .repo
        .set_category_status(id, is_published)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("category {id}")))?;
    Ok(Json(category))
}

/// list_locations
#[utoipa::path(
    get,
    path = "/admin/locations",
    responses((status = 200, description = "All locations", body = [Location]))
)]
pub async fn list_locations(
    actor: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<Location>>> {
    require_admin(&actor)?;
    Ok(Json(state.repo.list_locations().await?))
}

/// create_location
#[utoipa::path(
    post,
    path = "/admin/locations",
    request_body = LocationForm,
    responses((status = 201, description = "Created", body = Location))
)]
pub async fn create_location(
    actor: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<LocationForm>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Location>)> {
    require_admin(&actor)?;
    let form = validated(payload)?;
    let location = state.repo.create_location(form).await?;
    Ok((StatusCode::CREATED, Json(location)))
}
