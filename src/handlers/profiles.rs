use axum::{
    Json,
    extract::{Path, Query, State, rejection::JsonRejection},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use super::{to_profile, validated};
use crate::{
    AppState,
    auth::{AuthUser, MaybeAuthUser},
    error::{AppError, AppResult},
    guard::can_modify,
    models::{ProfileForm, ProfilePage, User},
    pagination::PageQuery,
};

/// profile
///
/// [Public Route] A user's public profile and their posts, newest first. The owner also
/// sees their hidden and scheduled posts.
#[utoipa::path(
    get,
    path = "/profile/{username}",
    params(("username" = String, Path, description = "Username"), PageQuery),
    responses(
        (status = 200, description = "Profile with posts", body = ProfilePage),
        (status = 404, description = "Unknown user")
    )
)]
pub async fn profile(
    MaybeAuthUser(actor): MaybeAuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    Query(query): Query<PageQuery>,
) -> AppResult<Json<ProfilePage>> {
    let user = existing_user(&state, &username).await?;
    let include_hidden = can_modify(actor.as_ref(), &user);

    let posts = state
        .repo
        .list_author_posts(user.id, include_hidden, Utc::now(), query.number())
        .await?;
    Ok(Json(ProfilePage {
        profile: user.into(),
        posts,
    }))
}

/// edit_profile_form
///
/// [Authenticated Route] The editable fields of the actor's own profile.
#[utoipa::path(
    get,
    path = "/profile/{username}/edit",
    params(("username" = String, Path, description = "Username")),
    responses(
        (status = 200, description = "Profile form", body = ProfileForm),
        (status = 303, description = "Someone else's profile, redirect to it")
    )
)]
pub async fn edit_profile_form(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let user = existing_user(&state, &username).await?;
    if !can_modify(Some(&actor), &user) {
        return Ok(to_profile(&user.username).into_response());
    }
    Ok(Json(ProfileForm::from(&user)).into_response())
}

/// edit_profile
///
/// [Authenticated Route] Updates the whitelisted profile fields and redirects to the
/// profile under its (possibly new) username.
#[utoipa::path(
    post,
    path = "/profile/{username}/edit",
    params(("username" = String, Path, description = "Username")),
    request_body = ProfileForm,
    responses(
        (status = 303, description = "Redirect to the profile"),
        (status = 400, description = "Invalid form"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn edit_profile(
    actor: AuthUser,
    State(state): State<AppState>,
    Path(username): Path<String>,
    payload: Result<Json<ProfileForm>, JsonRejection>,
) -> AppResult<Redirect> {
    let user = existing_user(&state, &username).await?;
    if !can_modify(Some(&actor), &user) {
        return Ok(to_profile(&user.username));
    }

    let form = validated(payload)?;
    let updated = state
        .repo
        .update_profile(user.id, form)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))?;
    tracing::info!(user_id = %updated.id, username = %updated.username, "profile updated");
    Ok(to_profile(&updated.username))
}

async fn existing_user(state: &AppState, username: &str) -> AppResult<User> {
    state
        .repo
        .get_user_by_username(username)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("user {username}")))
}
