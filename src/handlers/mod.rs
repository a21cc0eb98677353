//! Route handlers, one module per resource.
//!
//! Handlers compose the visibility filter, the ownership guard and pagination as plain
//! calls. Ownership failures never surface as errors: the actor is redirected to the
//! resource's public page and the mutation is not invoked.

pub mod account;
pub mod admin;
pub mod comments;
pub mod posts;
pub mod profiles;

use axum::{Json, extract::rejection::JsonRejection, response::Redirect};
use chrono::Utc;
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::{
    auth::AuthUser,
    error::{AppError, AppResult},
    models::Post,
    repository::RepositoryState,
    visibility::is_visible_to,
};

/// Unwraps a JSON body. Malformed JSON and unknown fields become `AppError::Validation`.
pub fn json_body<T: DeserializeOwned>(payload: Result<Json<T>, JsonRejection>) -> AppResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::Validation(rejection.body_text()))
}

/// `json_body` followed by the form's field validators.
pub fn validated<T: DeserializeOwned + Validate>(
    payload: Result<Json<T>, JsonRejection>,
) -> AppResult<T> {
    let form = json_body(payload)?;
    form.validate()?;
    Ok(form)
}

/// Loads a post the actor may see: publicly visible, or their own.
pub async fn visible_post(
    repo: &RepositoryState,
    id: i64,
    actor: Option<&AuthUser>,
) -> AppResult<Post> {
    let now = Utc::now();
    let post = match actor {
        None => repo.get_visible_post(id, now).await?,
        Some(actor) => repo
            .get_post(id)
            .await?
            .filter(|post| is_visible_to(post, Some(actor), now)),
    };
    post.ok_or_else(|| AppError::NotFound(format!("post {id}")))
}

pub fn to_post_detail(post_id: i64) -> Redirect {
    Redirect::to(&format!("/posts/{post_id}/"))
}

pub fn to_profile(username: &str) -> Redirect {
    Redirect::to(&format!("/profile/{username}"))
}
