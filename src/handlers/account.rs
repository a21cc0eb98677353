use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{json_body, validated};
use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{PresignedUrlRequest, PresignedUrlResponse, RegisterUserRequest, User},
    storage::post_image_key,
};

/// The part of the identity provider's signup response we rely on.
#[derive(Deserialize)]
struct SignupResponse {
    id: Uuid,
}

/// register_user
///
/// [Public Route] Signs up with the external identity provider, then mirrors the new
/// identity as a local profile under the same id.
#[utoipa::path(
    post,
    path = "/auth/registration",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "Registered", body = User),
        (status = 400, description = "Invalid form or rejected by the identity provider"),
        (status = 409, description = "Username taken")
    )
)]
pub async fn register_user(
    State(state): State<AppState>,
    payload: Result<Json<RegisterUserRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<User>)> {
    let request = validated(payload)?;

    if state
        .repo
        .get_user_by_username(&request.username)
        .await?
        .is_some()
    {
        return Err(AppError::Conflict(format!(
            "username {} is taken",
            request.username
        )));
    }

    let signup_url = format!("{}/auth/v1/signup", state.config.auth_url.trim_end_matches('/'));
    let response = reqwest::Client::new()
        .post(signup_url)
        .header("apikey", &state.config.auth_key)
        .json(&serde_json::json!({ "email": request.email, "password": request.password }))
        .send()
        .await
        .map_err(|e| AppError::ExternalService(format!("identity provider unreachable: {e}")))?;

    if !response.status().is_success() {
        tracing::debug!(status = %response.status(), "signup rejected by identity provider");
        return Err(AppError::Validation(
            "registration rejected by the identity provider".to_string(),
        ));
    }

    let identity = response
        .json::<SignupResponse>()
        .await
        .map_err(|e| AppError::ExternalService(format!("unexpected signup response: {e}")))?;

    let user = state
        .repo
        .create_user(User {
            id: identity.id,
            username: request.username,
            email: request.email,
            role: User::DEFAULT_ROLE.to_string(),
            ..User::default()
        })
        .await?;
    tracing::info!(user_id = %user.id, username = %user.username, "user registered");

    Ok((StatusCode::CREATED, Json(user)))
}

/// get_presigned_url
///
/// [Authenticated Route] A ten-minute upload URL for a post image. The returned
/// `resource_key` goes into `PostForm::image`.
#[utoipa::path(
    post,
    path = "/upload/presigned",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 400, description = "Not an image content type")
    )
)]
pub async fn get_presigned_url(
    actor: AuthUser,
    State(state): State<AppState>,
    payload: Result<Json<PresignedUrlRequest>, JsonRejection>,
) -> AppResult<Json<PresignedUrlResponse>> {
    let request = json_body(payload)?;
    let resource_key = post_image_key(&request.filename);

    let upload_url = state
        .storage
        .presigned_upload_url(&resource_key, &request.file_type)
        .await?;
    tracing::debug!(user_id = %actor.id, key = %resource_key, "upload url issued");

    Ok(Json(PresignedUrlResponse {
        upload_url,
        resource_key,
    }))
}
