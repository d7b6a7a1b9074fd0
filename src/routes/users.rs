use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};

use super::require_admin;
use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        user::{CreateUserRequest, UserProfile},
    },
    services::users::{AvatarContent, UserService},
    AppState,
};

/// POST /users — admin creation of a member or a dependent.
pub async fn create_user(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserProfile>), AppError> {
    require_admin(&user)?;
    let created = UserService::create(state.store.as_ref(), &state.hasher, body).await?;
    Ok((StatusCode::CREATED, Json(created.into())))
}

/// GET /users/{id}/avatar — the stored blob, or a redirect for legacy on-disk avatars.
pub async fn get_avatar(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Response, AppError> {
    match UserService::avatar(state.store.as_ref(), id).await? {
        AvatarContent::Blob { data, content_type } => {
            Ok(([(header::CONTENT_TYPE, content_type)], data).into_response())
        }
        AvatarContent::LegacyPath(path) => Ok(Redirect::temporary(&format!(
            "/media/{}",
            path.trim_start_matches('/')
        ))
        .into_response()),
    }
}
