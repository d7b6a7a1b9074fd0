use axum::{extract::State, http::StatusCode, Json};

use super::today;
use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        notification::{MarkSeenRequest, NotificationItem},
    },
    services::notifications::NotificationService,
    AppState,
};

/// GET /notifications — empty list for anonymous callers.
pub async fn list_notifications(
    State(state): State<AppState>,
    user: Option<AuthenticatedUser>,
) -> Result<Json<Vec<NotificationItem>>, AppError> {
    let items =
        NotificationService::list_unseen(state.store.as_ref(), user.as_ref(), today()).await?;
    Ok(Json(items))
}

/// POST /notifications/seen — idempotent.
pub async fn mark_seen(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<MarkSeenRequest>,
) -> Result<StatusCode, AppError> {
    NotificationService::mark_seen(state.store.as_ref(), &user, body.kind, body.reference_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
