use axum::{extract::State, http::StatusCode, Json};

use super::{require_admin, today};
use crate::{
    error::AppError,
    models::{
        announcement::{Announcement, CreateAnnouncementRequest},
        auth::AuthenticatedUser,
    },
    services::announcements::AnnouncementService,
    AppState,
};

/// GET /announcements — public, announcements live today.
pub async fn list_announcements(
    State(state): State<AppState>,
) -> Result<Json<Vec<Announcement>>, AppError> {
    let rows = AnnouncementService::list_active(state.store.as_ref(), today()).await?;
    Ok(Json(rows))
}

/// POST /announcements
pub async fn create_announcement(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Json(body): Json<CreateAnnouncementRequest>,
) -> Result<(StatusCode, Json<Announcement>), AppError> {
    require_admin(&user)?;
    let announcement = AnnouncementService::create(state.store.as_ref(), &user, body).await?;
    Ok((StatusCode::CREATED, Json(announcement)))
}
