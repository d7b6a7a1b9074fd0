use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};

use super::require_admin;
use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        registration::{
            ApproveRegistrationRequest, ApprovedRegistration, ListRegistrationsQuery,
            PendingRegistration, SubmitRegistrationRequest,
        },
    },
    services::registrations::RegistrationService,
    AppState,
};

/// POST /registrations — public self-registration, queued for review.
pub async fn submit_registration(
    State(state): State<AppState>,
    Json(body): Json<SubmitRegistrationRequest>,
) -> Result<(StatusCode, Json<PendingRegistration>), AppError> {
    let registration =
        RegistrationService::submit(state.store.as_ref(), &state.hasher, body).await?;
    Ok((StatusCode::CREATED, Json(registration)))
}

/// GET /registrations?status=AWAITING_REVIEW
pub async fn list_registrations(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Query(query): Query<ListRegistrationsQuery>,
) -> Result<Json<Vec<PendingRegistration>>, AppError> {
    require_admin(&user)?;
    let rows = RegistrationService::list(state.store.as_ref(), query.status).await?;
    Ok(Json(rows))
}

/// POST /registrations/{id}/approve
pub async fn approve_registration(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    Path(id): Path<i64>,
    Json(body): Json<ApproveRegistrationRequest>,
) -> Result<Json<ApprovedRegistration>, AppError> {
    require_admin(&user)?;
    tracing::info!("Registration {} approval requested by user {}", id, user.user_id);
    let approved =
        RegistrationService::approve(state.store.as_ref(), id, &body.role, body.modules).await?;
    Ok(Json(approved))
}
