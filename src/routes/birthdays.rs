use axum::{
    extract::{Query, State},
    Json,
};

use super::today;
use crate::{
    error::AppError,
    models::{
        auth::AuthenticatedUser,
        notification::{UpcomingBirthday, UpcomingBirthdaysQuery},
    },
    services::birthdays::{BirthdayService, DEFAULT_WINDOW_DAYS},
    AppState,
};

/// GET /birthdays/upcoming?days=7 — `days` is clamped to 1..=60.
pub async fn upcoming_birthdays(
    State(state): State<AppState>,
    _user: AuthenticatedUser,
    Query(query): Query<UpcomingBirthdaysQuery>,
) -> Result<Json<Vec<UpcomingBirthday>>, AppError> {
    let days = query.days.unwrap_or(DEFAULT_WINDOW_DAYS);
    let rows = BirthdayService::upcoming(state.store.as_ref(), days, today()).await?;
    Ok(Json(rows))
}
