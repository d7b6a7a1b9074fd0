pub mod announcements;
pub mod birthdays;
pub mod health;
pub mod metrics;
pub mod notifications;
pub mod registrations;
pub mod users;

use axum::{
    http::{header, HeaderValue, Method},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use tower_http::cors::{AllowHeaders, AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::{
    error::AppError, middleware::auth::JwtSecret, models::auth::AuthenticatedUser, AppState,
};

/// Approval, user creation and publishing are restricted to ROLE_ADMIN.
pub(crate) fn require_admin(user: &AuthenticatedUser) -> Result<(), AppError> {
    if user.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden)
    }
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

pub fn router(state: AppState) -> Router {
    let cors_origin = match state.config.cors_allowed_origin.parse::<HeaderValue>() {
        Ok(origin) => AllowOrigin::exact(origin),
        Err(_) => {
            tracing::warn!(
                "CORS_ALLOWED_ORIGIN '{}' is not a valid header value; cross-origin requests disabled",
                state.config.cors_allowed_origin
            );
            AllowOrigin::list(Vec::<HeaderValue>::new())
        }
    };

    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(AllowHeaders::list([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            header::ACCEPT,
        ]))
        .allow_origin(cors_origin);

    let jwt_secret = JwtSecret(state.config.jwt_secret.clone());

    Router::new()
        .route("/health", get(health::health_check))
        .route("/metrics", get(metrics::metrics_handler))
        // Registration queue
        .route(
            "/registrations",
            get(registrations::list_registrations).post(registrations::submit_registration),
        )
        .route(
            "/registrations/{id}/approve",
            post(registrations::approve_registration),
        )
        // Notifications
        .route("/notifications", get(notifications::list_notifications))
        .route("/notifications/seen", post(notifications::mark_seen))
        .route("/birthdays/upcoming", get(birthdays::upcoming_birthdays))
        .route(
            "/announcements",
            get(announcements::list_announcements).post(announcements::create_announcement),
        )
        // Members
        .route("/users", post(users::create_user))
        .route("/users/{id}/avatar", get(users::get_avatar))
        .layer(axum::Extension(jwt_secret))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
