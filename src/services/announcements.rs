use chrono::NaiveDate;

use crate::{
    db::{NotificationStore, Store},
    error::AppError,
    models::{
        announcement::{Announcement, CreateAnnouncementRequest, NewAnnouncement},
        auth::AuthenticatedUser,
    },
};

const LIST_LIMIT: i64 = 100;

pub struct AnnouncementService;

impl AnnouncementService {
    pub async fn create(
        store: &dyn Store,
        author: &AuthenticatedUser,
        req: CreateAnnouncementRequest,
    ) -> Result<Announcement, AppError> {
        let title = req.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("O título é obrigatório"));
        }
        if req.body.trim().is_empty() {
            return Err(AppError::validation("O texto do aviso é obrigatório"));
        }
        if let (Some(start), Some(end)) = (req.starts_on, req.ends_on) {
            if end < start {
                return Err(AppError::validation(
                    "A data final deve ser posterior à data inicial",
                ));
            }
        }

        let announcement = store
            .insert_announcement(NewAnnouncement {
                title,
                body: req.body,
                kind: req
                    .kind
                    .map(|k| k.trim().to_uppercase())
                    .filter(|k| !k.is_empty())
                    .unwrap_or_else(|| "AVISO".to_string()),
                starts_on: req.starts_on,
                ends_on: req.ends_on,
                created_by: Some(author.user_id),
            })
            .await?;

        tracing::info!("Announcement {} published by user {}", announcement.id, author.user_id);
        Ok(announcement)
    }

    pub async fn list_active(
        store: &dyn Store,
        today: NaiveDate,
    ) -> Result<Vec<Announcement>, AppError> {
        Ok(store.active_announcements(today, LIST_LIMIT).await?)
    }
}
