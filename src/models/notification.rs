use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationKind {
    Announcement,
    Birthday,
}

impl std::fmt::Display for NotificationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            NotificationKind::Announcement => "ANNOUNCEMENT",
            NotificationKind::Birthday => "BIRTHDAY",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for NotificationKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "ANNOUNCEMENT" => Ok(NotificationKind::Announcement),
            "BIRTHDAY" => Ok(NotificationKind::Birthday),
            _ => Err(anyhow::anyhow!("Unknown notification kind: {s}")),
        }
    }
}

/// Seen-ledger row. Identity is (user_id, kind, reference_id).
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SeenNotification {
    pub id: i64,
    pub user_id: i64,
    pub kind: String,
    pub reference_id: i64,
    pub seen_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct NotificationItem {
    pub kind: NotificationKind,
    pub reference_id: i64,
    pub title: String,
    pub summary: String,
    pub link: String,
}

#[derive(Debug, Deserialize)]
pub struct MarkSeenRequest {
    pub kind: NotificationKind,
    pub reference_id: i64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct UpcomingBirthday {
    pub user_id: i64,
    pub name: String,
    pub next_birthday: NaiveDate,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpcomingBirthdaysQuery {
    pub days: Option<i64>,
}
