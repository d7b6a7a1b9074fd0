use chrono::{NaiveDate, Utc};

use crate::{
    db::{NotificationStore, Store, UserStore},
    error::AppError,
    models::{
        announcement::Announcement,
        auth::AuthenticatedUser,
        notification::{NotificationItem, NotificationKind},
        user::User,
    },
    services::{birthdays, metrics},
};

const ANNOUNCEMENT_LIMIT: i64 = 20;
const BIRTHDAY_LIMIT: usize = 10;
const SUMMARY_CHARS: usize = 80;

/// Body cut to 80 characters (not bytes), with an ellipsis when cut.
pub fn summarize(body: &str) -> String {
    if body.chars().count() > SUMMARY_CHARS {
        let cut: String = body.chars().take(SUMMARY_CHARS).collect();
        format!("{cut}...")
    } else {
        body.to_string()
    }
}

/// Month and day match, the year ignored. Feb 29 birthdays fall on Feb 28
/// in common years, as in the upcoming-birthday query.
pub fn is_birthday_on(birth_date: NaiveDate, day: NaiveDate) -> bool {
    birthdays::next_birthday(birth_date, day) == Some(day)
}

fn announcement_item(a: &Announcement) -> NotificationItem {
    NotificationItem {
        kind: NotificationKind::Announcement,
        reference_id: a.id,
        title: a.title.clone(),
        summary: summarize(&a.body),
        link: format!("/avisos/{}", a.id),
    }
}

fn birthday_item(u: &User) -> NotificationItem {
    let name = u.display_name();
    NotificationItem {
        kind: NotificationKind::Birthday,
        reference_id: u.id,
        title: "Aniversariante do dia".to_string(),
        summary: format!("Hoje é aniversário de {name}!"),
        link: "/aniversariantes".to_string(),
    }
}

pub struct NotificationService;

impl NotificationService {
    /// Unseen announcements followed by unseen same-day birthdays.
    /// Returns an empty list when there is no caller.
    pub async fn list_unseen(
        store: &dyn Store,
        caller: Option<&AuthenticatedUser>,
        today: NaiveDate,
    ) -> Result<Vec<NotificationItem>, AppError> {
        let Some(caller) = caller else {
            return Ok(Vec::new());
        };

        let seen_announcements = store
            .seen_references(caller.user_id, NotificationKind::Announcement)
            .await?;
        let mut items: Vec<NotificationItem> = store
            .active_announcements(today, ANNOUNCEMENT_LIMIT)
            .await?
            .iter()
            .filter(|a| !seen_announcements.contains(&a.id))
            .map(announcement_item)
            .collect();

        let seen_birthdays = store
            .seen_references(caller.user_id, NotificationKind::Birthday)
            .await?;
        let birthdays = store
            .activated_users_with_birth_date()
            .await?
            .into_iter()
            .filter(|u| u.birth_date.is_some_and(|b| is_birthday_on(b, today)))
            .take(BIRTHDAY_LIMIT)
            .filter(|u| !seen_birthdays.contains(&u.id));
        items.extend(birthdays.map(|u| birthday_item(&u)));

        Ok(items)
    }

    /// Check-then-insert on (user, kind, reference). Returns `false` when the
    /// row already existed and nothing was written.
    pub async fn mark_seen(
        store: &dyn Store,
        caller: &AuthenticatedUser,
        kind: NotificationKind,
        reference_id: i64,
    ) -> Result<bool, AppError> {
        if store.seen_exists(caller.user_id, kind, reference_id).await? {
            return Ok(false);
        }
        store
            .insert_seen(caller.user_id, kind, reference_id, Utc::now())
            .await?;
        metrics::NOTIFICATIONS_SEEN_COUNTER
            .with_label_values(&[&kind.to_string()])
            .inc();
        tracing::debug!(
            "User {} marked {} {} as seen",
            caller.user_id,
            kind,
            reference_id
        );
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_body_is_untouched() {
        assert_eq!(summarize("Culto às 19h"), "Culto às 19h");
        let exactly = "a".repeat(80);
        assert_eq!(summarize(&exactly), exactly);
    }

    #[test]
    fn long_body_is_cut_on_chars() {
        let body = "é".repeat(81);
        let summary = summarize(&body);
        assert_eq!(summary, format!("{}...", "é".repeat(80)));
    }

    #[test]
    fn birthday_ignores_year() {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert!(is_birthday_on(d(1980, 3, 15), d(2026, 3, 15)));
        assert!(!is_birthday_on(d(1980, 3, 15), d(2026, 3, 16)));
        assert!(!is_birthday_on(d(1980, 3, 15), d(2026, 4, 15)));
    }

    #[test]
    fn leap_day_birthday_is_celebrated_on_feb_28_in_common_years() {
        let d = |y, m, dd| NaiveDate::from_ymd_opt(y, m, dd).unwrap();
        assert!(is_birthday_on(d(2000, 2, 29), d(2026, 2, 28)));
        assert!(!is_birthday_on(d(2000, 2, 29), d(2026, 3, 1)));
        assert!(is_birthday_on(d(2000, 2, 29), d(2028, 2, 29)));
        assert!(!is_birthday_on(d(2000, 2, 29), d(2028, 2, 28)));
    }
}
