use chrono::{Datelike, Days, NaiveDate};

use crate::{
    db::{Store, UserStore},
    error::AppError,
    models::{notification::UpcomingBirthday, user::User},
};

pub const DEFAULT_WINDOW_DAYS: i64 = 7;
const MIN_WINDOW_DAYS: i64 = 1;
const MAX_WINDOW_DAYS: i64 = 60;
const RESULT_LIMIT: usize = 20;

pub fn clamp_window(days: i64) -> i64 {
    days.clamp(MIN_WINDOW_DAYS, MAX_WINDOW_DAYS)
}

/// The birth month/day in `year`. Feb 29 falls on Feb 28 in non-leap years.
fn anniversary_in(birth_date: NaiveDate, year: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(year, birth_date.month(), birth_date.day())
        .or_else(|| NaiveDate::from_ymd_opt(year, 2, 28))
}

/// This year's anniversary, or next year's if it already passed.
/// A birthday falling on `today` has not passed.
pub fn next_birthday(birth_date: NaiveDate, today: NaiveDate) -> Option<NaiveDate> {
    let this_year = anniversary_in(birth_date, today.year())?;
    if this_year < today {
        anniversary_in(birth_date, today.year() + 1)
    } else {
        Some(this_year)
    }
}

/// Users whose next birthday lies in `[today, today + window_days]`,
/// soonest first, at most 20.
pub fn select_upcoming(users: &[User], today: NaiveDate, window_days: i64) -> Vec<UpcomingBirthday> {
    let window_days = clamp_window(window_days);
    let Some(last_day) = today.checked_add_days(Days::new(window_days as u64)) else {
        return Vec::new();
    };

    let mut upcoming: Vec<UpcomingBirthday> = users
        .iter()
        .filter(|u| u.activated)
        .filter_map(|u| {
            let next = next_birthday(u.birth_date?, today)?;
            (next <= last_day).then(|| UpcomingBirthday {
                user_id: u.id,
                name: u.display_name(),
                next_birthday: next,
                avatar_url: u.avatar_url(),
            })
        })
        .collect();

    upcoming.sort_by(|a, b| {
        a.next_birthday
            .cmp(&b.next_birthday)
            .then_with(|| a.name.cmp(&b.name))
    });
    upcoming.truncate(RESULT_LIMIT);
    upcoming
}

pub struct BirthdayService;

impl BirthdayService {
    pub async fn upcoming(
        store: &dyn Store,
        window_days: i64,
        today: NaiveDate,
    ) -> Result<Vec<UpcomingBirthday>, AppError> {
        let users = store.activated_users_with_birth_date().await?;
        Ok(select_upcoming(&users, today, window_days))
    }
}
