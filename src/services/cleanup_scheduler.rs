use chrono::{Local, Timelike, Utc};
use std::sync::Arc;
use tracing::warn;

use crate::db::Store;
use crate::services::cleanup::CleanupService;

const RUN_AT_HOUR: u32 = 1;

fn secs_until_hour(secs_today: u32, target_hour: u32) -> u64 {
    let target_secs = target_hour * 3600;
    if secs_today < target_secs {
        (target_secs - secs_today) as u64
    } else {
        // Already past the hour today → wait until tomorrow
        (86400 - secs_today + target_secs) as u64
    }
}

/// Spawn a background task that wakes up daily at 01:00 local time and
/// removes accounts left unactivated for more than `older_than_days`.
pub fn start(store: Arc<dyn Store>, older_than_days: i64) {
    tokio::spawn(async move {
        loop {
            let now = Local::now();
            let secs_today = now.hour() * 3600 + now.minute() * 60 + now.second();
            let wait = secs_until_hour(secs_today, RUN_AT_HOUR);
            tokio::time::sleep(tokio::time::Duration::from_secs(wait)).await;

            if let Err(e) =
                CleanupService::purge_stale_accounts(store.as_ref(), Utc::now(), older_than_days)
                    .await
            {
                warn!("Cleanup scheduler: purge failed: {e}");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn waits_until_same_day_before_the_hour() {
        assert_eq!(secs_until_hour(0, 1), 3600);
        assert_eq!(secs_until_hour(1800, 1), 1800);
    }

    #[test]
    fn waits_until_next_day_after_the_hour() {
        assert_eq!(secs_until_hour(3600, 1), 86400);
        assert_eq!(secs_until_hour(23 * 3600, 1), 2 * 3600);
    }
}
