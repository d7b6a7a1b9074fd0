//! Removal of self-created accounts that were never activated.
//! Dependents are never touched: they are activated records without a login.
//! An account still named as a dependent's parent is kept as well.
use chrono::{DateTime, Duration, Utc};

use crate::{
    db::{Store, UserStore},
    services::metrics,
};

pub struct CleanupService;

impl CleanupService {
    /// Deletes unactivated accounts created more than `older_than_days` before `now`.
    pub async fn purge_stale_accounts(
        store: &dyn Store,
        now: DateTime<Utc>,
        older_than_days: i64,
    ) -> anyhow::Result<u64> {
        let cutoff = now - Duration::days(older_than_days.max(0));
        let purged = store.delete_stale_unactivated(cutoff).await?;

        if purged > 0 {
            metrics::STALE_ACCOUNTS_PURGED_COUNTER.inc_by(purged as f64);
            tracing::info!(
                "Purged {} unactivated account(s) created before {}",
                purged,
                cutoff
            );
        }
        Ok(purged)
    }
}
