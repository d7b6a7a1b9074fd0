pub mod memory;
pub mod postgres;

use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

use crate::models::{
    announcement::{Announcement, NewAnnouncement},
    notification::NotificationKind,
    registration::{NewRegistration, PendingRegistration, RegistrationStatus},
    user::{NewUser, User, UserAvatar},
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

pub async fn create_pool(database_url: &str, max_connections: u32) -> anyhow::Result<PgPool> {
    let pool = PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Run the migrations embedded from ./migrations/
pub async fn run_migrations(pool: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A unique login/e-mail constraint rejected the write.
    #[error("{field} already in use")]
    Conflict { field: String },

    /// The row vanished between the read and the write (e.g. a concurrent approval).
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

/// Everything `approve` persists, applied atomically by `commit_approval`.
#[derive(Debug, Clone)]
pub struct ApprovalCommit {
    pub registration_id: i64,
    pub approved_role: String,
    /// `None` when the registration had no address attached; deletion is skipped.
    pub address_id: Option<i64>,
    pub user: NewUser,
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    async fn insert_registration(
        &self,
        new: NewRegistration,
    ) -> Result<PendingRegistration, StoreError>;

    /// Loads the registration with its address (if any).
    async fn find_registration(&self, id: i64) -> Result<Option<PendingRegistration>, StoreError>;

    /// Oldest first.
    async fn list_registrations(
        &self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<PendingRegistration>, StoreError>;

    async fn count_registrations(&self, status: RegistrationStatus) -> Result<i64, StoreError>;

    /// Flips the status, creates the user, then deletes the registration and
    /// its address. All or nothing.
    async fn commit_approval(&self, approval: ApprovalCommit) -> Result<User, StoreError>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError>;

    async fn login_in_use(&self, login: &str) -> Result<bool, StoreError>;

    async fn email_in_use(&self, email: &str) -> Result<bool, StoreError>;

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError>;

    async fn activated_users_with_birth_date(&self) -> Result<Vec<User>, StoreError>;

    async fn user_avatar(&self, id: i64) -> Result<Option<UserAvatar>, StoreError>;

    /// Deletes non-dependent accounts still unactivated and created before
    /// `created_before`. Accounts named as a dependent's father or mother are
    /// kept. Returns the number removed.
    async fn delete_stale_unactivated(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StoreError>;
}

#[async_trait]
pub trait NotificationStore: Send + Sync {
    async fn insert_announcement(&self, new: NewAnnouncement) -> Result<Announcement, StoreError>;

    /// Active announcements live on `today`, id ascending, at most `limit`.
    async fn active_announcements(
        &self,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Announcement>, StoreError>;

    async fn seen_references(
        &self,
        user_id: i64,
        kind: NotificationKind,
    ) -> Result<HashSet<i64>, StoreError>;

    async fn seen_exists(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
    ) -> Result<bool, StoreError>;

    async fn insert_seen(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;
}

/// The record store every service talks to.
#[async_trait]
pub trait Store: RegistrationStore + UserStore + NotificationStore {
    async fn ping(&self) -> Result<(), StoreError>;
}
