use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgExecutor, PgPool};

use super::{
    ApprovalCommit, NotificationStore, RegistrationStore, Store, StoreError, UserStore,
};
use crate::models::{
    address::Address,
    announcement::{Announcement, NewAnnouncement},
    notification::NotificationKind,
    registration::{NewRegistration, PendingRegistration, RegistrationStatus},
    user::{NewUser, User, UserAvatar},
};

/// `has_avatar` is computed so the blob never leaves the database on listings.
const USER_COLUMNS: &str = "id, login, email, first_name, last_name, password_hash, activated,
    is_dependent, father_id, mother_id, birth_date, authorities, modules, phone, secondary_phone,
    emergency_contact, document_id, sex, street, number, complement, district, city, state,
    postal_code, (avatar IS NOT NULL) AS has_avatar, avatar_path, created_at, updated_at";

#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Maps unique-index violations on `users` to `Conflict` naming the field.
fn map_unique(e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some("ux_users_login") => "login",
                Some("ux_users_email") => "email",
                _ => "registro",
            };
            return StoreError::Conflict { field: field.to_string() };
        }
    }
    StoreError::Database(e)
}

async fn insert_user_with<'e, E>(executor: E, new: &NewUser) -> Result<User, StoreError>
where
    E: PgExecutor<'e>,
{
    sqlx::query_as::<_, User>(&format!(
        "INSERT INTO users (login, email, first_name, last_name, password_hash, activated,
             is_dependent, father_id, mother_id, birth_date, authorities, modules, phone,
             secondary_phone, emergency_contact, document_id, sex, street, number, complement,
             district, city, state, postal_code)
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17,
                 $18, $19, $20, $21, $22, $23, $24)
         RETURNING {USER_COLUMNS}"
    ))
    .bind(&new.login)
    .bind(&new.email)
    .bind(&new.first_name)
    .bind(&new.last_name)
    .bind(&new.password_hash)
    .bind(new.activated)
    .bind(new.is_dependent)
    .bind(new.father_id)
    .bind(new.mother_id)
    .bind(new.birth_date)
    .bind(&new.authorities)
    .bind(&new.modules)
    .bind(&new.phone)
    .bind(&new.secondary_phone)
    .bind(&new.emergency_contact)
    .bind(&new.document_id)
    .bind(&new.sex)
    .bind(&new.address.street)
    .bind(&new.address.number)
    .bind(&new.address.complement)
    .bind(&new.address.district)
    .bind(&new.address.city)
    .bind(&new.address.state)
    .bind(&new.address.postal_code)
    .fetch_one(executor)
    .await
    .map_err(map_unique)
}

#[async_trait]
impl RegistrationStore for PgStore {
    async fn insert_registration(
        &self,
        new: NewRegistration,
    ) -> Result<PendingRegistration, StoreError> {
        let mut tx = self.pool.begin().await?;

        let address = match &new.address {
            Some(a) => Some(
                sqlx::query_as::<_, Address>(
                    "INSERT INTO addresses (street, number, complement, district, city, state, postal_code)
                     VALUES ($1, $2, $3, $4, $5, $6, $7)
                     RETURNING *",
                )
                .bind(&a.street)
                .bind(&a.number)
                .bind(&a.complement)
                .bind(&a.district)
                .bind(&a.city)
                .bind(&a.state)
                .bind(&a.postal_code)
                .fetch_one(&mut *tx)
                .await?,
            ),
            None => None,
        };

        let mut registration = sqlx::query_as::<_, PendingRegistration>(
            "INSERT INTO pending_registrations
                (full_name, email, phone, secondary_phone, emergency_contact, document_id, sex,
                 birth_date, login, password_hash, requested_role, notes, address_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             RETURNING *",
        )
        .bind(&new.full_name)
        .bind(&new.email)
        .bind(&new.phone)
        .bind(&new.secondary_phone)
        .bind(&new.emergency_contact)
        .bind(&new.document_id)
        .bind(&new.sex)
        .bind(new.birth_date)
        .bind(&new.login)
        .bind(&new.password_hash)
        .bind(&new.requested_role)
        .bind(&new.notes)
        .bind(address.as_ref().map(|a| a.id))
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        registration.address = address;
        Ok(registration)
    }

    async fn find_registration(&self, id: i64) -> Result<Option<PendingRegistration>, StoreError> {
        let registration = sqlx::query_as::<_, PendingRegistration>(
            "SELECT * FROM pending_registrations WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(mut registration) = registration else {
            return Ok(None);
        };

        if let Some(address_id) = registration.address_id {
            registration.address =
                sqlx::query_as::<_, Address>("SELECT * FROM addresses WHERE id = $1")
                    .bind(address_id)
                    .fetch_optional(&self.pool)
                    .await?;
        }
        Ok(Some(registration))
    }

    async fn list_registrations(
        &self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<PendingRegistration>, StoreError> {
        let rows = sqlx::query_as::<_, PendingRegistration>(
            "SELECT * FROM pending_registrations
             WHERE ($1::TEXT IS NULL OR status = $1)
             ORDER BY created_at, id",
        )
        .bind(status.map(|s| s.to_string()))
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn count_registrations(&self, status: RegistrationStatus) -> Result<i64, StoreError> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*)::BIGINT FROM pending_registrations WHERE status = $1",
        )
        .bind(status.to_string())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    async fn commit_approval(&self, approval: ApprovalCommit) -> Result<User, StoreError> {
        // Dropping `tx` on any early return rolls the whole approval back.
        let mut tx = self.pool.begin().await?;

        let updated = sqlx::query(
            "UPDATE pending_registrations
             SET status = $2, approved_role = $3, updated_at = NOW()
             WHERE id = $1",
        )
        .bind(approval.registration_id)
        .bind(RegistrationStatus::Approved.to_string())
        .bind(&approval.approved_role)
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() == 0 {
            return Err(StoreError::NotFound("Cadastro"));
        }

        let user = insert_user_with(&mut *tx, &approval.user).await?;

        sqlx::query("DELETE FROM pending_registrations WHERE id = $1")
            .bind(approval.registration_id)
            .execute(&mut *tx)
            .await?;

        if let Some(address_id) = approval.address_id {
            sqlx::query("DELETE FROM addresses WHERE id = $1")
                .bind(address_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        Ok(user)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    async fn login_in_use(&self, login: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE login = $1)")
            .bind(login)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn email_in_use(&self, email: &str) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        Ok(exists)
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        insert_user_with(&self.pool, &new).await
    }

    async fn activated_users_with_birth_date(&self) -> Result<Vec<User>, StoreError> {
        let users = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users
             WHERE activated = TRUE AND birth_date IS NOT NULL
             ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    async fn user_avatar(&self, id: i64) -> Result<Option<UserAvatar>, StoreError> {
        let row: Option<(Option<Vec<u8>>, Option<String>, Option<String>)> = sqlx::query_as(
            "SELECT avatar, avatar_content_type, avatar_path FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(data, content_type, path)| UserAvatar {
            data,
            content_type,
            path,
        }))
    }

    async fn delete_stale_unactivated(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let result = sqlx::query(
            "DELETE FROM users
             WHERE activated = FALSE AND is_dependent = FALSE AND created_at < $1
               AND NOT EXISTS (
                   SELECT 1 FROM users d
                   WHERE d.father_id = users.id OR d.mother_id = users.id
               )",
        )
        .bind(created_before)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn insert_announcement(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let announcement = sqlx::query_as::<_, Announcement>(
            "INSERT INTO announcements (title, body, kind, starts_on, ends_on, is_active, created_by)
             VALUES ($1, $2, $3, $4, $5, TRUE, $6)
             RETURNING *",
        )
        .bind(&new.title)
        .bind(&new.body)
        .bind(&new.kind)
        .bind(new.starts_on)
        .bind(new.ends_on)
        .bind(new.created_by)
        .fetch_one(&self.pool)
        .await?;
        Ok(announcement)
    }

    async fn active_announcements(
        &self,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Announcement>, StoreError> {
        let rows = sqlx::query_as::<_, Announcement>(
            "SELECT * FROM announcements
             WHERE is_active = TRUE
               AND (starts_on IS NULL OR starts_on <= $1)
               AND (ends_on IS NULL OR ends_on >= $1)
             ORDER BY id
             LIMIT $2",
        )
        .bind(today)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows)
    }

    async fn seen_references(
        &self,
        user_id: i64,
        kind: NotificationKind,
    ) -> Result<HashSet<i64>, StoreError> {
        let ids: Vec<i64> = sqlx::query_scalar(
            "SELECT reference_id FROM seen_notifications WHERE user_id = $1 AND kind = $2",
        )
        .bind(user_id)
        .bind(kind.to_string())
        .fetch_all(&self.pool)
        .await?;
        Ok(ids.into_iter().collect())
    }

    async fn seen_exists(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
    ) -> Result<bool, StoreError> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(
                SELECT 1 FROM seen_notifications
                WHERE user_id = $1 AND kind = $2 AND reference_id = $3
             )",
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(reference_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }

    async fn insert_seen(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO seen_notifications (user_id, kind, reference_id, seen_at)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (user_id, kind, reference_id) DO NOTHING",
        )
        .bind(user_id)
        .bind(kind.to_string())
        .bind(reference_id)
        .bind(seen_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
