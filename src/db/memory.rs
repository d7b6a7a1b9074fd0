use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use tokio::sync::Mutex;

use super::{
    ApprovalCommit, NotificationStore, RegistrationStore, Store, StoreError, UserStore,
};
use crate::models::{
    address::Address,
    announcement::{Announcement, NewAnnouncement},
    notification::{NotificationKind, SeenNotification},
    registration::{NewRegistration, PendingRegistration, RegistrationStatus},
    user::{NewUser, User, UserAvatar},
};

/// In-process store with the same uniqueness rules as the Postgres schema.
/// Every operation holds the lock for its whole duration, so
/// `commit_approval` is atomic here too.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

#[derive(Default)]
struct Tables {
    next_id: i64,
    addresses: BTreeMap<i64, Address>,
    registrations: BTreeMap<i64, PendingRegistration>,
    users: BTreeMap<i64, User>,
    avatars: HashMap<i64, (Vec<u8>, String)>,
    announcements: BTreeMap<i64, Announcement>,
    seen: Vec<SeenNotification>,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn conflict_for(&self, new: &NewUser) -> Option<&'static str> {
        self.users.values().find_map(|u| {
            if new.login.is_some() && u.login == new.login {
                Some("login")
            } else if new.email.is_some() && u.email == new.email {
                Some("email")
            } else {
                None
            }
        })
    }

    fn insert_user(&mut self, new: NewUser) -> Result<User, StoreError> {
        if let Some(field) = self.conflict_for(&new) {
            return Err(StoreError::Conflict { field: field.to_string() });
        }
        let now = Utc::now();
        let user = User {
            id: self.next_id(),
            login: new.login,
            email: new.email,
            first_name: new.first_name,
            last_name: new.last_name,
            password_hash: new.password_hash,
            activated: new.activated,
            is_dependent: new.is_dependent,
            father_id: new.father_id,
            mother_id: new.mother_id,
            birth_date: new.birth_date,
            authorities: new.authorities,
            modules: new.modules,
            phone: new.phone,
            secondary_phone: new.secondary_phone,
            emergency_contact: new.emergency_contact,
            document_id: new.document_id,
            sex: new.sex,
            address: new.address,
            has_avatar: false,
            avatar_path: None,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(user.id, user.clone());
        Ok(user)
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn registration_count(&self) -> usize {
        self.tables.lock().await.registrations.len()
    }

    pub async fn address_count(&self) -> usize {
        self.tables.lock().await.addresses.len()
    }

    pub async fn users(&self) -> Vec<User> {
        self.tables.lock().await.users.values().cloned().collect()
    }

    pub async fn seen_rows(&self, user_id: i64) -> Vec<SeenNotification> {
        self.tables
            .lock()
            .await
            .seen
            .iter()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect()
    }

    /// Backdates a user, e.g. to make it eligible for the stale-account sweep.
    pub async fn set_created_at(&self, user_id: i64, created_at: DateTime<Utc>) {
        if let Some(u) = self.tables.lock().await.users.get_mut(&user_id) {
            u.created_at = created_at;
        }
    }

    pub async fn set_avatar(&self, user_id: i64, data: Vec<u8>, content_type: &str) {
        let mut t = self.tables.lock().await;
        if let Some(u) = t.users.get_mut(&user_id) {
            u.has_avatar = true;
            t.avatars.insert(user_id, (data, content_type.to_string()));
        }
    }

    pub async fn set_avatar_path(&self, user_id: i64, path: &str) {
        if let Some(u) = self.tables.lock().await.users.get_mut(&user_id) {
            u.avatar_path = Some(path.to_string());
        }
    }

    pub async fn deactivate_announcement(&self, id: i64) {
        if let Some(a) = self.tables.lock().await.announcements.get_mut(&id) {
            a.is_active = false;
        }
    }
}

#[async_trait]
impl RegistrationStore for MemoryStore {
    async fn insert_registration(
        &self,
        new: NewRegistration,
    ) -> Result<PendingRegistration, StoreError> {
        let mut t = self.tables.lock().await;
        let address = new.address.map(|fields| Address {
            id: t.next_id(),
            fields,
        });
        if let Some(a) = &address {
            t.addresses.insert(a.id, a.clone());
        }
        let now = Utc::now();
        let registration = PendingRegistration {
            id: t.next_id(),
            full_name: new.full_name,
            email: new.email,
            phone: new.phone,
            secondary_phone: new.secondary_phone,
            emergency_contact: new.emergency_contact,
            document_id: new.document_id,
            sex: new.sex,
            birth_date: new.birth_date,
            login: new.login,
            password_hash: new.password_hash,
            requested_role: new.requested_role,
            approved_role: None,
            status: RegistrationStatus::AwaitingReview.to_string(),
            notes: new.notes,
            address_id: address.as_ref().map(|a| a.id),
            address,
            created_at: now,
            updated_at: now,
        };
        t.registrations.insert(registration.id, registration.clone());
        Ok(registration)
    }

    async fn find_registration(&self, id: i64) -> Result<Option<PendingRegistration>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.registrations.get(&id).cloned().map(|mut r| {
            r.address = r.address_id.and_then(|aid| t.addresses.get(&aid).cloned());
            r
        }))
    }

    async fn list_registrations(
        &self,
        status: Option<RegistrationStatus>,
    ) -> Result<Vec<PendingRegistration>, StoreError> {
        let t = self.tables.lock().await;
        let mut rows: Vec<PendingRegistration> = t
            .registrations
            .values()
            .filter(|r| status.map_or(true, |s| r.status() == s))
            .cloned()
            .collect();
        rows.sort_by_key(|r| (r.created_at, r.id));
        Ok(rows)
    }

    async fn count_registrations(&self, status: RegistrationStatus) -> Result<i64, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.registrations.values().filter(|r| r.status() == status).count() as i64)
    }

    async fn commit_approval(&self, approval: ApprovalCommit) -> Result<User, StoreError> {
        let mut t = self.tables.lock().await;
        if !t.registrations.contains_key(&approval.registration_id) {
            return Err(StoreError::NotFound("Cadastro"));
        }
        // Check before mutating anything so a conflict leaves no trace.
        if let Some(field) = t.conflict_for(&approval.user) {
            return Err(StoreError::Conflict { field: field.to_string() });
        }
        if let Some(r) = t.registrations.get_mut(&approval.registration_id) {
            r.status = RegistrationStatus::Approved.to_string();
            r.approved_role = Some(approval.approved_role.clone());
            r.updated_at = Utc::now();
        }
        let user = t.insert_user(approval.user)?;
        t.registrations.remove(&approval.registration_id);
        if let Some(address_id) = approval.address_id {
            t.addresses.remove(&address_id);
        }
        Ok(user)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn find_user(&self, id: i64) -> Result<Option<User>, StoreError> {
        Ok(self.tables.lock().await.users.get(&id).cloned())
    }

    async fn login_in_use(&self, login: &str) -> Result<bool, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().any(|u| u.login.as_deref() == Some(login)))
    }

    async fn email_in_use(&self, email: &str) -> Result<bool, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.values().any(|u| u.email.as_deref() == Some(email)))
    }

    async fn insert_user(&self, new: NewUser) -> Result<User, StoreError> {
        self.tables.lock().await.insert_user(new)
    }

    async fn activated_users_with_birth_date(&self) -> Result<Vec<User>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users
            .values()
            .filter(|u| u.activated && u.birth_date.is_some())
            .cloned()
            .collect())
    }

    async fn user_avatar(&self, id: i64) -> Result<Option<UserAvatar>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.users.get(&id).map(|u| {
            let blob = t.avatars.get(&id);
            UserAvatar {
                data: blob.map(|(d, _)| d.clone()),
                content_type: blob.map(|(_, ct)| ct.clone()),
                path: u.avatar_path.clone(),
            }
        }))
    }

    async fn delete_stale_unactivated(
        &self,
        created_before: DateTime<Utc>,
    ) -> Result<u64, StoreError> {
        let mut t = self.tables.lock().await;
        let parents: HashSet<i64> = t
            .users
            .values()
            .flat_map(|u| [u.father_id, u.mother_id])
            .flatten()
            .collect();
        let before = t.users.len();
        t.users.retain(|id, u| {
            u.activated || u.is_dependent || parents.contains(id) || u.created_at >= created_before
        });
        Ok((before - t.users.len()) as u64)
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn insert_announcement(&self, new: NewAnnouncement) -> Result<Announcement, StoreError> {
        let mut t = self.tables.lock().await;
        let now = Utc::now();
        let announcement = Announcement {
            id: t.next_id(),
            title: new.title,
            body: new.body,
            kind: new.kind,
            starts_on: new.starts_on,
            ends_on: new.ends_on,
            is_active: true,
            created_by: new.created_by,
            created_at: now,
            updated_at: now,
        };
        t.announcements.insert(announcement.id, announcement.clone());
        Ok(announcement)
    }

    async fn active_announcements(
        &self,
        today: NaiveDate,
        limit: i64,
    ) -> Result<Vec<Announcement>, StoreError> {
        let t = self.tables.lock().await;
        Ok(t.announcements
            .values()
            .filter(|a| a.is_live_on(today))
            .take(limit.max(0) as usize)
            .cloned()
            .collect())
    }

    async fn seen_references(
        &self,
        user_id: i64,
        kind: NotificationKind,
    ) -> Result<HashSet<i64>, StoreError> {
        let t = self.tables.lock().await;
        let kind = kind.to_string();
        Ok(t.seen
            .iter()
            .filter(|s| s.user_id == user_id && s.kind == kind)
            .map(|s| s.reference_id)
            .collect())
    }

    async fn seen_exists(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
    ) -> Result<bool, StoreError> {
        let t = self.tables.lock().await;
        let kind = kind.to_string();
        Ok(t.seen
            .iter()
            .any(|s| s.user_id == user_id && s.kind == kind && s.reference_id == reference_id))
    }

    async fn insert_seen(
        &self,
        user_id: i64,
        kind: NotificationKind,
        reference_id: i64,
        seen_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut t = self.tables.lock().await;
        let kind = kind.to_string();
        let exists = t
            .seen
            .iter()
            .any(|s| s.user_id == user_id && s.kind == kind && s.reference_id == reference_id);
        if !exists {
            let id = t.next_id();
            t.seen.push(SeenNotification {
                id,
                user_id,
                kind,
                reference_id,
                seen_at,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
