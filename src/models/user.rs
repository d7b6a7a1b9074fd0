use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::address::AddressFields;

pub const ROLE_ADMIN: &str = "ROLE_ADMIN";

/// DB row struct. `has_avatar` is computed in the SELECT (`avatar IS NOT NULL`)
/// so listing users never drags the blob along.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,
    pub login: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    pub activated: bool,
    pub is_dependent: bool,
    pub father_id: Option<i64>,
    pub mother_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub authorities: Vec<String>,
    pub modules: Vec<String>,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub document_id: Option<String>,
    pub sex: Option<String>,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub address: AddressFields,
    pub has_avatar: bool,
    /// Legacy marker: avatars uploaded before blobs were stored in the row
    /// live on disk under the media directory.
    pub avatar_path: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// "first last" trimmed, or the login when both name parts are blank.
    pub fn display_name(&self) -> String {
        let full = format!("{} {}", self.first_name.trim(), self.last_name.trim());
        let full = full.trim();
        if full.is_empty() {
            self.login.clone().unwrap_or_default()
        } else {
            full.to_string()
        }
    }

    pub fn avatar_url(&self) -> Option<String> {
        if self.has_avatar {
            Some(format!("/users/{}/avatar", self.id))
        } else {
            self.avatar_path
                .as_deref()
                .filter(|p| !p.trim().is_empty())
                .map(|p| format!("/media/{}", p.trim_start_matches('/')))
        }
    }
}

/// Insert shape for a user. Login and e-mail are expected lower-cased.
#[derive(Debug, Clone, Default)]
pub struct NewUser {
    pub login: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub password_hash: Option<String>,
    pub activated: bool,
    pub is_dependent: bool,
    pub father_id: Option<i64>,
    pub mother_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub authorities: Vec<String>,
    pub modules: Vec<String>,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub document_id: Option<String>,
    pub sex: Option<String>,
    pub address: AddressFields,
}

#[derive(Debug, Clone)]
pub struct UserAvatar {
    pub data: Option<Vec<u8>>,
    pub content_type: Option<String>,
    pub path: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: i64,
    pub login: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub activated: bool,
    pub is_dependent: bool,
    pub father_id: Option<i64>,
    pub mother_id: Option<i64>,
    pub birth_date: Option<NaiveDate>,
    pub authorities: Vec<String>,
    pub modules: Vec<String>,
    #[serde(flatten)]
    pub address: AddressFields,
    pub avatar_url: Option<String>,
}

impl From<User> for UserProfile {
    fn from(u: User) -> Self {
        let avatar_url = u.avatar_url();
        Self {
            id: u.id,
            login: u.login,
            email: u.email,
            first_name: u.first_name,
            last_name: u.last_name,
            activated: u.activated,
            is_dependent: u.is_dependent,
            father_id: u.father_id,
            mother_id: u.mother_id,
            birth_date: u.birth_date,
            authorities: u.authorities,
            modules: u.modules,
            address: u.address,
            avatar_url,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateUserRequest {
    pub login: Option<String>,
    pub email: Option<String>,
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    pub password: Option<String>,
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub authorities: Vec<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub is_dependent: bool,
    pub father_id: Option<i64>,
    pub mother_id: Option<i64>,
    pub activated: Option<bool>,
    pub phone: Option<String>,
    #[serde(default)]
    pub address: AddressFields,
}
