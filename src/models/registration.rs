use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use super::address::{Address, AddressFields};
use super::user::UserProfile;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RegistrationStatus {
    AwaitingReview,
    Approved,
}

impl std::fmt::Display for RegistrationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RegistrationStatus::AwaitingReview => "AWAITING_REVIEW",
            RegistrationStatus::Approved => "APPROVED",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for RegistrationStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "AWAITING_REVIEW" => Ok(RegistrationStatus::AwaitingReview),
            "APPROVED" => Ok(RegistrationStatus::Approved),
            _ => Err(anyhow::anyhow!("Unknown registration status: {s}")),
        }
    }
}

/// A queued self-service signup. Rows are consumed (deleted) on approval.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PendingRegistration {
    pub id: i64,
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub document_id: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub login: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub requested_role: Option<String>,
    pub approved_role: Option<String>,
    /// Stored as TEXT; see `RegistrationStatus`.
    pub status: String,
    pub notes: Option<String>,
    pub address_id: Option<i64>,
    #[sqlx(skip)]
    pub address: Option<Address>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PendingRegistration {
    pub fn status(&self) -> RegistrationStatus {
        self.status
            .parse()
            .unwrap_or(RegistrationStatus::AwaitingReview)
    }
}

/// Insert shape for a registration; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewRegistration {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub document_id: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub login: String,
    pub password_hash: String,
    pub requested_role: Option<String>,
    pub notes: Option<String>,
    pub address: Option<AddressFields>,
}

// Request/Response DTOs
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRegistrationRequest {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub secondary_phone: Option<String>,
    pub emergency_contact: Option<String>,
    pub document_id: Option<String>,
    pub sex: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub login: String,
    pub password: String,
    pub requested_role: Option<String>,
    pub notes: Option<String>,
    pub address: Option<AddressFields>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApproveRegistrationRequest {
    pub role: String,
    #[serde(default)]
    pub modules: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListRegistrationsQuery {
    pub status: Option<RegistrationStatus>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ApprovedRegistration {
    pub registration_id: i64,
    pub status: RegistrationStatus,
    pub approved_role: String,
    pub granted_role: String,
    pub modules: Vec<String>,
    pub user: UserProfile,
}
