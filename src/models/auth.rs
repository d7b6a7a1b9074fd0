use serde::{Deserialize, Serialize};

use super::user::ROLE_ADMIN;

/// Claims embedded in the JWT access token
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,   // user id
    pub login: String,
    pub auth: Vec<String>, // granted authorities, e.g. ROLE_ADMIN
    pub exp: usize,
    pub iat: usize,
}

/// Extracted from the validated JWT. Handlers pass it explicitly into the
/// services; nothing looks the caller up from ambient state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i64,
    pub login: String,
    pub authorities: Vec<String>,
}

impl AuthenticatedUser {
    pub fn has_authority(&self, authority: &str) -> bool {
        self.authorities.iter().any(|a| a == authority)
    }

    pub fn is_admin(&self) -> bool {
        self.has_authority(ROLE_ADMIN)
    }
}
