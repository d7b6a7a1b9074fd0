use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// The seven postal fields shared by `addresses` rows and the user's own
/// address columns.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct AddressFields {
    pub street: Option<String>,
    pub number: Option<String>,
    pub complement: Option<String>,
    pub district: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub postal_code: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Address {
    pub id: i64,
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub fields: AddressFields,
}
