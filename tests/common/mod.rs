// Common test utilities for integration tests
#![allow(dead_code)]

use std::sync::Arc;

use chrono::NaiveDate;

use semear_api::{
    config::Config,
    db::{MemoryStore, UserStore},
    models::{
        address::AddressFields,
        registration::SubmitRegistrationRequest,
        user::{NewUser, User},
    },
    services::password::PasswordHasher,
    AppState,
};

pub const JWT_SECRET: &str = "test-secret";

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// Lowest bcrypt cost keeps hashing fast in tests.
pub fn hasher() -> PasswordHasher {
    PasswordHasher::new(4)
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://unused".into(),
        jwt_secret: JWT_SECRET.into(),
        host: "127.0.0.1".into(),
        port: 0,
        bcrypt_cost: 4,
        stale_account_days: 3,
        cors_allowed_origin: "http://localhost:4200".into(),
    }
}

pub fn test_state(store: Arc<MemoryStore>) -> AppState {
    AppState::new(store, Arc::new(test_config()))
}

pub fn address() -> AddressFields {
    AddressFields {
        street: Some("Rua das Flores".into()),
        number: Some("120".into()),
        complement: None,
        district: Some("Centro".into()),
        city: Some("Campinas".into()),
        state: Some("SP".into()),
        postal_code: Some("13010-000".into()),
    }
}

pub fn submission(full_name: &str, login: &str, email: &str) -> SubmitRegistrationRequest {
    SubmitRegistrationRequest {
        full_name: full_name.into(),
        email: email.into(),
        phone: Some("(19) 99999-0000".into()),
        secondary_phone: None,
        emergency_contact: None,
        document_id: None,
        sex: Some("F".into()),
        birth_date: Some(date(1990, 3, 15)),
        login: login.into(),
        password: "segredo123".into(),
        requested_role: Some("PASTOR".into()),
        notes: None,
        address: Some(address()),
    }
}

/// Inserts an activated member straight into the store.
pub async fn member(store: &MemoryStore, first: &str, login: &str, birth: Option<NaiveDate>) -> User {
    store
        .insert_user(NewUser {
            login: Some(login.into()),
            email: Some(format!("{login}@semear.org")),
            first_name: first.into(),
            activated: true,
            birth_date: birth,
            authorities: vec!["ROLE_USER".into()],
            ..NewUser::default()
        })
        .await
        .unwrap()
}
