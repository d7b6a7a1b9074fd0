mod common;

use chrono::{Duration, Utc};

use common::{date, hasher, member};
use semear_api::{
    db::{MemoryStore, UserStore},
    error::AppError,
    models::{address::AddressFields, user::{CreateUserRequest, NewUser}},
    services::{
        cleanup::CleanupService,
        users::{AvatarContent, UserService},
    },
};

fn dependent(first: &str, father_id: Option<i64>, mother_id: Option<i64>) -> CreateUserRequest {
    CreateUserRequest {
        login: None,
        email: None,
        first_name: first.into(),
        last_name: "Souza".into(),
        password: None,
        birth_date: Some(date(2018, 6, 1)),
        authorities: vec![],
        modules: vec![],
        is_dependent: true,
        father_id,
        mother_id,
        activated: None,
        phone: None,
        address: AddressFields::default(),
    }
}

fn adult(login: &str) -> CreateUserRequest {
    CreateUserRequest {
        login: Some(login.into()),
        email: Some(format!("{login}@semear.org")),
        password: Some("segredo123".into()),
        is_dependent: false,
        father_id: None,
        mother_id: None,
        ..dependent("Carlos", None, None)
    }
}

#[tokio::test]
async fn dependent_is_linked_to_parent() {
    let store = MemoryStore::new();
    let mae = member(&store, "Maria", "maria", None).await;

    let filho = UserService::create(&store, &hasher(), dependent("Lucas", None, Some(mae.id)))
        .await
        .unwrap();

    assert!(filho.is_dependent);
    assert!(filho.activated);
    assert_eq!(filho.login, None);
    assert_eq!(filho.mother_id, Some(mae.id));
}

#[tokio::test]
async fn dependent_needs_a_parent() {
    let store = MemoryStore::new();
    let err = UserService::create(&store, &hasher(), dependent("Lucas", None, None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn dependent_cannot_have_login() {
    let store = MemoryStore::new();
    let mae = member(&store, "Maria", "maria", None).await;
    let mut req = dependent("Lucas", None, Some(mae.id));
    req.login = Some("lucas".into());
    let err = UserService::create(&store, &hasher(), req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn dependent_of_dependent_is_rejected() {
    let store = MemoryStore::new();
    let mae = member(&store, "Maria", "maria", None).await;
    let filho = UserService::create(&store, &hasher(), dependent("Lucas", None, Some(mae.id)))
        .await
        .unwrap();

    let err = UserService::create(&store, &hasher(), dependent("Neto", Some(filho.id), None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn unknown_parent_is_not_found() {
    let store = MemoryStore::new();
    let err = UserService::create(&store, &hasher(), dependent("Lucas", Some(404), None))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::NotFound(_)));
}

#[tokio::test]
async fn member_gets_default_authority_and_unique_login() {
    let store = MemoryStore::new();
    let carlos = UserService::create(&store, &hasher(), adult("carlos")).await.unwrap();
    assert_eq!(carlos.authorities, vec!["ROLE_USER".to_string()]);
    assert!(carlos.activated);

    let mut again = adult("carlos");
    again.email = Some("outro@semear.org".into());
    let err = UserService::create(&store, &hasher(), again).await.unwrap_err();
    assert!(matches!(err, AppError::AlreadyUsed { ref field } if field == "login"));
}

#[tokio::test]
async fn member_cannot_point_at_parents() {
    let store = MemoryStore::new();
    let mae = member(&store, "Maria", "maria", None).await;
    let mut req = adult("carlos");
    req.mother_id = Some(mae.id);
    let err = UserService::create(&store, &hasher(), req).await.unwrap_err();
    assert!(matches!(err, AppError::Validation(_)));
}

#[tokio::test]
async fn avatar_blob_then_legacy_path() {
    let store = MemoryStore::new();
    let ana = member(&store, "Ana", "ana", None).await;
    let bia = member(&store, "Bia", "bia", None).await;
    let caio = member(&store, "Caio", "caio", None).await;
    store.set_avatar(ana.id, vec![0x89, 0x50], "image/png").await;
    store.set_avatar_path(bia.id, "avatars/bia.jpg").await;

    match UserService::avatar(&store, ana.id).await.unwrap() {
        AvatarContent::Blob { data, content_type } => {
            assert_eq!(data, vec![0x89, 0x50]);
            assert_eq!(content_type, "image/png");
        }
        AvatarContent::LegacyPath(_) => panic!("expected blob"),
    }
    assert!(matches!(
        UserService::avatar(&store, bia.id).await.unwrap(),
        AvatarContent::LegacyPath(ref p) if p == "avatars/bia.jpg"
    ));
    assert!(matches!(
        UserService::avatar(&store, caio.id).await,
        Err(AppError::NotFound(_))
    ));
    assert!(matches!(
        UserService::avatar(&store, 999).await,
        Err(AppError::NotFound(_))
    ));
}

#[tokio::test]
async fn stale_unactivated_accounts_are_purged() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let ativo = member(&store, "Ativo", "ativo", None).await;
    let recente = store
        .insert_user(NewUser {
            login: Some("recente".into()),
            first_name: "Recente".into(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    let antigo = store
        .insert_user(NewUser {
            login: Some("antigo".into()),
            first_name: "Antigo".into(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    store.set_created_at(antigo.id, now - Duration::days(4)).await;
    store.set_created_at(ativo.id, now - Duration::days(30)).await;

    let purged = CleanupService::purge_stale_accounts(&store, now, 3).await.unwrap();
    assert_eq!(purged, 1);

    let ids: Vec<i64> = store.users().await.iter().map(|u| u.id).collect();
    assert_eq!(ids, vec![ativo.id, recente.id]);
}

#[tokio::test]
async fn unactivated_parent_of_a_dependent_survives_the_sweep() {
    let store = MemoryStore::new();
    let now = Utc::now();
    let pai = store
        .insert_user(NewUser {
            login: Some("pai".into()),
            first_name: "Pai".into(),
            ..NewUser::default()
        })
        .await
        .unwrap();
    let filho = UserService::create(&store, &hasher(), dependent("Lucas", Some(pai.id), None))
        .await
        .unwrap();
    store.set_created_at(pai.id, now - Duration::days(10)).await;

    let purged = CleanupService::purge_stale_accounts(&store, now, 3).await.unwrap();
    assert_eq!(purged, 0);

    assert!(store.find_user(pai.id).await.unwrap().is_some());
    let filho = store.find_user(filho.id).await.unwrap().unwrap();
    assert_eq!(filho.father_id, Some(pai.id));
}
