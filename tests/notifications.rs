mod common;

use common::{date, member};
use semear_api::{
    db::{MemoryStore, NotificationStore},
    models::{
        announcement::NewAnnouncement,
        auth::AuthenticatedUser,
        notification::NotificationKind,
    },
    services::notifications::NotificationService,
};

fn caller(user_id: i64) -> AuthenticatedUser {
    AuthenticatedUser {
        user_id,
        login: "leitor".into(),
        authorities: vec!["ROLE_USER".into()],
    }
}

async fn announce(store: &MemoryStore, title: &str, body: &str) -> i64 {
    store
        .insert_announcement(NewAnnouncement {
            title: title.into(),
            body: body.into(),
            kind: "AVISO".into(),
            starts_on: None,
            ends_on: None,
            created_by: None,
        })
        .await
        .unwrap()
        .id
}

#[tokio::test]
async fn anonymous_caller_gets_nothing() {
    let store = MemoryStore::new();
    announce(&store, "Culto", "Domingo às 19h").await;
    let items = NotificationService::list_unseen(&store, None, date(2026, 3, 15))
        .await
        .unwrap();
    assert!(items.is_empty());
}

#[tokio::test]
async fn announcements_come_before_birthdays() {
    let store = MemoryStore::new();
    let today = date(2026, 3, 15);
    let aniversariante = member(&store, "Maria", "maria", Some(date(1990, 3, 15))).await;
    member(&store, "Pedro", "pedro", Some(date(1990, 3, 16))).await;
    let aviso = announce(&store, "Retiro", &"x".repeat(100)).await;

    let items = NotificationService::list_unseen(&store, Some(&caller(1)), today)
        .await
        .unwrap();

    assert_eq!(items.len(), 2);
    assert_eq!(items[0].kind, NotificationKind::Announcement);
    assert_eq!(items[0].reference_id, aviso);
    assert_eq!(items[0].link, format!("/avisos/{aviso}"));
    assert_eq!(items[0].summary, format!("{}...", "x".repeat(80)));
    assert_eq!(items[1].kind, NotificationKind::Birthday);
    assert_eq!(items[1].reference_id, aniversariante.id);
    assert_eq!(items[1].link, "/aniversariantes");
    assert!(items[1].summary.contains("Maria"));
}

#[tokio::test]
async fn seen_items_are_excluded_per_user() {
    let store = MemoryStore::new();
    let today = date(2026, 3, 15);
    let maria = member(&store, "Maria", "maria", Some(date(1990, 3, 15))).await;
    let aviso = announce(&store, "Retiro", "Inscrições abertas").await;

    NotificationService::mark_seen(&store, &caller(1), NotificationKind::Announcement, aviso)
        .await
        .unwrap();
    NotificationService::mark_seen(&store, &caller(1), NotificationKind::Birthday, maria.id)
        .await
        .unwrap();

    let mine = NotificationService::list_unseen(&store, Some(&caller(1)), today)
        .await
        .unwrap();
    assert!(mine.is_empty());

    let theirs = NotificationService::list_unseen(&store, Some(&caller(2)), today)
        .await
        .unwrap();
    assert_eq!(theirs.len(), 2);
}

#[tokio::test]
async fn seen_kind_is_part_of_the_key() {
    let store = MemoryStore::new();
    let today = date(2026, 3, 15);
    let maria = member(&store, "Maria", "maria", Some(date(1990, 3, 15))).await;

    // Same numeric id, other kind: the birthday stays unseen.
    NotificationService::mark_seen(&store, &caller(1), NotificationKind::Announcement, maria.id)
        .await
        .unwrap();

    let items = NotificationService::list_unseen(&store, Some(&caller(1)), today)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].kind, NotificationKind::Birthday);
}

#[tokio::test]
async fn mark_seen_twice_keeps_one_row() {
    let store = MemoryStore::new();
    let aviso = announce(&store, "Retiro", "Inscrições abertas").await;

    let first = NotificationService::mark_seen(&store, &caller(5), NotificationKind::Announcement, aviso)
        .await
        .unwrap();
    let second = NotificationService::mark_seen(&store, &caller(5), NotificationKind::Announcement, aviso)
        .await
        .unwrap();

    assert!(first);
    assert!(!second);
    assert_eq!(store.seen_rows(5).await.len(), 1);
}

#[tokio::test]
async fn birthdays_are_capped_at_ten() {
    let store = MemoryStore::new();
    let today = date(2026, 7, 1);
    for i in 0..12 {
        member(&store, &format!("Membro{i}"), &format!("membro{i}"), Some(date(1980 + i, 7, 1))).await;
    }

    let items = NotificationService::list_unseen(&store, Some(&caller(100)), today)
        .await
        .unwrap();
    assert_eq!(items.len(), 10);
    assert!(items.iter().all(|i| i.kind == NotificationKind::Birthday));
}

#[tokio::test]
async fn inactive_and_expired_announcements_are_hidden() {
    let store = MemoryStore::new();
    let today = date(2026, 3, 15);
    let desativado = announce(&store, "Antigo", "Não vale mais").await;
    store.deactivate_announcement(desativado).await;
    store
        .insert_announcement(NewAnnouncement {
            title: "Encerrado".into(),
            body: "Já passou".into(),
            kind: "AVISO".into(),
            starts_on: Some(date(2026, 3, 1)),
            ends_on: Some(date(2026, 3, 10)),
            created_by: None,
        })
        .await
        .unwrap();
    let vigente = announce(&store, "Vigente", "Ainda vale").await;

    let items = NotificationService::list_unseen(&store, Some(&caller(1)), today)
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].reference_id, vigente);
}

#[tokio::test]
async fn leap_day_birthday_notifies_on_feb_28() {
    let store = MemoryStore::new();
    let bissexto = member(&store, "Bia", "bia", Some(date(2000, 2, 29))).await;

    let items = NotificationService::list_unseen(&store, Some(&caller(1)), date(2026, 2, 28))
        .await
        .unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].reference_id, bissexto.id);
}
