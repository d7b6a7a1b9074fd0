mod common;

use common::{date, member};
use semear_api::{
    db::{MemoryStore, UserStore},
    models::user::NewUser,
    services::birthdays::BirthdayService,
};

#[tokio::test]
async fn seven_days_out_is_in_eight_is_out() {
    let store = MemoryStore::new();
    let today = date(2026, 5, 1);
    member(&store, "Sete", "sete", Some(date(1990, 5, 8))).await;
    member(&store, "Oito", "oito", Some(date(1990, 5, 9))).await;

    let upcoming = BirthdayService::upcoming(&store, 7, today).await.unwrap();
    let names: Vec<&str> = upcoming.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Sete"]);
}

#[tokio::test]
async fn march_fifteenth_scenarios() {
    let store = MemoryStore::new();
    let maria = member(&store, "Maria", "maria", Some(date(1990, 3, 15))).await;

    let before = BirthdayService::upcoming(&store, 7, date(2026, 3, 10)).await.unwrap();
    assert_eq!(before.len(), 1);
    assert_eq!(before[0].user_id, maria.id);
    assert_eq!(before[0].next_birthday, date(2026, 3, 15));

    let after = BirthdayService::upcoming(&store, 7, date(2026, 3, 20)).await.unwrap();
    assert!(after.is_empty());
}

#[tokio::test]
async fn sorted_soonest_first_and_capped() {
    let store = MemoryStore::new();
    let today = date(2026, 1, 1);
    member(&store, "Tarde", "tarde", Some(date(1970, 1, 30))).await;
    member(&store, "Cedo", "cedo", Some(date(1970, 1, 2))).await;
    for i in 0..25 {
        member(&store, &format!("M{i:02}"), &format!("m{i:02}"), Some(date(1980, 1, 10))).await;
    }

    let upcoming = BirthdayService::upcoming(&store, 60, today).await.unwrap();
    assert_eq!(upcoming.len(), 20);
    assert_eq!(upcoming[0].name, "Cedo");
    assert!(upcoming
        .windows(2)
        .all(|w| w[0].next_birthday <= w[1].next_birthday));
    assert!(upcoming.iter().all(|b| b.name != "Tarde"));
}

#[tokio::test]
async fn window_is_clamped_to_sixty_days() {
    let store = MemoryStore::new();
    let today = date(2026, 1, 1);
    member(&store, "Perto", "perto", Some(date(1990, 2, 28))).await;
    member(&store, "Longe", "longe", Some(date(1990, 6, 1))).await;

    let upcoming = BirthdayService::upcoming(&store, 400, today).await.unwrap();
    let names: Vec<&str> = upcoming.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["Perto"]);

    // Zero and negative windows still include today.
    member(&store, "Hoje", "hoje", Some(date(1990, 1, 1))).await;
    let today_only = BirthdayService::upcoming(&store, -3, today).await.unwrap();
    assert_eq!(today_only[0].name, "Hoje");
}

#[tokio::test]
async fn unactivated_users_are_ignored() {
    let store = MemoryStore::new();
    store
        .insert_user(NewUser {
            login: Some("pendente".into()),
            first_name: "Pendente".into(),
            activated: false,
            birth_date: Some(date(1990, 3, 15)),
            ..NewUser::default()
        })
        .await
        .unwrap();

    let upcoming = BirthdayService::upcoming(&store, 7, date(2026, 3, 14)).await.unwrap();
    assert!(upcoming.is_empty());
}

#[tokio::test]
async fn avatar_url_is_exposed() {
    let store = MemoryStore::new();
    let ana = member(&store, "Ana", "ana", Some(date(1990, 3, 15))).await;
    store.set_avatar(ana.id, vec![1, 2, 3], "image/png").await;

    let upcoming = BirthdayService::upcoming(&store, 7, date(2026, 3, 15)).await.unwrap();
    assert_eq!(upcoming[0].avatar_url.as_deref(), Some(format!("/users/{}/avatar", ana.id).as_str()));
}
