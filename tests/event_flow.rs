//! Event catalog tests: creation rules, filtering, upcoming ordering.

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use roster_server::db::event_repo::{self, EventFilter, NewEvent};
use roster_server::db::models::{Caller, EventType, Role};
use roster_server::db::user_repo;
use roster_server::error::ApiError;

async fn test_pool() -> SqlitePool {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect("sqlite::memory:")
        .await
        .expect("open in-memory db");
    roster_server::db::init_schema(&pool).await.expect("schema");
    pool
}

async fn captain(pool: &SqlitePool) -> Caller {
    let user = user_repo::create_user(pool, "cap", "+7-cap", "secret")
        .await
        .unwrap();
    Caller {
        user_id: user.id,
        role: Role::Captain,
    }
}

fn new_event(title: &str, event_type: EventType, day: u32, opponent: Option<&str>) -> NewEvent {
    NewEvent {
        title: title.into(),
        description: None,
        event_type,
        datetime: NaiveDate::from_ymd_opt(2030, 5, day)
            .unwrap()
            .and_hms_opt(19, 0, 0)
            .unwrap(),
        location: None,
        opponent: opponent.map(Into::into),
    }
}

#[tokio::test]
async fn players_cannot_create_events() {
    let pool = test_pool().await;
    let user = user_repo::create_user(&pool, "anna", "+7-1", "secret")
        .await
        .unwrap();

    let err = event_repo::create_event(
        &pool,
        Caller {
            user_id: user.id,
            role: Role::Player,
        },
        new_event("Practice", EventType::Training, 1, None),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));
}

#[tokio::test]
async fn opponent_is_dropped_for_trainings() {
    let pool = test_pool().await;
    let cap = captain(&pool).await;

    let training = event_repo::create_event(
        &pool,
        cap,
        new_event("Practice", EventType::Training, 1, Some("Rivals")),
    )
    .await
    .unwrap();
    assert_eq!(training.opponent, None);

    let game = event_repo::create_event(
        &pool,
        cap,
        new_event("Derby", EventType::Game, 2, Some("Rivals")),
    )
    .await
    .unwrap();
    assert_eq!(game.opponent.as_deref(), Some("Rivals"));
}

#[tokio::test]
async fn listing_filters_by_type() {
    let pool = test_pool().await;
    let cap = captain(&pool).await;
    event_repo::create_event(&pool, cap, new_event("Practice", EventType::Training, 1, None))
        .await
        .unwrap();
    event_repo::create_event(&pool, cap, new_event("Derby", EventType::Game, 2, Some("R")))
        .await
        .unwrap();

    let games = event_repo::list_events(&pool, EventFilter::Games).await.unwrap();
    assert_eq!(games.len(), 1);
    assert_eq!(games[0].event_type, EventType::Game);

    let trainings = event_repo::list_events(&pool, EventFilter::Trainings)
        .await
        .unwrap();
    assert_eq!(trainings.len(), 1);

    let all = event_repo::list_events(&pool, EventFilter::All).await.unwrap();
    assert_eq!(all.len(), 2);
    // newest first
    assert_eq!(all[0].title, "Derby");
}

#[tokio::test]
async fn upcoming_skips_past_events_and_limits() {
    let pool = test_pool().await;
    let cap = captain(&pool).await;
    for day in 1..=7 {
        event_repo::create_event(
            &pool,
            cap,
            new_event(&format!("E{day}"), EventType::Training, day, None),
        )
        .await
        .unwrap();
    }

    let cutoff = NaiveDate::from_ymd_opt(2030, 5, 3)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    let upcoming = event_repo::upcoming_events(&pool, cutoff, 5).await.unwrap();
    assert_eq!(upcoming.len(), 5);
    assert_eq!(upcoming[0].title, "E3", "soonest first");

    let missing = event_repo::get_event(&pool, 999).await.unwrap_err();
    assert!(matches!(missing, ApiError::NotFound(_)));
}
