//! End-to-end lineup engine tests against an in-memory database.

use chrono::NaiveDate;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

use roster_server::db::models::{Caller, EventType, ResponseStatus, Role, User};
use roster_server::db::{event_repo, lineup_repo, response_repo, user_repo};
use roster_server::db::lineup_repo::AssignmentInput;
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

const ADMIN: Caller = Caller {
    user_id: 1,
    role: Role::Admin,
};

async fn add_user(pool: &SqlitePool, username: &str, role: Role) -> User {
    let user = user_repo::create_user(pool, username, &format!("+7-{username}"), "secret")
        .await
        .expect("create user");
    if role != Role::Player {
        user_repo::set_role(pool, ADMIN, user.id, role)
            .await
            .expect("set role");
    }
    user_repo::get_user(pool, user.id).await.expect("reload")
}

async fn add_event(pool: &SqlitePool, captain: &User, event_type: EventType) -> i64 {
    let event = event_repo::create_event(
        pool,
        caller(captain),
        event_repo::NewEvent {
            title: "Thursday practice".into(),
            description: None,
            event_type,
            datetime: NaiveDate::from_ymd_opt(2030, 3, 14)
                .unwrap()
                .and_hms_opt(19, 30, 0)
                .unwrap(),
            location: Some("Main rink".into()),
            opponent: None,
        },
    )
    .await
    .expect("create event");
    event.id
}

fn caller(u: &User) -> Caller {
    Caller {
        user_id: u.id,
        role: u.role,
    }
}

async fn attend(pool: &SqlitePool, user: &User, event_id: i64) {
    response_repo::submit_response(pool, user.id, event_id, ResponseStatus::Attending, None)
        .await
        .expect("submit response");
}

fn assignment(user: &User, position: &str, line: &str, jersey: &str) -> AssignmentInput {
    AssignmentInput {
        user_id: user.id,
        position: position.into(),
        line: line.into(),
        jersey_type: jersey.into(),
    }
}

#[tokio::test]
async fn full_training_scenario() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Training).await;

    attend(&pool, &player, event_id).await;

    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .expect("open lineup");

    let pool_users = lineup_repo::attending_pool(&pool, event_id).await.unwrap();
    assert!(pool_users.iter().any(|u| u.id == player.id));

    let a = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "2", ""),
    )
    .await
    .expect("assign");
    assert_eq!(a.jersey_type.as_deref(), Some("white"));
    assert_eq!(a.line.as_deref(), Some("2"));
}

#[tokio::test]
async fn lineup_open_is_idempotent_under_concurrency() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;

    let (a, b) = tokio::join!(
        lineup_repo::ensure_lineup(&pool, caller(&captain), event_id),
        lineup_repo::ensure_lineup(&pool, caller(&captain), event_id),
    );
    let (a, b) = (a.unwrap(), b.unwrap());
    assert_eq!(a.id, b.id);

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lineups WHERE event_id = ?1")
        .bind(event_id)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn player_role_cannot_open_or_edit_lineups() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    attend(&pool, &player, event_id).await;

    let err = lineup_repo::ensure_lineup(&pool, caller(&player), event_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    // no lineup row was created by the rejected open
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lineups")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);

    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();
    let err = lineup_repo::assign(
        &pool,
        caller(&player),
        lineup.id,
        assignment(&player, "forward", "1", ""),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::PermissionDenied(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lineup_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0);
}

#[tokio::test]
async fn assignment_requires_attending_response() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    // no response at all
    let err = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "1", ""),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    // a "maybe" is not good enough
    response_repo::submit_response(&pool, player.id, event_id, ResponseStatus::Maybe, None)
        .await
        .unwrap();
    let err = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "1", ""),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM lineup_assignments")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 0, "rejected assigns must write nothing");
}

#[tokio::test]
async fn revoked_response_rejects_assignment_at_write_time() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    attend(&pool, &player, event_id).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    // player was in the pool, then backs out before the captain assigns
    response_repo::submit_response(
        &pool,
        player.id,
        event_id,
        ResponseStatus::NotAttending,
        None,
    )
    .await
    .unwrap();

    let err = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "1", ""),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn goalkeeper_cap_is_two() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    let g1 = add_user(&pool, "g1", Role::Player).await;
    let g2 = add_user(&pool, "g2", Role::Player).await;
    let g3 = add_user(&pool, "g3", Role::Player).await;
    for g in [&g1, &g2, &g3] {
        attend(&pool, g, event_id).await;
    }

    for g in [&g1, &g2] {
        lineup_repo::assign(
            &pool,
            caller(&captain),
            lineup.id,
            assignment(g, "goalkeeper", "", ""),
        )
        .await
        .expect("first two goalkeepers fit");
    }

    let err = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&g3, "goalkeeper", "", ""),
    )
    .await
    .unwrap_err();
    match err {
        ApiError::Validation(msg) => assert!(msg.contains("2 goalkeepers")),
        other => panic!("expected validation error, got {other:?}"),
    }

    // the prior two assignments are untouched
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lineup_assignments WHERE lineup_id = ?1 AND position = 'goalkeeper'",
    )
    .bind(lineup.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn resaving_existing_goalkeeper_does_not_trip_the_cap() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    let g1 = add_user(&pool, "g1", Role::Player).await;
    let g2 = add_user(&pool, "g2", Role::Player).await;
    for g in [&g1, &g2] {
        attend(&pool, g, event_id).await;
        lineup_repo::assign(
            &pool,
            caller(&captain),
            lineup.id,
            assignment(g, "goalkeeper", "", ""),
        )
        .await
        .unwrap();
    }

    // re-save g1 with an explicit jersey; own row is excluded from the count
    let a = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&g1, "goalkeeper", "", "goalkeeper"),
    )
    .await
    .expect("re-save must not count against the cap");
    assert_eq!(a.jersey_type.as_deref(), Some("goalkeeper"));
}

#[tokio::test]
async fn assign_upserts_one_row_per_player() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    attend(&pool, &player, event_id).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "defender", "2", ""),
    )
    .await
    .unwrap();
    let a = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "5", ""),
    )
    .await
    .unwrap();

    assert_eq!(a.position, "forward");
    assert_eq!(a.jersey_type.as_deref(), Some("black"));

    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM lineup_assignments WHERE lineup_id = ?1 AND user_id = ?2",
    )
    .bind(lineup.id)
    .bind(player.id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn unknown_line_leaves_jersey_unset() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let player = add_user(&pool, "anna", Role::Player).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;
    attend(&pool, &player, event_id).await;
    let lineup = lineup_repo::ensure_lineup(&pool, caller(&captain), event_id)
        .await
        .unwrap();

    let a = lineup_repo::assign(
        &pool,
        caller(&captain),
        lineup.id,
        assignment(&player, "forward", "9", ""),
    )
    .await
    .unwrap();
    assert_eq!(a.jersey_type, None);
}

#[tokio::test]
async fn pool_excludes_decliners_inactive_and_admins() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let yes = add_user(&pool, "yes", Role::Player).await;
    let maybe = add_user(&pool, "maybe", Role::Player).await;
    let no = add_user(&pool, "no", Role::Player).await;
    let inactive = add_user(&pool, "gone", Role::Player).await;
    let admin = add_user(&pool, "boss", Role::Admin).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;

    attend(&pool, &yes, event_id).await;
    attend(&pool, &inactive, event_id).await;
    attend(&pool, &admin, event_id).await;
    response_repo::submit_response(&pool, maybe.id, event_id, ResponseStatus::Maybe, None)
        .await
        .unwrap();
    response_repo::submit_response(&pool, no.id, event_id, ResponseStatus::NotAttending, None)
        .await
        .unwrap();
    user_repo::set_active(&pool, ADMIN, inactive.id, false)
        .await
        .unwrap();

    let ids: Vec<i64> = lineup_repo::attending_pool(&pool, event_id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.id)
        .collect();
    assert_eq!(ids, vec![yes.id]);
}

#[tokio::test]
async fn pool_is_ordered_by_last_then_first_name() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;
    let event_id = add_event(&pool, &captain, EventType::Game).await;

    let b = add_user(&pool, "b", Role::Player).await;
    let a = add_user(&pool, "a", Role::Player).await;
    let unnamed = add_user(&pool, "z-unnamed", Role::Player).await;
    user_repo::update_profile(&pool, b.id, Some("Ivan".into()), Some("Borisov".into()), None, None)
        .await
        .unwrap();
    user_repo::update_profile(&pool, a.id, Some("Petr".into()), Some("Antonov".into()), None, None)
        .await
        .unwrap();
    for u in [&a, &b, &unnamed] {
        attend(&pool, u, event_id).await;
    }

    let names: Vec<String> = lineup_repo::attending_pool(&pool, event_id)
        .await
        .unwrap()
        .into_iter()
        .map(|u| u.full_name())
        .collect();
    // NULL name fields sort ahead, then lexical (last, first)
    assert_eq!(names, vec!["z-unnamed", "Antonov Petr", "Borisov Ivan"]);
}

#[tokio::test]
async fn lineup_for_missing_event_is_not_found() {
    let pool = test_pool().await;
    let captain = add_user(&pool, "cap", Role::Captain).await;

    let err = lineup_repo::ensure_lineup(&pool, caller(&captain), 999)
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}
