//! Lineup engine: per-event roster assignments gated by attendance.
//!
//! All writes here run inside a transaction so the eligibility check, the
//! goalkeeper-capacity check and the upsert land as one atomic unit.

use chrono::Utc;
use sqlx::SqlitePool;

use crate::db::event_repo;
use crate::db::models::{Caller, Lineup, LineupAssignment, ResponseStatus, User};
use crate::error::ApiError;

/// Position token subject to the capacity limit.
pub const GOALKEEPER: &str = "goalkeeper";
/// A lineup may carry at most this many goalkeepers.
pub const MAX_GOALKEEPERS: i64 = 2;

/// Derive the jersey color when the caller did not supply one.
///
/// An explicit value always wins. Derivation only applies when both position
/// and line are present: goalkeepers get the goalkeeper jersey, lines 1-3
/// white, lines 4-6 black. Anything else stays unset.
pub fn derive_jersey(position: &str, line: &str, explicit: &str) -> String {
    if !explicit.is_empty() {
        return explicit.to_string();
    }
    if position.is_empty() || line.is_empty() {
        return String::new();
    }
    if position == GOALKEEPER {
        return "goalkeeper".to_string();
    }
    match line {
        "1" | "2" | "3" => "white".to_string(),
        "4" | "5" | "6" => "black".to_string(),
        _ => String::new(),
    }
}

fn none_if_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

pub struct AssignmentInput {
    pub user_id: i64,
    pub position: String,
    pub line: String,
    pub jersey_type: String,
}

/// Fetch the lineup for an event, creating it on first open. Captains and
/// admins only. The UNIQUE(event_id) index plus ON CONFLICT DO NOTHING makes
/// concurrent first-opens converge on a single row.
pub async fn ensure_lineup(
    db: &SqlitePool,
    caller: Caller,
    event_id: i64,
) -> Result<Lineup, ApiError> {
    if !caller.role.can_manage() {
        return Err(ApiError::PermissionDenied(
            "only captains and admins may manage lineups".into(),
        ));
    }
    event_repo::get_event(db, event_id).await?;

    sqlx::query(
        "INSERT INTO lineups (event_id, created_by, created_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT (event_id) DO NOTHING",
    )
    .bind(event_id)
    .bind(caller.user_id)
    .bind(Utc::now())
    .execute(db)
    .await?;

    let lineup = sqlx::query_as::<_, Lineup>("SELECT * FROM lineups WHERE event_id = ?1")
        .bind(event_id)
        .fetch_one(db)
        .await?;
    Ok(lineup)
}

/// The lineup for an event, if one has been opened. No authorization: used
/// by read-only views that only report membership.
pub async fn lineup_for_event(
    db: &SqlitePool,
    event_id: i64,
) -> Result<Option<Lineup>, ApiError> {
    let row = sqlx::query_as::<_, Lineup>("SELECT * FROM lineups WHERE event_id = ?1")
        .bind(event_id)
        .fetch_optional(db)
        .await?;
    Ok(row)
}

/// Candidate pool for an event: active players and captains with an
/// attending response, ordered like the roster listing.
pub async fn attending_pool(db: &SqlitePool, event_id: i64) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT u.* FROM users u
           JOIN event_responses r ON r.user_id = u.id
          WHERE r.event_id = ?1
            AND r.status = ?2
            AND u.is_active = 1
            AND u.role IN ('player', 'captain')
          ORDER BY u.last_name ASC, u.first_name ASC, u.id ASC",
    )
    .bind(event_id)
    .bind(ResponseStatus::Attending)
    .fetch_all(db)
    .await?;
    Ok(users)
}

pub async fn assignments(
    db: &SqlitePool,
    lineup_id: i64,
) -> Result<Vec<LineupAssignment>, ApiError> {
    let rows = sqlx::query_as::<_, LineupAssignment>(
        "SELECT * FROM lineup_assignments WHERE lineup_id = ?1 ORDER BY id ASC",
    )
    .bind(lineup_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}

pub async fn assignment_for(
    db: &SqlitePool,
    lineup_id: i64,
    user_id: i64,
) -> Result<Option<LineupAssignment>, ApiError> {
    let row = sqlx::query_as::<_, LineupAssignment>(
        "SELECT * FROM lineup_assignments WHERE lineup_id = ?1 AND user_id = ?2",
    )
    .bind(lineup_id)
    .bind(user_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Place (or move) a player in a lineup. Captains and admins only.
///
/// Eligibility is re-checked at write time: a response revoked between
/// pool-fetch and assign rejects the write. The goalkeeper count excludes
/// the target user's own row, so re-saving an existing goalkeeper never
/// trips the cap. A rejection rolls the transaction back and writes nothing.
pub async fn assign(
    db: &SqlitePool,
    caller: Caller,
    lineup_id: i64,
    input: AssignmentInput,
) -> Result<LineupAssignment, ApiError> {
    if !caller.role.can_manage() {
        return Err(ApiError::PermissionDenied(
            "only captains and admins may edit lineups".into(),
        ));
    }
    if input.position.trim().is_empty() {
        return Err(ApiError::Validation("position is required".into()));
    }

    let mut tx = db.begin().await?;

    let lineup = sqlx::query_as::<_, Lineup>("SELECT * FROM lineups WHERE id = ?1")
        .bind(lineup_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| ApiError::NotFound("lineup not found".into()))?;

    let attending: bool = sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM event_responses
             WHERE event_id = ?1 AND user_id = ?2 AND status = ?3
         )",
    )
    .bind(lineup.event_id)
    .bind(input.user_id)
    .bind(ResponseStatus::Attending)
    .fetch_one(&mut *tx)
    .await?;
    if !attending {
        return Err(ApiError::Validation(
            "player must confirm attendance before lineup assignment".into(),
        ));
    }

    if input.position == GOALKEEPER {
        let goalkeepers: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM lineup_assignments
              WHERE lineup_id = ?1 AND position = ?2 AND user_id <> ?3",
        )
        .bind(lineup_id)
        .bind(GOALKEEPER)
        .bind(input.user_id)
        .fetch_one(&mut *tx)
        .await?;
        if goalkeepers >= MAX_GOALKEEPERS {
            return Err(ApiError::Validation(
                "maximum 2 goalkeepers per lineup".into(),
            ));
        }
    }

    let jersey = derive_jersey(&input.position, &input.line, &input.jersey_type);

    sqlx::query(
        "INSERT INTO lineup_assignments (lineup_id, user_id, position, line, jersey_type, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)
         ON CONFLICT (lineup_id, user_id) DO UPDATE
           SET position = excluded.position,
               line = excluded.line,
               jersey_type = excluded.jersey_type",
    )
    .bind(lineup_id)
    .bind(input.user_id)
    .bind(&input.position)
    .bind(none_if_empty(input.line))
    .bind(none_if_empty(jersey))
    .bind(Utc::now())
    .execute(&mut *tx)
    .await?;

    let row = sqlx::query_as::<_, LineupAssignment>(
        "SELECT * FROM lineup_assignments WHERE lineup_id = ?1 AND user_id = ?2",
    )
    .bind(lineup_id)
    .bind(input.user_id)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}
