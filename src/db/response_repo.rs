//! Response ledger: one attendance decision per (user, event) pair.

use chrono::{DateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::db::event_repo;
use crate::db::models::{EventResponse, ResponseStatus};
use crate::error::ApiError;

/// A response joined with the responder's display fields, for the
/// event-detail roll.
#[derive(Debug, FromRow)]
pub struct ResponseWithUser {
    pub user_id: i64,
    pub username: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub status: ResponseStatus,
    pub comment: Option<String>,
    pub responded_at: DateTime<Utc>,
}

/// Record the caller's attendance decision for an event. A resubmission
/// overwrites the previous status/comment in place; the UNIQUE
/// (user_id, event_id) index keeps the ledger at one row per pair.
pub async fn submit_response(
    db: &SqlitePool,
    user_id: i64,
    event_id: i64,
    status: ResponseStatus,
    comment: Option<String>,
) -> Result<EventResponse, ApiError> {
    event_repo::get_event(db, event_id).await?;

    sqlx::query(
        "INSERT INTO event_responses (user_id, event_id, status, comment, responded_at)
         VALUES (?1, ?2, ?3, ?4, ?5)
         ON CONFLICT (user_id, event_id) DO UPDATE
           SET status = excluded.status,
               comment = excluded.comment,
               responded_at = excluded.responded_at",
    )
    .bind(user_id)
    .bind(event_id)
    .bind(status)
    .bind(&comment)
    .bind(Utc::now())
    .execute(db)
    .await?;

    let row = response_for(db, user_id, event_id)
        .await?
        .ok_or_else(|| ApiError::Internal(anyhow::anyhow!("response vanished after upsert")))?;
    Ok(row)
}

pub async fn response_for(
    db: &SqlitePool,
    user_id: i64,
    event_id: i64,
) -> Result<Option<EventResponse>, ApiError> {
    let row = sqlx::query_as::<_, EventResponse>(
        "SELECT * FROM event_responses WHERE user_id = ?1 AND event_id = ?2",
    )
    .bind(user_id)
    .bind(event_id)
    .fetch_optional(db)
    .await?;
    Ok(row)
}

/// Everyone's answer for one event, oldest response first.
pub async fn responses_for_event(
    db: &SqlitePool,
    event_id: i64,
) -> Result<Vec<ResponseWithUser>, ApiError> {
    let rows = sqlx::query_as::<_, ResponseWithUser>(
        "SELECT r.user_id, u.username, u.first_name, u.last_name,
                r.status, r.comment, r.responded_at
           FROM event_responses r
           JOIN users u ON u.id = r.user_id
          WHERE r.event_id = ?1
          ORDER BY r.responded_at ASC, r.id ASC",
    )
    .bind(event_id)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
