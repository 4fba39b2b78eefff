//! Event catalog: games and trainings.

use chrono::{NaiveDateTime, Utc};
use sqlx::SqlitePool;

use crate::db::models::{Caller, Event, EventType};
use crate::error::ApiError;

pub struct NewEvent {
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub datetime: NaiveDateTime,
    pub location: Option<String>,
    pub opponent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFilter {
    All,
    Games,
    Trainings,
}

impl EventFilter {
    pub fn parse(s: &str) -> EventFilter {
        match s {
            "games" => EventFilter::Games,
            "trainings" => EventFilter::Trainings,
            _ => EventFilter::All,
        }
    }
}

/// Create an event. Captains and admins only. The opponent field is only
/// persisted for games; trainings drop it.
pub async fn create_event(
    db: &SqlitePool,
    caller: Caller,
    new: NewEvent,
) -> Result<Event, ApiError> {
    if !caller.role.can_manage() {
        return Err(ApiError::PermissionDenied(
            "only captains and admins may create events".into(),
        ));
    }
    if new.title.trim().is_empty() {
        return Err(ApiError::Validation("title is required".into()));
    }

    let opponent = match new.event_type {
        EventType::Game => new.opponent,
        EventType::Training => None,
    };

    let done = sqlx::query(
        "INSERT INTO events (title, description, event_type, datetime, location, opponent, created_by, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
    )
    .bind(&new.title)
    .bind(&new.description)
    .bind(new.event_type)
    .bind(new.datetime)
    .bind(&new.location)
    .bind(&opponent)
    .bind(caller.user_id)
    .bind(Utc::now())
    .execute(db)
    .await?;

    get_event(db, done.last_insert_rowid()).await
}

pub async fn get_event(db: &SqlitePool, id: i64) -> Result<Event, ApiError> {
    sqlx::query_as::<_, Event>("SELECT * FROM events WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("event not found".into()))
}

/// All events, newest first, optionally restricted to one type.
pub async fn list_events(db: &SqlitePool, filter: EventFilter) -> Result<Vec<Event>, ApiError> {
    let events = match filter {
        EventFilter::All => {
            sqlx::query_as::<_, Event>("SELECT * FROM events ORDER BY datetime DESC")
                .fetch_all(db)
                .await?
        }
        EventFilter::Games | EventFilter::Trainings => {
            let event_type = if filter == EventFilter::Games {
                EventType::Game
            } else {
                EventType::Training
            };
            sqlx::query_as::<_, Event>(
                "SELECT * FROM events WHERE event_type = ?1 ORDER BY datetime DESC",
            )
            .bind(event_type)
            .fetch_all(db)
            .await?
        }
    };
    Ok(events)
}

/// Events at or after `now`, soonest first.
pub async fn upcoming_events(
    db: &SqlitePool,
    now: NaiveDateTime,
    limit: i64,
) -> Result<Vec<Event>, ApiError> {
    let events = sqlx::query_as::<_, Event>(
        "SELECT * FROM events WHERE datetime >= ?1 ORDER BY datetime ASC LIMIT ?2",
    )
    .bind(now)
    .bind(limit)
    .fetch_all(db)
    .await?;
    Ok(events)
}
