use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Account role. Captains and admins may create events and manage lineups;
/// only admins may change roles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum Role {
    Player,
    Captain,
    Admin,
}

impl Role {
    /// Whether this role may create events and edit lineups.
    pub fn can_manage(self) -> bool {
        matches!(self, Role::Captain | Role::Admin)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum EventType {
    Game,
    Training,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "snake_case")]
#[sqlx(rename_all = "snake_case")]
pub enum ResponseStatus {
    Attending,
    NotAttending,
    Maybe,
}

/// The authenticated caller of a core operation: user id + role, extracted
/// from the bearer token. Passed explicitly into every repo call that needs
/// authorization.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub user_id: i64,
    pub role: Role,
}

#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub phone: String,
    pub password_hash: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub role: Role,
    pub position: Option<String>,
    pub number: Option<i64>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl User {
    /// Display name: "last first" when both are set, else whichever is
    /// present, else the username.
    pub fn full_name(&self) -> String {
        match (self.last_name.as_deref(), self.first_name.as_deref()) {
            (Some(last), Some(first)) => format!("{last} {first}"),
            (Some(last), None) => last.to_string(),
            (None, Some(first)) => first.to_string(),
            (None, None) => self.username.clone(),
        }
    }
}

#[derive(Debug, Clone, FromRow)]
pub struct Event {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub datetime: NaiveDateTime,
    pub location: Option<String>,
    pub opponent: Option<String>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct EventResponse {
    pub id: i64,
    pub user_id: i64,
    pub event_id: i64,
    pub status: ResponseStatus,
    pub comment: Option<String>,
    pub responded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct Lineup {
    pub id: i64,
    pub event_id: i64,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
pub struct LineupAssignment {
    pub id: i64,
    pub lineup_id: i64,
    pub user_id: i64,
    pub position: String,
    pub line: Option<String>,
    pub jersey_type: Option<String>,
    pub created_at: DateTime<Utc>,
}
