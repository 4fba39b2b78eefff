//! Event catalog endpoints: creation, listing, detail, dashboard.

use actix_web::{get, post, web, HttpResponse};
use chrono::{NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::{Event, EventType, ResponseStatus};
use crate::db::{event_repo, lineup_repo, response_repo};
use crate::error::ApiError;
use crate::http::auth::AuthUser;

//////////////////////////////////////////////////
// Data transfer objects
//////////////////////////////////////////////////

#[derive(Serialize)]
pub struct EventRow {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub event_type: EventType,
    pub datetime: NaiveDateTime,
    pub location: Option<String>,
    pub opponent: Option<String>,
}

impl From<Event> for EventRow {
    fn from(e: Event) -> Self {
        EventRow {
            id: e.id,
            title: e.title,
            description: e.description,
            event_type: e.event_type,
            datetime: e.datetime,
            location: e.location,
            opponent: e.opponent,
        }
    }
}

#[derive(Serialize)]
pub struct ResponseRow {
    pub user_id: i64,
    pub full_name: String,
    pub status: ResponseStatus,
    pub comment: Option<String>,
}

#[derive(Serialize)]
pub struct EventDetail {
    pub event: EventRow,
    pub my_status: Option<ResponseStatus>,
    pub responses: Vec<ResponseRow>,
    /// Present once a captain has opened the lineup for this event.
    pub lineup_id: Option<i64>,
}

#[derive(Serialize)]
pub struct DashboardEntry {
    pub event: EventRow,
    pub my_status: Option<ResponseStatus>,
    pub my_assignment: Option<DashboardAssignment>,
}

#[derive(Serialize)]
pub struct DashboardAssignment {
    pub position: String,
    pub line: Option<String>,
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct CreateEventReq {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub event_type: EventType,
    pub datetime: NaiveDateTime,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub opponent: Option<String>,
}

#[derive(Deserialize)]
pub struct EventsQuery {
    /// all | games | trainings
    #[serde(default, rename = "type")]
    pub kind: String,
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// POST /api/events — captains and admins only.
#[post("/events")]
pub async fn create_event(
    auth: AuthUser,
    info: web::Json<CreateEventReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let info = info.into_inner();
    let event = event_repo::create_event(
        &db,
        auth.caller(),
        event_repo::NewEvent {
            title: info.title,
            description: info.description,
            event_type: info.event_type,
            datetime: info.datetime,
            location: info.location,
            opponent: info.opponent,
        },
    )
    .await?;
    log::info!("event {} created by user {}", event.id, auth.user_id);
    Ok(HttpResponse::Ok().json(EventRow::from(event)))
}

/// GET /api/events?type=games|trainings
#[get("/events")]
pub async fn list_events(
    _auth: AuthUser,
    query: web::Query<EventsQuery>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let filter = event_repo::EventFilter::parse(&query.kind);
    let rows: Vec<EventRow> = event_repo::list_events(&db, filter)
        .await?
        .into_iter()
        .map(EventRow::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/events/{id} — the event, the caller's own status, everyone's
/// responses and the lineup id if one exists.
#[get("/events/{id}")]
pub async fn event_detail(
    auth: AuthUser,
    path: web::Path<i64>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let event_id = path.into_inner();
    let event = event_repo::get_event(&db, event_id).await?;

    let my_status = response_repo::response_for(&db, auth.user_id, event_id)
        .await?
        .map(|r| r.status);

    let responses = response_repo::responses_for_event(&db, event_id)
        .await?
        .into_iter()
        .map(|r| {
            let full_name = match (r.last_name.as_deref(), r.first_name.as_deref()) {
                (Some(last), Some(first)) => format!("{last} {first}"),
                (Some(last), None) => last.to_string(),
                (None, Some(first)) => first.to_string(),
                (None, None) => r.username.clone(),
            };
            ResponseRow {
                user_id: r.user_id,
                full_name,
                status: r.status,
                comment: r.comment,
            }
        })
        .collect();

    let lineup_id = lineup_repo::lineup_for_event(&db, event_id)
        .await?
        .map(|l| l.id);

    Ok(HttpResponse::Ok().json(EventDetail {
        event: EventRow::from(event),
        my_status,
        responses,
        lineup_id,
    }))
}

/// GET /api/dashboard — the next five events with the caller's status and
/// lineup spot for each.
#[get("/dashboard")]
pub async fn dashboard(
    auth: AuthUser,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let now = Utc::now().naive_utc();
    let events = event_repo::upcoming_events(&db, now, 5).await?;

    let mut entries = Vec::with_capacity(events.len());
    for event in events {
        let my_status = response_repo::response_for(&db, auth.user_id, event.id)
            .await?
            .map(|r| r.status);

        let my_assignment = match lineup_repo::lineup_for_event(&db, event.id).await? {
            Some(lineup) => lineup_repo::assignment_for(&db, lineup.id, auth.user_id)
                .await?
                .map(|a| DashboardAssignment {
                    position: a.position,
                    line: a.line,
                }),
            None => None,
        };

        entries.push(DashboardEntry {
            event: EventRow::from(event),
            my_status,
            my_assignment,
        });
    }

    Ok(HttpResponse::Ok().json(entries))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(create_event)
        .service(list_events)
        .service(event_detail)
        .service(dashboard);
}
