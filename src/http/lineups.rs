//! Lineup view and assignment writes.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::lineup_repo;
use crate::db::models::LineupAssignment;
use crate::error::ApiError;
use crate::http::auth::AuthUser;
use crate::http::users::PlayerRow;

//////////////////////////////////////////////////
// Data transfer objects
//////////////////////////////////////////////////

#[derive(Serialize)]
pub struct AssignmentRow {
    pub user_id: i64,
    pub position: String,
    pub line: Option<String>,
    pub jersey_type: Option<String>,
}

impl From<LineupAssignment> for AssignmentRow {
    fn from(a: LineupAssignment) -> Self {
        AssignmentRow {
            user_id: a.user_id,
            position: a.position,
            line: a.line,
            jersey_type: a.jersey_type,
        }
    }
}

#[derive(Serialize)]
pub struct LineupView {
    pub lineup_id: i64,
    pub event_id: i64,
    /// Active players/captains who confirmed attendance, in roster order.
    pub players: Vec<PlayerRow>,
    pub assignments: Vec<AssignmentRow>,
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct AssignReq {
    pub lineup_id: i64,
    pub user_id: i64,
    pub position: String,
    #[serde(default)]
    pub line: String,
    #[serde(default)]
    pub jersey_type: String,
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// GET /api/lineup/{event_id} — open (creating on first view) the lineup
/// for an event. Captains and admins only.
#[get("/lineup/{event_id}")]
pub async fn open_lineup(
    auth: AuthUser,
    path: web::Path<i64>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let event_id = path.into_inner();
    let lineup = lineup_repo::ensure_lineup(&db, auth.caller(), event_id).await?;

    let players: Vec<PlayerRow> = lineup_repo::attending_pool(&db, event_id)
        .await?
        .into_iter()
        .map(PlayerRow::from)
        .collect();

    let assignments: Vec<AssignmentRow> = lineup_repo::assignments(&db, lineup.id)
        .await?
        .into_iter()
        .map(AssignmentRow::from)
        .collect();

    Ok(HttpResponse::Ok().json(LineupView {
        lineup_id: lineup.id,
        event_id: lineup.event_id,
        players,
        assignments,
    }))
}

/// POST /api/lineup/assign — place or move a player. Captains and admins
/// only; rejections write nothing.
#[post("/lineup/assign")]
pub async fn assign(
    auth: AuthUser,
    info: web::Json<AssignReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let info = info.into_inner();
    let assignment = lineup_repo::assign(
        &db,
        auth.caller(),
        info.lineup_id,
        lineup_repo::AssignmentInput {
            user_id: info.user_id,
            position: info.position,
            line: info.line,
            jersey_type: info.jersey_type,
        },
    )
    .await
    .map_err(|e| {
        if matches!(e, ApiError::Validation(_)) {
            log::warn!("assignment rejected: {e}");
        }
        e
    })?;

    Ok(HttpResponse::Ok().json(AssignmentRow::from(assignment)))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(open_lineup).service(assign);
}
