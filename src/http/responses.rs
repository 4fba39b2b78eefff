//! Attendance responses.

use actix_web::{post, web, HttpResponse};
use serde::Deserialize;
use sqlx::SqlitePool;

use crate::db::models::ResponseStatus;
use crate::db::response_repo;
use crate::error::ApiError;
use crate::http::auth::AuthUser;

#[derive(Deserialize)]
pub struct RespondReq {
    pub status: ResponseStatus,
    #[serde(default)]
    pub comment: Option<String>,
}

/// POST /api/events/{id}/response — set or overwrite the caller's own
/// attendance decision. The user id comes from the token, never the body.
#[post("/events/{id}/response")]
pub async fn respond(
    auth: AuthUser,
    path: web::Path<i64>,
    info: web::Json<RespondReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let event_id = path.into_inner();
    let info = info.into_inner();
    let response =
        response_repo::submit_response(&db, auth.user_id, event_id, info.status, info.comment)
            .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "status": response.status,
        "responded_at": response.responded_at,
    })))
}

pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(respond);
}
