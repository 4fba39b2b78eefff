//! Profile, roster listing and the admin panel.

use actix_web::{get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::db::models::{Role, User};
use crate::db::user_repo;
use crate::error::ApiError;
use crate::http::auth::AuthUser;

//////////////////////////////////////////////////
// Data transfer objects
//////////////////////////////////////////////////

#[derive(Serialize)]
pub struct ProfileRow {
    pub id: i64,
    pub username: String,
    pub phone: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub full_name: String,
    pub role: Role,
    pub position: Option<String>,
    pub number: Option<i64>,
    pub is_active: bool,
}

impl From<User> for ProfileRow {
    fn from(u: User) -> Self {
        let full_name = u.full_name();
        ProfileRow {
            id: u.id,
            username: u.username,
            phone: u.phone,
            first_name: u.first_name,
            last_name: u.last_name,
            full_name,
            role: u.role,
            position: u.position,
            number: u.number,
            is_active: u.is_active,
        }
    }
}

#[derive(Serialize)]
pub struct PlayerRow {
    pub id: i64,
    pub full_name: String,
    pub role: Role,
    pub position: Option<String>,
    pub number: Option<i64>,
}

impl From<User> for PlayerRow {
    fn from(u: User) -> Self {
        PlayerRow {
            id: u.id,
            full_name: u.full_name(),
            role: u.role,
            position: u.position,
            number: u.number,
        }
    }
}

//////////////////////////////////////////////////
// Requests
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct UpdateProfileReq {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub position: Option<String>,
    pub number: Option<i64>,
}

#[derive(Deserialize)]
pub struct SetRoleReq {
    pub user_id: i64,
    pub role: Role,
}

#[derive(Deserialize)]
pub struct SetActiveReq {
    pub user_id: i64,
    pub active: bool,
}

//////////////////////////////////////////////////
// Handlers
//////////////////////////////////////////////////

/// GET /api/profile
#[get("/profile")]
pub async fn profile(auth: AuthUser, db: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let user = user_repo::get_user(&db, auth.user_id).await?;
    Ok(HttpResponse::Ok().json(ProfileRow::from(user)))
}

/// POST /api/profile
#[post("/profile")]
pub async fn update_profile(
    auth: AuthUser,
    info: web::Json<UpdateProfileReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let info = info.into_inner();
    user_repo::update_profile(
        &db,
        auth.user_id,
        info.first_name,
        info.last_name,
        info.position,
        info.number,
    )
    .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// GET /api/players — the active roster, ordered by name.
#[get("/players")]
pub async fn players(_auth: AuthUser, db: web::Data<SqlitePool>) -> Result<HttpResponse, ApiError> {
    let rows: Vec<PlayerRow> = user_repo::list_active_roster(&db)
        .await?
        .into_iter()
        .map(PlayerRow::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// GET /api/admin/users
#[get("/admin/users")]
pub async fn admin_users(
    auth: AuthUser,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let rows: Vec<ProfileRow> = user_repo::list_all(&db, auth.caller())
        .await?
        .into_iter()
        .map(ProfileRow::from)
        .collect();
    Ok(HttpResponse::Ok().json(rows))
}

/// POST /api/admin/role
#[post("/admin/role")]
pub async fn set_role(
    auth: AuthUser,
    info: web::Json<SetRoleReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    user_repo::set_role(&db, auth.caller(), info.user_id, info.role).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

/// POST /api/admin/active
#[post("/admin/active")]
pub async fn set_active(
    auth: AuthUser,
    info: web::Json<SetActiveReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    user_repo::set_active(&db, auth.caller(), info.user_id, info.active).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(profile)
        .service(update_profile)
        .service(players)
        .service(admin_users)
        .service(set_role)
        .service(set_active);
}
