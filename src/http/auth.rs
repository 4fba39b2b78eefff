//! Registration, login and the bearer-token extractor.

use actix_web::{post, web, HttpResponse};
use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use std::env;

use crate::config::settings;
use crate::db::models::{Role, User};
use crate::db::user_repo;
use crate::error::ApiError;

//////////////////////////////////////////////////
// Data structs
//////////////////////////////////////////////////

#[derive(Deserialize)]
pub struct RegisterReq {
    pub username: String,
    pub phone: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginReq {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Claims {
    sub: String, // user id
    role: Role,
    exp: usize,
}

#[derive(Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub expires_in: i64,
}

//////////////////////////////////////////////////
// ─────────────  AuthUser extractor  ─────────────
//////////////////////////////////////////////////

pub mod extractor {
    use super::Claims;
    use crate::db::models::{Caller, Role};
    use actix_web::{
        dev::Payload, error::ErrorUnauthorized, FromRequest, HttpRequest, Result as ActixResult,
    };
    use futures_util::future::{ready, Ready};
    use jsonwebtoken::{decode, DecodingKey, Validation};
    use std::env;

    /// Extracts and validates a Bearer-JWT, exposing the caller's id & role.
    #[derive(Debug, Clone, Copy)]
    pub struct AuthUser {
        pub user_id: i64,
        pub role: Role,
    }

    impl AuthUser {
        pub fn caller(&self) -> Caller {
            Caller {
                user_id: self.user_id,
                role: self.role,
            }
        }
    }

    impl FromRequest for AuthUser {
        type Error = actix_web::Error;
        type Future = Ready<ActixResult<Self, Self::Error>>;

        fn from_request(req: &HttpRequest, _pl: &mut Payload) -> Self::Future {
            let res = (|| {
                // Expect:  Authorization: Bearer <JWT>
                let hdr = req
                    .headers()
                    .get("Authorization")
                    .and_then(|v| v.to_str().ok())
                    .ok_or_else(|| ErrorUnauthorized("missing Authorization header"))?;

                let token = hdr
                    .strip_prefix("Bearer ")
                    .ok_or_else(|| ErrorUnauthorized("malformed Authorization header"))?;

                let secret =
                    env::var("JWT_SECRET").map_err(|_| ErrorUnauthorized("server mis-config"))?;
                let data = decode::<Claims>(
                    token,
                    &DecodingKey::from_secret(secret.as_bytes()),
                    &Validation::default(),
                )
                .map_err(|_| ErrorUnauthorized("invalid / expired token"))?;

                let user_id = data
                    .claims
                    .sub
                    .parse::<i64>()
                    .map_err(|_| ErrorUnauthorized("bad sub"))?;

                Ok(AuthUser {
                    user_id,
                    role: data.claims.role,
                })
            })();

            ready(res)
        }
    }
}
pub use extractor::AuthUser;

fn issue_token(user: &User) -> Result<TokenResponse, ApiError> {
    let secret = env::var("JWT_SECRET")
        .map_err(|_| ApiError::Internal(anyhow::anyhow!("JWT_SECRET must be set")))?;
    let ttl = settings().access_ttl_min;
    let exp = (Utc::now() + Duration::minutes(ttl)).timestamp() as usize;

    let claims = Claims {
        sub: user.id.to_string(),
        role: user.role,
        exp,
    };
    let access_token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(anyhow::anyhow!("JWT encode failed: {e}")))?;

    Ok(TokenResponse {
        access_token,
        expires_in: ttl * 60,
    })
}

//////////////////////////////////////////////////
// POST /api/auth/register
//////////////////////////////////////////////////
#[post("/auth/register")]
pub async fn register(
    info: web::Json<RegisterReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let user = user_repo::create_user(&db, &info.username, &info.phone, &info.password).await?;
    log::info!("user '{}' registered (id {})", user.username, user.id);
    Ok(HttpResponse::Ok().json(serde_json::json!({ "user_id": user.id })))
}

//////////////////////////////////////////////////
// POST /api/auth/login
//////////////////////////////////////////////////
#[post("/auth/login")]
pub async fn login(
    info: web::Json<LoginReq>,
    db: web::Data<SqlitePool>,
) -> Result<HttpResponse, ApiError> {
    let user = user_repo::authenticate(&db, &info.username, &info.password).await?;
    let token = issue_token(&user)?;
    Ok(HttpResponse::Ok().json(token))
}

//////////////////////////////////////////////////
// Mount
//////////////////////////////////////////////////
pub fn init_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(register).service(login);
}
