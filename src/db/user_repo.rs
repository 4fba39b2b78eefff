//! Identity store: accounts, credentials, roles, roster attributes.

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::Utc;
use sqlx::SqlitePool;

use crate::config::settings;
use crate::db::models::{Caller, Role, User};
use crate::error::ApiError;

pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| ApiError::Internal(anyhow::anyhow!("password hashing failed: {e}")))
}

pub fn verify_password(hash: &str, password: &str) -> bool {
    PasswordHash::new(hash)
        .map(|parsed| {
            Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok()
        })
        .unwrap_or(false)
}

/// Register a new account with the default `player` role. Fails `Conflict`
/// when the username or phone is already taken.
pub async fn create_user(
    db: &SqlitePool,
    username: &str,
    phone: &str,
    password: &str,
) -> Result<User, ApiError> {
    if username.trim().is_empty() || phone.trim().is_empty() || password.is_empty() {
        return Err(ApiError::Validation(
            "username, phone and password are required".into(),
        ));
    }

    let hash = hash_password(password)?;
    let res = sqlx::query(
        "INSERT INTO users (username, phone, password_hash, created_at)
         VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(username)
    .bind(phone)
    .bind(&hash)
    .bind(Utc::now())
    .execute(db)
    .await;

    match res {
        Ok(done) => get_user(db, done.last_insert_rowid()).await,
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            let field = if db_err.message().contains("username") {
                "username"
            } else {
                "phone"
            };
            Err(ApiError::Conflict(format!("{field} already registered")))
        }
        Err(e) => Err(e.into()),
    }
}

/// Verify credentials. Deactivated accounts may not log in.
pub async fn authenticate(
    db: &SqlitePool,
    username: &str,
    password: &str,
) -> Result<User, ApiError> {
    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("invalid username or password".into()))?;

    if !user.is_active {
        return Err(ApiError::Unauthorized("account is deactivated".into()));
    }
    if !verify_password(&user.password_hash, password) {
        return Err(ApiError::Unauthorized("invalid username or password".into()));
    }
    Ok(user)
}

pub async fn get_user(db: &SqlitePool, id: i64) -> Result<User, ApiError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or_else(|| ApiError::NotFound("user not found".into()))
}

fn blank_to_null(v: Option<String>) -> Option<String> {
    v.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// Update the caller's own roster attributes. Blank strings are stored as
/// NULL so the ordering and display-name rules see them as absent.
pub async fn update_profile(
    db: &SqlitePool,
    user_id: i64,
    first_name: Option<String>,
    last_name: Option<String>,
    position: Option<String>,
    number: Option<i64>,
) -> Result<(), ApiError> {
    let rows = sqlx::query(
        "UPDATE users
            SET first_name = ?1, last_name = ?2, position = ?3, number = ?4
          WHERE id = ?5",
    )
    .bind(blank_to_null(first_name))
    .bind(blank_to_null(last_name))
    .bind(blank_to_null(position))
    .bind(number)
    .bind(user_id)
    .execute(db)
    .await?
    .rows_affected();

    if rows == 0 {
        Err(ApiError::NotFound("user not found".into()))
    } else {
        Ok(())
    }
}

/// Change another user's role. Admin only.
pub async fn set_role(
    db: &SqlitePool,
    caller: Caller,
    target_user_id: i64,
    role: Role,
) -> Result<(), ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::PermissionDenied(
            "only admins may change roles".into(),
        ));
    }

    let rows = sqlx::query("UPDATE users SET role = ?1 WHERE id = ?2")
        .bind(role)
        .bind(target_user_id)
        .execute(db)
        .await?
        .rows_affected();

    if rows == 0 {
        Err(ApiError::NotFound("user not found".into()))
    } else {
        log::info!("role of user {target_user_id} set to {role:?} by {}", caller.user_id);
        Ok(())
    }
}

/// Activate or deactivate an account. Admin only; accounts are never
/// hard-deleted.
pub async fn set_active(
    db: &SqlitePool,
    caller: Caller,
    target_user_id: i64,
    active: bool,
) -> Result<(), ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::PermissionDenied(
            "only admins may deactivate accounts".into(),
        ));
    }

    let rows = sqlx::query("UPDATE users SET is_active = ?1 WHERE id = ?2")
        .bind(active)
        .bind(target_user_id)
        .execute(db)
        .await?
        .rows_affected();

    if rows == 0 {
        Err(ApiError::NotFound("user not found".into()))
    } else {
        Ok(())
    }
}

/// Active roster (players + captains), ordered by last name then first name,
/// id as the tiebreak. Rows without names sort ahead on the missing field.
pub async fn list_active_roster(db: &SqlitePool) -> Result<Vec<User>, ApiError> {
    let users = sqlx::query_as::<_, User>(
        "SELECT * FROM users
          WHERE is_active = 1 AND role IN ('player', 'captain')
          ORDER BY last_name ASC, first_name ASC, id ASC",
    )
    .fetch_all(db)
    .await?;
    Ok(users)
}

/// Every account, for the admin panel. Admin only.
pub async fn list_all(db: &SqlitePool, caller: Caller) -> Result<Vec<User>, ApiError> {
    if caller.role != Role::Admin {
        return Err(ApiError::PermissionDenied("admin access required".into()));
    }
    let users = sqlx::query_as::<_, User>("SELECT * FROM users ORDER BY id ASC")
        .fetch_all(db)
        .await?;
    Ok(users)
}

/// Seed the default administrator account if it does not exist yet.
pub async fn bootstrap_admin(db: &SqlitePool) -> Result<(), ApiError> {
    let cfg = settings();
    let exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)")
            .bind(&cfg.admin_username)
            .fetch_one(db)
            .await?;
    if exists {
        return Ok(());
    }

    let hash = hash_password(&cfg.admin_password)?;
    sqlx::query(
        "INSERT INTO users (username, phone, password_hash, role, created_at)
         VALUES (?1, ?2, ?3, 'admin', ?4)",
    )
    .bind(&cfg.admin_username)
    .bind(&cfg.admin_phone)
    .bind(&hash)
    .bind(Utc::now())
    .execute(db)
    .await?;

    log::info!("bootstrap admin account '{}' created", cfg.admin_username);
    Ok(())
}
