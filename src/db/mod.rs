pub mod event_repo;
pub mod lineup_repo;
pub mod models;
pub mod response_repo;
pub mod user_repo;

use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS users (
    id            INTEGER PRIMARY KEY AUTOINCREMENT,
    username      TEXT    NOT NULL UNIQUE,
    phone         TEXT    NOT NULL UNIQUE,
    password_hash TEXT    NOT NULL,
    first_name    TEXT,
    last_name     TEXT,
    role          TEXT    NOT NULL DEFAULT 'player',
    position      TEXT,
    number        INTEGER,
    is_active     INTEGER NOT NULL DEFAULT 1,
    created_at    TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS events (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    title       TEXT    NOT NULL,
    description TEXT,
    event_type  TEXT    NOT NULL,
    datetime    TEXT    NOT NULL,
    location    TEXT,
    opponent    TEXT,
    created_by  INTEGER NOT NULL REFERENCES users(id),
    created_at  TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS event_responses (
    id           INTEGER PRIMARY KEY AUTOINCREMENT,
    user_id      INTEGER NOT NULL REFERENCES users(id),
    event_id     INTEGER NOT NULL REFERENCES events(id),
    status       TEXT    NOT NULL,
    comment      TEXT,
    responded_at TEXT    NOT NULL,
    UNIQUE (user_id, event_id)
);

CREATE TABLE IF NOT EXISTS lineups (
    id         INTEGER PRIMARY KEY AUTOINCREMENT,
    event_id   INTEGER NOT NULL UNIQUE REFERENCES events(id),
    created_by INTEGER NOT NULL REFERENCES users(id),
    created_at TEXT    NOT NULL
);

CREATE TABLE IF NOT EXISTS lineup_assignments (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    lineup_id   INTEGER NOT NULL REFERENCES lineups(id),
    user_id     INTEGER NOT NULL REFERENCES users(id),
    position    TEXT    NOT NULL,
    line        TEXT,
    jersey_type TEXT,
    created_at  TEXT    NOT NULL,
    UNIQUE (lineup_id, user_id)
);
"#;

/// Open (and create if missing) the SQLite database behind `database_url`.
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let opts = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect_with(opts)
        .await?;
    Ok(pool)
}

/// Create all tables. Idempotent; the UNIQUE indexes declared here are the
/// source of truth for the one-lineup-per-event and one-response-per-pair
/// invariants.
pub async fn init_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::raw_sql(SCHEMA).execute(pool).await?;
    Ok(())
}
