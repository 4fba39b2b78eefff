//! Runtime configuration for the roster server.

use once_cell::sync::Lazy;
use std::env;

#[derive(Debug)]
pub struct Settings {
    /// Access-token lifetime (minutes).
    pub access_ttl_min: i64,
    /// Username of the bootstrap administrator account.
    pub admin_username: String,
    /// Phone seeded for the bootstrap administrator.
    pub admin_phone: String,
    /// Initial password for the bootstrap administrator.
    pub admin_password: String,
}

impl Settings {
    fn from_env() -> Self {
        let access_ttl_min = env::var("ACCESS_TTL_MIN")
            .ok()
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(60);

        let admin_username = env::var("ADMIN_USERNAME").unwrap_or_else(|_| "admin".into());
        let admin_phone = env::var("ADMIN_PHONE").unwrap_or_else(|_| "+79001234567".into());
        let admin_password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".into());

        Settings {
            access_ttl_min,
            admin_username,
            admin_phone,
            admin_password,
        }
    }
}

static SETTINGS: Lazy<Settings> = Lazy::new(Settings::from_env);

pub fn settings() -> &'static Settings {
    &SETTINGS
}
