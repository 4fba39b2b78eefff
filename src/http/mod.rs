pub mod auth;
pub mod events;
pub mod health;
pub mod lineups;
pub mod responses;
pub mod routes;
pub mod users;
