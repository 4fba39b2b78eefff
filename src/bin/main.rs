use actix_web::{middleware::Logger, web, App, HttpServer};
use roster_server::db::user_repo;
use roster_server::{db, http, metrics};
use std::env;

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    // Configuration
    let database_url =
        env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://roster.db".into());
    let server_addr = env::var("SERVER_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".into());

    // SQLite pool + schema
    let db_pool = db::connect(&database_url)
        .await
        .expect("Failed to open database");
    db::init_schema(&db_pool)
        .await
        .expect("Failed to initialise schema");

    // Seed the default admin account on first run
    user_repo::bootstrap_admin(&db_pool)
        .await
        .expect("Failed to bootstrap admin account");

    log::info!("listening on {server_addr}");

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .wrap(metrics::METRICS.clone())
            .app_data(web::Data::new(db_pool.clone()))
            .configure(http::routes::init_routes)
    })
    .bind(&server_addr)?
    .run()
    .await
}
