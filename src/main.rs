extern crate actix_files;
extern crate actix_web;
extern crate base64;
extern crate chrono;
extern crate dotenv;
extern crate env_logger;
extern crate futures;
extern crate jsonwebtoken;
extern crate serde;
extern crate serde_json;
extern crate sqlx;
extern crate thiserror;
extern crate tokio;

mod config;
mod context;
mod core;
mod database;
mod error;
mod handlers;
mod impls;
mod middlewares;
pub mod request;
pub mod response;

use actix_files::Files;
use actix_web::web::{delete, get, post, put, scope, Data, JsonConfig};
use actix_web::HttpServer;
use anyhow::Context;
use sqlx::postgres::PgPoolOptions;

use crate::config::Config;
use crate::core::services::image::ImageIngestor;
use crate::database::postgres::PgSqlxManager;
use crate::impls::storer::local_storage::LocalStorer;
use crate::middlewares::jwt::JWTMiddleware;

// Inline images travel inside the JSON body.
const MAX_BODY_BYTES: usize = 16 * 1024 * 1024;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let config = Config::from_env().context("failed to load configuration")?;
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    sqlx::migrate!("./migrations").run(&pool).await.context("failed to run migrations")?;

    let images = ImageIngestor::new(LocalStorer::new(&config.public_path));
    images.prepare()?;
    let image_dir = config.public_path.join(images.dir());
    log::info!("serving images from {}", image_dir.display());

    let manager = Data::new(PgSqlxManager::new(pool));
    let images = Data::new(images);
    let secret = config.jwt_secret.as_bytes().to_owned();
    let bind = (config.bind_address.clone(), config.port);
    let config = Data::new(config);
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(manager.clone())
            .app_data(images.clone())
            .app_data(config.clone())
            .app_data(JsonConfig::default().limit(MAX_BODY_BYTES))
            .service(Files::new("/images", image_dir.clone()))
            .service(
                scope("/api").wrap(JWTMiddleware::new(secret.clone())).service(
                    scope("/survey")
                        .route("", get().to(handlers::survey::list))
                        .route("", post().to(handlers::survey::create))
                        .route("/{survey_id}", get().to(handlers::survey::detail))
                        .route("/{survey_id}", put().to(handlers::survey::update))
                        .route("/{survey_id}", delete().to(handlers::survey::delete)),
                ),
            )
    })
    .bind(bind)?
    .run()
    .await?;
    Ok(())
}
