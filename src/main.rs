use std::sync::Arc;

use actix_web::{web, App, HttpServer};
use dotenv::dotenv;
use tracing_subscriber::EnvFilter;

use auth::TokenService;
use errors::AppError;
use store::{memory::MemStore, postgres::PgStore, CatalogStore, IdentityStore};

mod auth;
mod errors;
mod handlers;
mod middlewares;
mod schema;
mod store;
#[cfg(test)]
mod test_init_app;
mod utils;

pub struct AppState {
    pub identity: Arc<dyn IdentityStore>,
    pub catalog: Arc<dyn CatalogStore>,
    pub tokens: TokenService,
}

#[actix_web::main]
async fn main() -> Result<(), AppError> {
    dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let address = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());
    let secret = std::env::var("JWT_SECRET").map_err(|_| AppError::MissingSecret)?;
    let tokens = TokenService::new(&secret);

    let (identity, catalog): (Arc<dyn IdentityStore>, Arc<dyn CatalogStore>) =
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                let store = Arc::new(PgStore::connect(&url).await.map_err(|e| {
                    tracing::error!(error = %e, "failed to set up the database");
                    AppError::DbConnect
                })?);
                (store.clone(), store)
            }
            Err(_) => {
                tracing::warn!("DATABASE_URL not set, using the in-memory store");
                let store = Arc::new(MemStore::new());
                (store.clone(), store)
            }
        };

    let app_data = web::Data::new(AppState {
        identity,
        catalog,
        tokens,
    });

    tracing::info!(%address, "server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(app_data.clone())
            .configure(handlers::configure)
    })
    .bind(&address)
    .map_err(|_e| AppError::SocketBind)?
    .run()
    .await
    .map_err(|_e| AppError::ServerStart)?;

    Ok(())
}
