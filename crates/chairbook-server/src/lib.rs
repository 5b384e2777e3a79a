pub mod api;
pub mod booking;
pub mod config;
pub mod domain;
pub mod error;
pub mod scheduling;
pub mod store;
pub mod telemetry;

use anyhow::Result;
use axum::Router;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::sync::Arc;

use crate::api::routes;
use crate::config::Config;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
    pub config: Config,
}

pub struct App {
    state: Arc<AppState>,
}

impl App {
    pub fn db(&self) -> &PgPool {
        &self.state.db
    }

    pub async fn new(config: Config) -> Result<Self> {
        let db = PgPoolOptions::new()
            .max_connections(config.db_max_connections)
            .acquire_timeout(config.db_acquire_timeout)
            .connect(&config.database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&db).await?;

        let state = Arc::new(AppState { db, config });

        Ok(Self { state })
    }

    pub fn router(&self) -> Router {
        routes::build(self.state.clone())
    }
}
