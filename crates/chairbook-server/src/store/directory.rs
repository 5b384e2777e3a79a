use chrono::Utc;
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{Client, Provider};
use crate::error::{AppError, Result};

pub async fn insert_provider(db: &PgPool, name: &str) -> Result<Provider> {
    let provider = sqlx::query_as(
        "INSERT INTO providers (id, name, created_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(provider)
}

pub async fn get_provider<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Provider> {
    sqlx::query_as("SELECT * FROM providers WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::ProviderNotFound(id))
}

pub async fn insert_client(db: &PgPool, name: &str) -> Result<Client> {
    let client = sqlx::query_as(
        "INSERT INTO clients (id, name, created_at) VALUES ($1, $2, $3) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(client)
}

pub async fn get_client<'e>(db: impl PgExecutor<'e>, id: Uuid) -> Result<Client> {
    sqlx::query_as("SELECT * FROM clients WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::ClientNotFound(id))
}
