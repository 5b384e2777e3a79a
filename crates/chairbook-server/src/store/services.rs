use std::collections::HashMap;

use chrono::Utc;
use sqlx::PgConnection;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::{CreateServiceRequest, Service};
use crate::error::{AppError, Result};

pub async fn insert(db: &PgPool, provider_id: Uuid, req: &CreateServiceRequest) -> Result<Service> {
    let service = sqlx::query_as(
        r#"
        INSERT INTO services (id, provider_id, name, duration_minutes, price, created_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(provider_id)
    .bind(&req.name)
    .bind(req.duration_minutes as i32)
    .bind(req.price)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(service)
}

pub async fn list_for_provider(db: &PgPool, provider_id: Uuid) -> Result<Vec<Service>> {
    let services = sqlx::query_as("SELECT * FROM services WHERE provider_id = $1 ORDER BY name")
        .bind(provider_id)
        .fetch_all(db)
        .await?;
    Ok(services)
}

/// Resolves `ids` against the provider's catalogue, keeping the requested
/// order. An id that is unknown or belongs to another provider is an error.
pub async fn select(conn: &mut PgConnection, provider_id: Uuid, ids: &[Uuid]) -> Result<Vec<Service>> {
    let found: Vec<Service> =
        sqlx::query_as("SELECT * FROM services WHERE provider_id = $1 AND id = ANY($2)")
            .bind(provider_id)
            .bind(ids)
            .fetch_all(&mut *conn)
            .await?;

    let by_id: HashMap<Uuid, Service> = found.into_iter().map(|s| (s.id, s)).collect();
    ids.iter()
        .map(|id| by_id.get(id).cloned().ok_or(AppError::ServiceNotFound(*id)))
        .collect()
}
