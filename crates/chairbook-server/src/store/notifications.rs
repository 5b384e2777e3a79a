use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{Notification, NotificationIntent};
use crate::error::{AppError, Result};

/// Persists intents in the caller's transaction so they commit or roll back
/// with the booking change that produced them.
pub async fn enqueue(conn: &mut PgConnection, intents: &[NotificationIntent]) -> Result<()> {
    let now = Utc::now();
    for intent in intents {
        sqlx::query(
            r#"
            INSERT INTO notifications (id, recipient_id, appointment_id, category, content, created_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(intent.recipient_id)
        .bind(intent.appointment_id)
        .bind(intent.category)
        .bind(&intent.content)
        .bind(now)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn list(
    db: &PgPool,
    recipient_id: Uuid,
    unread_only: bool,
    limit: i64,
    offset: i64,
) -> Result<Vec<Notification>> {
    let notifications = sqlx::query_as(
        r#"
        SELECT * FROM notifications
        WHERE recipient_id = $1 AND (NOT $2 OR read_at IS NULL)
        ORDER BY created_at DESC
        LIMIT $3 OFFSET $4
        "#,
    )
    .bind(recipient_id)
    .bind(unread_only)
    .bind(limit)
    .bind(offset)
    .fetch_all(db)
    .await?;
    Ok(notifications)
}

pub async fn mark_read(db: &PgPool, id: Uuid, recipient_id: Uuid) -> Result<Notification> {
    sqlx::query_as(
        r#"
        UPDATE notifications SET read_at = COALESCE(read_at, $1)
        WHERE id = $2 AND recipient_id = $3
        RETURNING *
        "#,
    )
    .bind(Utc::now())
    .bind(id)
    .bind(recipient_id)
    .fetch_optional(db)
    .await?
    .ok_or_else(|| AppError::NotFound(format!("notification {id}")))
}
