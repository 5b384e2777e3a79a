use chrono::{NaiveDate, Utc};
use sqlx::{PgConnection, PgExecutor, PgPool};
use uuid::Uuid;

use crate::domain::{BlockedDay, IntervalRow, WorkingHour, WorkingHourRow};
use crate::error::{AppError, Result};

pub async fn working_hour_for(
    conn: &mut PgConnection,
    provider_id: Uuid,
    weekday: u8,
) -> Result<Option<WorkingHour>> {
    let row: Option<WorkingHourRow> =
        sqlx::query_as("SELECT * FROM working_hours WHERE provider_id = $1 AND weekday = $2")
            .bind(provider_id)
            .bind(i16::from(weekday))
            .fetch_optional(&mut *conn)
            .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let intervals: Vec<IntervalRow> = sqlx::query_as(
        r#"
        SELECT weekday, start_minute, end_minute FROM working_intervals
        WHERE provider_id = $1 AND weekday = $2
        ORDER BY start_minute
        "#,
    )
    .bind(provider_id)
    .bind(i16::from(weekday))
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(WorkingHour::from_rows(row, &intervals)?))
}

pub async fn list_working_hours(db: &PgPool, provider_id: Uuid) -> Result<Vec<WorkingHour>> {
    let rows: Vec<WorkingHourRow> =
        sqlx::query_as("SELECT * FROM working_hours WHERE provider_id = $1 ORDER BY weekday")
            .bind(provider_id)
            .fetch_all(db)
            .await?;

    let intervals: Vec<IntervalRow> = sqlx::query_as(
        r#"
        SELECT weekday, start_minute, end_minute FROM working_intervals
        WHERE provider_id = $1
        ORDER BY weekday, start_minute
        "#,
    )
    .bind(provider_id)
    .fetch_all(db)
    .await?;

    rows.into_iter()
        .map(|row| WorkingHour::from_rows(row, &intervals).map_err(AppError::from))
        .collect()
}

/// Replaces the weekday's window and its whole interval list.
pub async fn upsert_working_hour(conn: &mut PgConnection, working_hour: &WorkingHour) -> Result<()> {
    let weekday = i16::from(working_hour.weekday);

    sqlx::query(
        r#"
        INSERT INTO working_hours (provider_id, weekday, active, start_minute, end_minute, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6)
        ON CONFLICT (provider_id, weekday)
        DO UPDATE SET active = $3, start_minute = $4, end_minute = $5, updated_at = $6
        "#,
    )
    .bind(working_hour.provider_id)
    .bind(weekday)
    .bind(working_hour.active)
    .bind(i32::from(working_hour.start_time))
    .bind(i32::from(working_hour.end_time))
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;

    sqlx::query("DELETE FROM working_intervals WHERE provider_id = $1 AND weekday = $2")
        .bind(working_hour.provider_id)
        .bind(weekday)
        .execute(&mut *conn)
        .await?;

    for (position, interval) in working_hour.intervals.iter().enumerate() {
        sqlx::query(
            r#"
            INSERT INTO working_intervals (provider_id, weekday, position, start_minute, end_minute)
            VALUES ($1, $2, $3, $4, $5)
            "#,
        )
        .bind(working_hour.provider_id)
        .bind(weekday)
        .bind(position as i32)
        .bind(i32::from(interval.start))
        .bind(i32::from(interval.end))
        .execute(&mut *conn)
        .await?;
    }

    Ok(())
}

pub async fn blocked_days_on<'e>(
    db: impl PgExecutor<'e>,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<BlockedDay>> {
    let days = sqlx::query_as("SELECT * FROM blocked_days WHERE provider_id = $1 AND date = $2")
        .bind(provider_id)
        .bind(date)
        .fetch_all(db)
        .await?;
    Ok(days)
}

pub async fn list_blocked_days(
    db: &PgPool,
    provider_id: Uuid,
    from: Option<NaiveDate>,
) -> Result<Vec<BlockedDay>> {
    let days = sqlx::query_as(
        r#"
        SELECT * FROM blocked_days
        WHERE provider_id = $1 AND ($2::date IS NULL OR date >= $2)
        ORDER BY date
        "#,
    )
    .bind(provider_id)
    .bind(from)
    .fetch_all(db)
    .await?;
    Ok(days)
}

/// Blocking an already blocked date keeps the original row and updates its reason.
pub async fn insert_blocked_day(
    db: &PgPool,
    provider_id: Uuid,
    date: NaiveDate,
    reason: Option<&str>,
) -> Result<BlockedDay> {
    let day = sqlx::query_as(
        r#"
        INSERT INTO blocked_days (id, provider_id, date, reason, created_at)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (provider_id, date) DO UPDATE SET reason = EXCLUDED.reason
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(provider_id)
    .bind(date)
    .bind(reason)
    .bind(Utc::now())
    .fetch_one(db)
    .await?;
    Ok(day)
}

pub async fn delete_blocked_day(db: &PgPool, provider_id: Uuid, date: NaiveDate) -> Result<bool> {
    let result = sqlx::query("DELETE FROM blocked_days WHERE provider_id = $1 AND date = $2")
        .bind(provider_id)
        .bind(date)
        .execute(db)
        .await?;
    Ok(result.rows_affected() > 0)
}
