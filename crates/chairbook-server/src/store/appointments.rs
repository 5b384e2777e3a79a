use std::collections::HashMap;
use std::time::Duration;

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::domain::{Appointment, AppointmentStatus, ClientRef, TimeOfDay};
use crate::error::{AppError, Result};
use crate::scheduling::conflict::OccupiedWindow;

/// Everything needed to write a new appointment row.
#[derive(Debug, Clone)]
pub struct NewAppointment<'a> {
    pub idempotency_key: Option<&'a str>,
    pub provider_id: Uuid,
    pub client: &'a ClientRef,
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub duration_minutes: u32,
    pub total_value: Decimal,
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub provider_id: Option<Uuid>,
    pub client_id: Option<Uuid>,
    pub date: Option<NaiveDate>,
    pub status: Option<AppointmentStatus>,
    pub limit: i64,
    pub offset: i64,
}

/// Bounds how long this transaction waits on row and advisory locks.
pub async fn set_lock_timeout(conn: &mut PgConnection, timeout: Duration) -> Result<()> {
    sqlx::query("SELECT set_config('lock_timeout', $1, true)")
        .bind(format!("{}ms", timeout.as_millis()))
        .execute(&mut *conn)
        .await?;
    Ok(())
}

/// Serializes every writer touching `provider_id`'s calendar on `date` until
/// the surrounding transaction ends.
pub async fn lock_day(conn: &mut PgConnection, provider_id: Uuid, date: NaiveDate) -> Result<()> {
    sqlx::query("SELECT pg_advisory_xact_lock(hashtext($1::text), $2::date - DATE '2000-01-01')")
        .bind(provider_id)
        .bind(date)
        .execute(&mut *conn)
        .await?;
    Ok(())
}

pub async fn occupied_windows(
    conn: &mut PgConnection,
    provider_id: Uuid,
    date: NaiveDate,
) -> Result<Vec<OccupiedWindow>> {
    let rows: Vec<(Uuid, i32, i32)> = sqlx::query_as(
        r#"
        SELECT id, start_minute, duration_minutes FROM appointments
        WHERE provider_id = $1 AND date = $2
          AND status NOT IN ('cancelled_by_client', 'cancelled_by_provider')
        ORDER BY start_minute
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .fetch_all(&mut *conn)
    .await?;

    rows.into_iter()
        .map(|(id, start, duration)| {
            let start = TimeOfDay::try_from(start).map_err(|e| AppError::Internal(e.into()))?;
            Ok(OccupiedWindow::new(id, start, duration as u32))
        })
        .collect()
}

pub async fn find(db: &PgPool, id: Uuid) -> Result<Appointment> {
    sqlx::query_as("SELECT * FROM appointments WHERE id = $1")
        .bind(id)
        .fetch_optional(db)
        .await?
        .ok_or(AppError::AppointmentNotFound(id))
}

pub async fn find_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Appointment> {
    sqlx::query_as("SELECT * FROM appointments WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or(AppError::AppointmentNotFound(id))
}

pub async fn find_by_idempotency_key(db: &PgPool, key: &str) -> Result<Option<Appointment>> {
    let appointment = sqlx::query_as("SELECT * FROM appointments WHERE idempotency_key = $1")
        .bind(key)
        .fetch_optional(db)
        .await?;
    Ok(appointment)
}

/// Inserts the row. Returns the raw sqlx error so callers can tell an
/// idempotency race from other failures.
pub async fn insert(
    conn: &mut PgConnection,
    new: &NewAppointment<'_>,
) -> std::result::Result<Appointment, sqlx::Error> {
    let (client_id, guest_name) = match new.client {
        ClientRef::Registered { id } => (Some(*id), None),
        ClientRef::Guest { name } => (None, Some(name.as_str())),
    };
    let now = Utc::now();

    sqlx::query_as(
        r#"
        INSERT INTO appointments (id, idempotency_key, provider_id, client_id, guest_name, date,
                                  start_minute, duration_minutes, total_value, status, created_at, updated_at)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $11)
        RETURNING *
        "#,
    )
    .bind(Uuid::new_v4())
    .bind(new.idempotency_key)
    .bind(new.provider_id)
    .bind(client_id)
    .bind(guest_name)
    .bind(new.date)
    .bind(i32::from(new.start))
    .bind(new.duration_minutes as i32)
    .bind(new.total_value)
    .bind(new.status)
    .bind(now)
    .fetch_one(&mut *conn)
    .await
}

pub async fn replace_services(conn: &mut PgConnection, appointment_id: Uuid, service_ids: &[Uuid]) -> Result<()> {
    sqlx::query("DELETE FROM appointment_services WHERE appointment_id = $1")
        .bind(appointment_id)
        .execute(&mut *conn)
        .await?;

    for (position, service_id) in service_ids.iter().enumerate() {
        sqlx::query(
            "INSERT INTO appointment_services (appointment_id, service_id, position) VALUES ($1, $2, $3)",
        )
        .bind(appointment_id)
        .bind(service_id)
        .bind(position as i32)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

pub async fn service_ids(db: &PgPool, appointment_id: Uuid) -> Result<Vec<Uuid>> {
    let ids: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT service_id FROM appointment_services WHERE appointment_id = $1 ORDER BY position",
    )
    .bind(appointment_id)
    .fetch_all(db)
    .await?;
    Ok(ids.into_iter().map(|(id,)| id).collect())
}

/// Linked services for many appointments in one round trip, keyed by
/// appointment id and kept in booking order.
pub async fn service_ids_for(db: &PgPool, appointment_ids: &[Uuid]) -> Result<HashMap<Uuid, Vec<Uuid>>> {
    let rows: Vec<(Uuid, Uuid)> = sqlx::query_as(
        r#"
        SELECT appointment_id, service_id FROM appointment_services
        WHERE appointment_id = ANY($1)
        ORDER BY appointment_id, position
        "#,
    )
    .bind(appointment_ids)
    .fetch_all(db)
    .await?;

    let mut linked: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (appointment_id, service_id) in rows {
        linked.entry(appointment_id).or_default().push(service_id);
    }
    Ok(linked)
}

pub async fn list(db: &PgPool, filter: &AppointmentFilter) -> Result<Vec<Appointment>> {
    let appointments = sqlx::query_as(
        r#"
        SELECT * FROM appointments
        WHERE ($1::uuid IS NULL OR provider_id = $1)
          AND ($2::uuid IS NULL OR client_id = $2)
          AND ($3::date IS NULL OR date = $3)
          AND ($4::varchar IS NULL OR status = $4)
        ORDER BY date, start_minute
        LIMIT $5 OFFSET $6
        "#,
    )
    .bind(filter.provider_id)
    .bind(filter.client_id)
    .bind(filter.date)
    .bind(filter.status)
    .bind(filter.limit)
    .bind(filter.offset)
    .fetch_all(db)
    .await?;
    Ok(appointments)
}

pub async fn update_status(
    conn: &mut PgConnection,
    id: Uuid,
    status: AppointmentStatus,
) -> Result<Appointment> {
    let appointment = sqlx::query_as(
        "UPDATE appointments SET status = $1, updated_at = $2 WHERE id = $3 RETURNING *",
    )
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(appointment)
}

/// Moves an appointment to a new provider, date and window, resetting it
/// to `status`.
#[allow(clippy::too_many_arguments)]
pub async fn update_schedule(
    conn: &mut PgConnection,
    id: Uuid,
    provider_id: Uuid,
    date: NaiveDate,
    start: TimeOfDay,
    duration_minutes: u32,
    total_value: Decimal,
    status: AppointmentStatus,
) -> Result<Appointment> {
    let appointment = sqlx::query_as(
        r#"
        UPDATE appointments
        SET provider_id = $1, date = $2, start_minute = $3, duration_minutes = $4,
            total_value = $5, status = $6, updated_at = $7
        WHERE id = $8
        RETURNING *
        "#,
    )
    .bind(provider_id)
    .bind(date)
    .bind(i32::from(start))
    .bind(duration_minutes as i32)
    .bind(total_value)
    .bind(status)
    .bind(Utc::now())
    .bind(id)
    .fetch_one(&mut *conn)
    .await?;
    Ok(appointment)
}

/// Status and value of every appointment a provider has in `[from, to]`.
pub async fn statuses_between(
    db: &PgPool,
    provider_id: Uuid,
    from: NaiveDate,
    to: NaiveDate,
) -> Result<Vec<(AppointmentStatus, Decimal)>> {
    let rows = sqlx::query_as(
        r#"
        SELECT status, total_value FROM appointments
        WHERE provider_id = $1 AND date BETWEEN $2 AND $3
        "#,
    )
    .bind(provider_id)
    .bind(from)
    .bind(to)
    .fetch_all(db)
    .await?;
    Ok(rows)
}
