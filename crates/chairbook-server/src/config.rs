use anyhow::{bail, Context, Result};
use std::env;
use std::time::Duration;

use crate::domain::AppointmentStatus;
use crate::scheduling::SchedulingPolicy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub bind_address: String,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
    pub db_lock_timeout: Duration,
    pub otlp_endpoint: Option<String>,
    pub scheduling: SchedulingPolicy,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL required")?,
            bind_address: env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8080".into()),
            db_max_connections: env::var("DB_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "20".into())
                .parse()?,
            db_acquire_timeout: Duration::from_secs(
                env::var("DB_ACQUIRE_TIMEOUT_SECS")
                    .unwrap_or_else(|_| "5".into())
                    .parse()?,
            ),
            db_lock_timeout: Duration::from_millis(
                env::var("DB_LOCK_TIMEOUT_MS")
                    .unwrap_or_else(|_| "5000".into())
                    .parse()?,
            ),
            otlp_endpoint: env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok(),
            scheduling: scheduling_from_env()?,
        })
    }
}

fn scheduling_from_env() -> Result<SchedulingPolicy> {
    let slot_step_minutes: u32 = env::var("SLOT_STEP_MINUTES")
        .unwrap_or_else(|_| "30".into())
        .parse()
        .context("SLOT_STEP_MINUTES must be a number of minutes")?;
    if slot_step_minutes == 0 {
        bail!("SLOT_STEP_MINUTES must be positive");
    }

    let fallback_service_minutes = match env::var("FALLBACK_SERVICE_MINUTES") {
        Ok(raw) => {
            let minutes: u32 = raw
                .parse()
                .context("FALLBACK_SERVICE_MINUTES must be a number of minutes")?;
            if minutes == 0 {
                bail!("FALLBACK_SERVICE_MINUTES must be positive");
            }
            Some(minutes)
        }
        Err(_) => None,
    };

    Ok(SchedulingPolicy {
        slot_step_minutes,
        fallback_service_minutes,
        client_booking_status: initial_status("CLIENT_BOOKING_STATUS")?,
        provider_booking_status: initial_status("PROVIDER_BOOKING_STATUS")?,
    })
}

fn initial_status(var: &str) -> Result<AppointmentStatus> {
    let raw = env::var(var).unwrap_or_else(|_| "confirmed".into());
    match raw.parse::<AppointmentStatus>() {
        Ok(status @ (AppointmentStatus::Pending | AppointmentStatus::Confirmed)) => Ok(status),
        _ => bail!("{var} must be `pending` or `confirmed`, got `{raw}`"),
    }
}
