use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::time::{TimeError, TimeOfDay};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Completed,
    CancelledByClient,
    CancelledByProvider,
}

impl AppointmentStatus {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Pending | Self::Confirmed)
    }

    pub fn is_cancelled(self) -> bool {
        matches!(self, Self::CancelledByClient | Self::CancelledByProvider)
    }

    /// Whether the appointment still holds its window on the provider's calendar.
    pub fn occupies_calendar(self) -> bool {
        !self.is_cancelled()
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Confirmed => "confirmed",
            Self::Completed => "completed",
            Self::CancelledByClient => "cancelled_by_client",
            Self::CancelledByProvider => "cancelled_by_provider",
        }
    }
}

impl std::str::FromStr for AppointmentStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "confirmed" => Ok(Self::Confirmed),
            "completed" => Ok(Self::Completed),
            "cancelled_by_client" => Ok(Self::CancelledByClient),
            "cancelled_by_provider" => Ok(Self::CancelledByProvider),
            other => Err(format!("unknown appointment status: {other}")),
        }
    }
}

/// Who the appointment is for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ClientRef {
    Registered { id: Uuid },
    Guest { name: String },
}

impl ClientRef {
    pub fn registered_id(&self) -> Option<Uuid> {
        match self {
            Self::Registered { id } => Some(*id),
            Self::Guest { .. } => None,
        }
    }
}

/// Who is performing an operation. Identity is asserted by the caller;
/// authentication happens upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "snake_case")]
pub enum Actor {
    Client { id: Uuid },
    Provider { id: Uuid },
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub idempotency_key: Option<String>,
    pub provider_id: Uuid,
    pub client_id: Option<Uuid>,
    pub guest_name: Option<String>,
    pub date: NaiveDate,
    pub start_minute: i32,
    pub duration_minutes: i32,
    pub total_value: Decimal,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Appointment {
    pub fn client(&self) -> ClientRef {
        match (self.client_id, &self.guest_name) {
            (Some(id), _) => ClientRef::Registered { id },
            (None, name) => ClientRef::Guest {
                name: name.clone().unwrap_or_default(),
            },
        }
    }

    pub fn start_time(&self) -> Result<TimeOfDay, TimeError> {
        TimeOfDay::try_from(self.start_minute)
    }
}

/// A booking the caller is about to commit. Built up client-side while the
/// user picks provider, services and slot, then submitted as a whole.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookingDraft {
    pub provider_id: Uuid,
    pub client: ClientRef,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct CreateAppointmentRequest {
    pub actor: Actor,
    #[serde(flatten)]
    pub draft: BookingDraft,
}

#[derive(Debug, Deserialize)]
pub struct TransitionRequest {
    pub actor: Actor,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleRequest {
    pub actor: Actor,
    pub provider_id: Option<Uuid>,
    pub date: NaiveDate,
    pub start_time: TimeOfDay,
    pub service_ids: Vec<Uuid>,
}

#[derive(Debug, Serialize)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub client: ClientRef,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
    pub duration_minutes: i32,
    #[serde(with = "rust_decimal::serde::str")]
    pub total_value: Decimal,
    pub status: AppointmentStatus,
    pub service_ids: Vec<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl AppointmentResponse {
    pub fn new(appointment: Appointment, service_ids: Vec<Uuid>) -> Self {
        let end = appointment.start_minute + appointment.duration_minutes;
        Self {
            id: appointment.id,
            provider_id: appointment.provider_id,
            client: appointment.client(),
            date: appointment.date,
            start_time: format_minutes(appointment.start_minute),
            end_time: format_minutes(end),
            duration_minutes: appointment.duration_minutes,
            total_value: appointment.total_value,
            status: appointment.status,
            service_ids,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        }
    }
}

// End times may land exactly on midnight, which TimeOfDay cannot hold.
fn format_minutes(minutes: i32) -> String {
    format!("{:02}:{:02}", minutes / 60, minutes % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_round_trips_through_strings() {
        for status in [
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Completed,
            AppointmentStatus::CancelledByClient,
            AppointmentStatus::CancelledByProvider,
        ] {
            assert_eq!(status.as_str().parse::<AppointmentStatus>().unwrap(), status);
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                json!(status.as_str())
            );
        }
    }

    #[test]
    fn test_only_pending_and_confirmed_are_open() {
        assert!(!AppointmentStatus::Pending.is_terminal());
        assert!(!AppointmentStatus::Confirmed.is_terminal());
        assert!(AppointmentStatus::Completed.is_terminal());
        assert!(AppointmentStatus::CancelledByClient.is_terminal());
        assert!(AppointmentStatus::CancelledByProvider.is_terminal());
        assert!(AppointmentStatus::Completed.occupies_calendar());
        assert!(!AppointmentStatus::CancelledByProvider.occupies_calendar());
    }

    #[test]
    fn test_create_request_flattens_the_draft() {
        let provider = Uuid::new_v4();
        let req: CreateAppointmentRequest = serde_json::from_value(json!({
            "actor": { "role": "provider", "id": provider },
            "provider_id": provider,
            "client": { "kind": "guest", "name": "Walk-in" },
            "date": "2026-11-02",
            "start_time": "10:00",
            "service_ids": [Uuid::new_v4()]
        }))
        .unwrap();

        assert_eq!(req.actor, Actor::Provider { id: provider });
        assert_eq!(req.draft.client, ClientRef::Guest { name: "Walk-in".into() });
        assert_eq!(req.draft.start_time.minutes(), 600);
    }

    #[test]
    fn test_end_time_may_reach_midnight() {
        assert_eq!(format_minutes(1440), "24:00");
        assert_eq!(format_minutes(630), "10:30");
    }
}
