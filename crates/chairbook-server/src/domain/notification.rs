use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "varchar", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum NotificationCategory {
    AppointmentBooked,
    AppointmentCancelled,
    AppointmentRescheduled,
}

/// A notification the delivery side should persist and push. Produced by
/// booking transitions; never read back by the scheduling logic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NotificationIntent {
    pub recipient_id: Uuid,
    pub appointment_id: Uuid,
    pub category: NotificationCategory,
    pub content: String,
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Notification {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub appointment_id: Option<Uuid>,
    pub category: NotificationCategory,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub read_at: Option<DateTime<Utc>>,
}
