use crate::domain::{Actor, AppointmentStatus};

/// Tunables for slot generation and booking creation.
///
/// `slot_step_minutes` spaces the offered start times; it has no bearing on
/// how long a booking lasts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchedulingPolicy {
    pub slot_step_minutes: u32,
    pub fallback_service_minutes: Option<u32>,
    pub client_booking_status: AppointmentStatus,
    pub provider_booking_status: AppointmentStatus,
}

impl Default for SchedulingPolicy {
    fn default() -> Self {
        Self {
            slot_step_minutes: 30,
            fallback_service_minutes: None,
            client_booking_status: AppointmentStatus::Confirmed,
            provider_booking_status: AppointmentStatus::Confirmed,
        }
    }
}

impl SchedulingPolicy {
    pub fn initial_status(&self, actor: Actor) -> AppointmentStatus {
        match actor {
            Actor::Client { .. } => self.client_booking_status,
            Actor::Provider { .. } => self.provider_booking_status,
        }
    }
}
