use crate::domain::{Actor, Appointment, NotificationCategory, NotificationIntent};
use crate::scheduling::lifecycle::LifecycleEvent;

fn when(appointment: &Appointment) -> String {
    format!(
        "{} at {:02}:{:02}",
        appointment.date.format("%d/%m/%Y"),
        appointment.start_minute / 60,
        appointment.start_minute % 60
    )
}

fn intent(
    recipient_id: uuid::Uuid,
    appointment: &Appointment,
    category: NotificationCategory,
    content: String,
) -> NotificationIntent {
    NotificationIntent {
        recipient_id,
        appointment_id: appointment.id,
        category,
        content,
    }
}

/// The provider always hears about a new booking; a registered client gets
/// a receipt. Guests have no account and are never notified.
pub fn on_created(appointment: &Appointment) -> Vec<NotificationIntent> {
    let mut intents = vec![intent(
        appointment.provider_id,
        appointment,
        NotificationCategory::AppointmentBooked,
        format!("New appointment booked for {}", when(appointment)),
    )];
    if let Some(client_id) = appointment.client_id {
        intents.push(intent(
            client_id,
            appointment,
            NotificationCategory::AppointmentBooked,
            format!("Your appointment on {} is booked", when(appointment)),
        ));
    }
    intents
}

pub fn on_transition(appointment: &Appointment, event: LifecycleEvent) -> Vec<NotificationIntent> {
    match event {
        LifecycleEvent::CancelByClient => vec![intent(
            appointment.provider_id,
            appointment,
            NotificationCategory::AppointmentCancelled,
            format!("The client cancelled the appointment on {}", when(appointment)),
        )],
        LifecycleEvent::CancelByProvider => appointment
            .client_id
            .map(|client_id| {
                intent(
                    client_id,
                    appointment,
                    NotificationCategory::AppointmentCancelled,
                    format!("Your appointment on {} was cancelled", when(appointment)),
                )
            })
            .into_iter()
            .collect(),
        LifecycleEvent::Confirm | LifecycleEvent::Complete => Vec::new(),
    }
}

/// `appointment` is the state after the move.
pub fn on_rescheduled(appointment: &Appointment, actor: Actor) -> Vec<NotificationIntent> {
    let mut intents = Vec::new();
    if let Actor::Client { .. } = actor {
        intents.push(intent(
            appointment.provider_id,
            appointment,
            NotificationCategory::AppointmentRescheduled,
            format!("An appointment was moved to {}", when(appointment)),
        ));
    }
    if let Some(client_id) = appointment.client_id {
        intents.push(intent(
            client_id,
            appointment,
            NotificationCategory::AppointmentRescheduled,
            format!("Your appointment was moved to {}", when(appointment)),
        ));
    }
    intents
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::AppointmentStatus;
    use chrono::{NaiveDate, Utc};
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn appointment(client_id: Option<Uuid>) -> Appointment {
        Appointment {
            id: Uuid::new_v4(),
            idempotency_key: None,
            provider_id: Uuid::new_v4(),
            client_id,
            guest_name: client_id.is_none().then(|| "Walk-in".to_string()),
            date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
            start_minute: 570,
            duration_minutes: 30,
            total_value: Decimal::from(25),
            status: AppointmentStatus::Confirmed,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn recipients(intents: &[NotificationIntent]) -> Vec<Uuid> {
        intents.iter().map(|i| i.recipient_id).collect()
    }

    #[test]
    fn test_create_notifies_provider_and_registered_client() {
        let client = Uuid::new_v4();
        let appt = appointment(Some(client));
        let intents = on_created(&appt);
        assert_eq!(recipients(&intents), [appt.provider_id, client]);
        assert!(intents[0].content.contains("02/11/2026 at 09:30"));
    }

    #[test]
    fn test_guest_booking_only_notifies_provider() {
        let appt = appointment(None);
        assert_eq!(recipients(&on_created(&appt)), [appt.provider_id]);
        assert!(on_transition(&appt, LifecycleEvent::CancelByProvider).is_empty());
        assert!(on_rescheduled(&appt, Actor::Provider { id: appt.provider_id }).is_empty());
    }

    #[test]
    fn test_cancellation_notifies_the_other_party() {
        let client = Uuid::new_v4();
        let appt = appointment(Some(client));
        assert_eq!(recipients(&on_transition(&appt, LifecycleEvent::CancelByClient)), [appt.provider_id]);
        assert_eq!(recipients(&on_transition(&appt, LifecycleEvent::CancelByProvider)), [client]);
        assert!(on_transition(&appt, LifecycleEvent::Confirm).is_empty());
        assert!(on_transition(&appt, LifecycleEvent::Complete).is_empty());
    }

    #[test]
    fn test_reschedule_recipients_depend_on_actor() {
        let client = Uuid::new_v4();
        let appt = appointment(Some(client));
        assert_eq!(
            recipients(&on_rescheduled(&appt, Actor::Provider { id: appt.provider_id })),
            [client]
        );
        assert_eq!(
            recipients(&on_rescheduled(&appt, Actor::Client { id: client })),
            [appt.provider_id, client]
        );
    }
}
