use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Service {
    pub id: Uuid,
    pub provider_id: Uuid,
    pub name: String,
    pub duration_minutes: Option<i32>,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    pub name: String,
    pub duration_minutes: u32,
    #[serde(with = "rust_decimal::serde::str")]
    pub price: Decimal,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ServiceSelectionError {
    #[error("at least one service is required")]
    Empty,

    #[error("service {0} has no duration and no fallback duration is configured")]
    UnknownDuration(Uuid),

    #[error("service {0} has a non-positive duration")]
    NonPositiveDuration(Uuid),
}

/// Summed duration and price of the services attached to one booking.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ServiceTotals {
    pub duration_minutes: u32,
    pub value: Decimal,
}

impl ServiceTotals {
    pub fn from_services(
        services: &[Service],
        fallback_minutes: Option<u32>,
    ) -> Result<Self, ServiceSelectionError> {
        if services.is_empty() {
            return Err(ServiceSelectionError::Empty);
        }

        let mut duration_minutes = 0u32;
        let mut value = Decimal::ZERO;
        for service in services {
            let minutes = match service.duration_minutes {
                Some(m) if m > 0 => m as u32,
                Some(_) => return Err(ServiceSelectionError::NonPositiveDuration(service.id)),
                None => fallback_minutes.ok_or(ServiceSelectionError::UnknownDuration(service.id))?,
            };
            duration_minutes = duration_minutes.saturating_add(minutes);
            value += service.price;
        }

        Ok(Self {
            duration_minutes,
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::prelude::FromPrimitive;

    fn service(duration: Option<i32>, price: f64) -> Service {
        Service {
            id: Uuid::new_v4(),
            provider_id: Uuid::nil(),
            name: "cut".into(),
            duration_minutes: duration,
            price: Decimal::from_f64(price).unwrap(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_totals_sum_durations_and_prices() {
        let totals =
            ServiceTotals::from_services(&[service(Some(30), 25.0), service(Some(15), 10.0)], None)
                .unwrap();
        assert_eq!(totals.duration_minutes, 45);
        assert_eq!(totals.value, Decimal::from(35));
    }

    #[test]
    fn test_unknown_duration_is_an_error_without_fallback() {
        let beard = service(None, 10.0);
        let err = ServiceTotals::from_services(std::slice::from_ref(&beard), None).unwrap_err();
        assert_eq!(err, ServiceSelectionError::UnknownDuration(beard.id));
    }

    #[test]
    fn test_unknown_duration_uses_configured_fallback() {
        let totals = ServiceTotals::from_services(&[service(None, 10.0), service(Some(30), 20.0)], Some(20))
            .unwrap();
        assert_eq!(totals.duration_minutes, 50);
    }

    #[test]
    fn test_empty_selection_is_rejected() {
        assert_eq!(
            ServiceTotals::from_services(&[], Some(30)).unwrap_err(),
            ServiceSelectionError::Empty
        );
    }
}
