use rust_decimal::Decimal;
use serde::Serialize;

use crate::domain::AppointmentStatus;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EarningsSummary {
    pub scheduled_count: u64,
    pub completed_count: u64,
    pub cancelled_count: u64,
    #[serde(with = "rust_decimal::serde::str")]
    pub revenue: Decimal,
}

/// Only completed appointments are realized revenue. Open ones count as
/// scheduled; cancelled ones count toward neither.
pub fn summarize<I>(appointments: I) -> EarningsSummary
where
    I: IntoIterator<Item = (AppointmentStatus, Decimal)>,
{
    appointments
        .into_iter()
        .fold(EarningsSummary::default(), |mut acc, (status, value)| {
            match status {
                AppointmentStatus::Pending | AppointmentStatus::Confirmed => acc.scheduled_count += 1,
                AppointmentStatus::Completed => {
                    acc.completed_count += 1;
                    acc.revenue += value;
                }
                AppointmentStatus::CancelledByClient | AppointmentStatus::CancelledByProvider => {
                    acc.cancelled_count += 1
                }
            }
            acc
        })
}
