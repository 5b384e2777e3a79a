pub mod appointment;
pub mod notification;
pub mod party;
pub mod schedule;
pub mod service;

use uuid::Uuid;

pub(crate) fn display_uuid_option(o: &Option<Uuid>) -> String {
    o.map(|u| u.to_string()).unwrap_or_else(|| "-".into())
}
