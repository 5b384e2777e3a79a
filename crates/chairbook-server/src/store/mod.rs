//! Postgres access. Reads that feed the scheduling core and the writes
//! behind each booking transition.

pub mod appointments;
pub mod directory;
pub mod notifications;
pub mod schedule;
pub mod services;
