pub mod appointments;
pub mod availability;
pub mod health;
pub mod notifications;
pub mod parties;
pub mod schedule;
pub mod services;
pub mod summary;
