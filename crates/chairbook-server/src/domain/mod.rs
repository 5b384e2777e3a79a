mod appointment;
mod notification;
mod party;
mod schedule;
mod service;
pub mod time;

pub use appointment::*;
pub use notification::*;
pub use party::*;
pub use schedule::*;
pub use service::*;
pub use time::{TimeError, TimeOfDay};
