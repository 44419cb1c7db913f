mod service;

pub use service::{EventFilter, EventLog, EventPage, EventStats, NewSecurityEvent};
