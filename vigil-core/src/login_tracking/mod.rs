mod service;

pub use service::{
    failure_severity, Admission, DenialReason, FailureOutcome, LoginTracker,
    RATE_LIMIT_WAIT_SECONDS,
};
