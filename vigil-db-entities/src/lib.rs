#![allow(non_snake_case)]

pub mod IpBlock;
pub mod LoginAttempt;
pub mod Parameter;
pub mod SecurityAlert;
pub mod SecurityEvent;
pub mod Session;
