mod service;
mod user_agent;

pub use service::SessionService;
pub use user_agent::{parse_user_agent, DeviceInfo};
