mod store;

pub use store::{ParameterStore, SeededParameter, DEFAULT_PARAMETERS};

pub mod keys {
    pub const LOGIN_MAX_ATTEMPTS_PER_MINUTE: &str = "login.max_attempts_per_minute";
    pub const LOGIN_FAILURE_WINDOW_MINUTES: &str = "login.failure_window_minutes";
    pub const LOGIN_AUTO_BLOCK_THRESHOLD: &str = "login.auto_block_threshold";
    pub const LOGIN_REQUIRE_VERIFIED_EMAIL: &str = "login.require_verified_email";
    pub const BLOCK_AUTO_DURATION_MINUTES: &str = "blocking.auto_block_duration_minutes";
    pub const SESSION_MAX_ACTIVE_PER_USER: &str = "sessions.max_active_per_user";
    pub const SESSION_LIFETIME_DAYS: &str = "sessions.lifetime_days";
    pub const ALERT_FAILED_LOGIN_THRESHOLD: &str = "alerts.failed_login_threshold";
    pub const ALERT_BRUTE_FORCE_THRESHOLD: &str = "alerts.brute_force_threshold";
    pub const ALERT_RATE_LIMIT_THRESHOLD: &str = "alerts.rate_limit_abuse_threshold";
}
