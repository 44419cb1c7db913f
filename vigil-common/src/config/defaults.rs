use std::time::Duration;

use crate::Secret;

#[inline]
pub(crate) fn _default_database_url() -> Secret<String> {
    Secret::new("sqlite:data/db".to_owned())
}

#[inline]
pub(crate) fn _default_block_cache_ttl() -> Duration {
    Duration::from_secs(60)
}

#[inline]
pub(crate) fn _default_sweep_interval() -> Duration {
    Duration::from_secs(60 * 5)
}

#[inline]
pub(crate) fn _default_retention() -> Duration {
    Duration::from_secs(60 * 60 * 24 * 90)
}
