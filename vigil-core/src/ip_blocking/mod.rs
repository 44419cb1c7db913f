mod cache;
mod service;

pub use cache::{BlockCache, CachedBlock};
pub use service::{BlockStats, IpBlockService};
