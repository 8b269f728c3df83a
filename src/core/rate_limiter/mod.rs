//! Per-provider rate limiting
//!
//! Trailing-window request counting plus in-flight concurrency tracking,
//! backed by a bounded ring of request records per provider.

mod limiter;
mod types;


pub use limiter::{RATE_LIMIT_WINDOW, RateLimiter};
pub use types::{RateLimitResult, RateLimitUsage, RequestId, RequestRecord};
