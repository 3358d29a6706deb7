//! Token-bucket admission control
//!
//! [`TokenBucket`] refills continuously from an injectable [`Clock`];
//! [`BucketRegistry`] hands out one bucket per client identifier.

pub mod clock;
pub mod registry;
pub mod token_bucket;

pub use clock::{Clock, ManualClock, SystemClock};
pub use registry::BucketRegistry;
pub use token_bucket::TokenBucket;
