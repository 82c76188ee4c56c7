//! Token-bucket rate limiting: bucket math plus the keyed, evicting limiter store.

pub mod bucket;
pub mod limiter;

pub use bucket::*;
pub use limiter::*;
