//! Resilient upstream provider access: credential pool, rotation, classification, cancellation.

pub mod cancel;
pub mod classify;
pub mod client;
pub mod pool;

pub use cancel::*;
pub use classify::*;
pub use client::*;
pub use pool::*;
