//! Fixed-window rate limiting.
//!
//! Bounds repeated operations (login attempts, primarily) per logical key
//! within a time window. The counter map is the one piece of genuinely
//! shared mutable state in the core, so it sits behind [`CounterStore`];
//! single-process deployments use the in-memory map, multi-process
//! deployments can back the same contract with a shared store.

mod client_ip;
mod limiter;
mod store;

pub use client_ip::client_ip;
pub use limiter::{login_key, RateLimitDecision, RateLimiter};
pub use store::{CounterStore, InMemoryCounterStore, WindowState};
