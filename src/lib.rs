// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod age;
pub mod api;
pub mod assemble;
pub mod board;
pub mod fetch;
pub mod input;
pub mod jobid;
pub mod metrics;
pub mod score;
pub mod textnorm;

// ---- Re-exports for stable public API ----
pub use crate::api::{create_router, AppState};
