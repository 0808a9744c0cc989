//! Application layer: orchestration of domain logic and ports.

mod advise;

pub use advise::{AdviseError, AdviseHandler};
