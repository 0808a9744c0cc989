//! Stack Advisor - Interactive Tech Stack Recommendation
//!
//! This crate implements the decision pipeline behind a tech stack advisor:
//! deterministic rule pre-checks catch obvious or contradictory project
//! inputs, everything else falls through to an LLM provider with windowed
//! conversational memory.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
