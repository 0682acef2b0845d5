// src/dag/mod.rs

//! Dependency graph and generation scheduling.
//!
//! [`scheduler`] turns one stage's active job set into an ordered list of
//! generations: topological layers of mutually independent jobs that can be
//! dispatched concurrently.

pub mod scheduler;

pub use scheduler::plan_generations;
