//! `devcrew-core` — domain model and milestone state machine for devcrew.
//!
//! A project is driven by a fixed four-role team (CEO, CTO, Coder, Tester).
//! Each submitted milestone runs through the roles in order, every role reads
//! and appends its own long-term memory, and the finished record is committed
//! to the project's JSON state file atomically.

pub mod agent;
pub mod error;
pub mod io;
pub mod lock;
pub mod memory;
pub mod paths;
pub mod pipeline;
pub mod project;
pub mod role;
pub mod team;

#[cfg(test)]
pub(crate) mod test_support;

pub use error::{CrewError, Result};
pub use role::Role;
