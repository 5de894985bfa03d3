//! Domain types and pure decision logic for the vulnerability scanning
//! platform.
//!
//! This crate has zero internal dependencies. Everything here is either a
//! plain data type or a pure function; persistence, process execution, and
//! async orchestration live in the other workspace crates.

pub mod enums;
pub mod error;
pub mod features;
pub mod finding;
pub mod lifecycle;
pub mod priority;
pub mod types;

pub use error::CoreError;
