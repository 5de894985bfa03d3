//! Scan orchestration engine.
//!
//! Owns the scan lifecycle: claiming a pending scan, dispatching its adapter
//! on the runtime with a timeout and a cancellation token, normalizing and
//! persisting the findings, and driving the scan to exactly one terminal
//! state.

pub mod config;
pub mod controller;
pub mod error;
pub mod telemetry;

pub use config::EngineConfig;
pub use controller::ScanController;
pub use error::EngineError;
