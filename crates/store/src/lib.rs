//! Persistence boundary for scans, vulnerabilities, and trained models.
//!
//! The engine and the ML crates only ever see the [`repositories`] traits;
//! storage technology stays behind them. [`memory::MemoryStore`] is the
//! bundled implementation: a per-entity `RwLock<HashMap>` that gives the
//! same per-entity transactional consistency the traits promise.

pub mod error;
pub mod memory;
pub mod models;
pub mod repositories;

pub use error::StoreError;
pub use memory::MemoryStore;
pub use repositories::{ModelStore, ScanStore, VulnerabilityStore};
