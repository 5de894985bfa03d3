//! Scanner adapters.
//!
//! One adapter per external scanning tool. Every adapter translates a scan
//! request into a tool invocation, parses the tool's JSON output
//! defensively, and maps native vulnerability fields onto the canonical
//! finding schema. Tool failures of any kind fold into
//! [`adapter::AdapterResult::Failed`]; an adapter never panics and never
//! returns an `Err` for an external fault.

pub mod adapter;
pub mod custom;
pub mod dependency_check;
pub mod openvas;
pub mod trivy;

pub use adapter::{AdapterRegistry, AdapterResult, ScanRequest, ScannerAdapter};
pub use custom::CustomAdapter;
pub use dependency_check::DependencyCheckAdapter;
pub use openvas::OpenVasAdapter;
pub use trivy::TrivyAdapter;
