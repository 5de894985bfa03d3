//! Entity structs and DTOs.
//!
//! Each submodule contains:
//! - A `Serialize` entity struct owned by the store
//! - A create DTO for inserts
//! - Query/update DTOs where the entity supports them

pub mod scan;
pub mod trained_model;
pub mod vulnerability;

pub use scan::{CreateScan, Scan, ScanListQuery, UpdateScan};
pub use trained_model::{
    CreateModel, EvaluationMetrics, FeatureImportance, ModelListQuery, TrainedModel,
    TrainingOutcome,
};
pub use vulnerability::{NewVulnerability, Vulnerability, VulnerabilitySummary};
