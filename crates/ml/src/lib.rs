//! Vulnerability prioritization models.
//!
//! Logistic-regression prioritization over the canonical feature vector:
//! dataset assembly and seeded splitting, training against the model store's
//! claim-based lifecycle, and prediction with per-feature contributions and
//! generated explanations.

pub mod dataset;
pub mod error;
pub mod model;
pub mod predictor;
pub mod trainer;

pub use dataset::LabeledVulnerability;
pub use error::MlError;
pub use model::PriorityModel;
pub use predictor::{Prediction, Predictor};
pub use trainer::Trainer;
