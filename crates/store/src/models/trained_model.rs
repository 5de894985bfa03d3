//! Trained model entity and DTOs.

use serde::{Deserialize, Serialize};
use vulnscan_core::enums::ModelStatus;
use vulnscan_core::types::{EntityId, Timestamp};

/// A versioned, persisted prioritization model.
///
/// The feature name list is immutable once a payload exists; retraining with
/// a different feature set must create a new record (enforced by
/// `ModelStore::mark_trained`).
#[derive(Debug, Clone, Serialize)]
pub struct TrainedModel {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    /// Ordered feature names defining the vector layout the payload expects.
    pub feature_names: Vec<String>,
    pub hyperparameters: serde_json::Map<String, serde_json::Value>,
    pub metrics: Option<EvaluationMetrics>,
    pub feature_importance: Vec<FeatureImportance>,
    /// Opaque serialized model. Present only when status is `trained`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
    pub status: ModelStatus,
    pub status_message: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Evaluation metrics computed on the held-out split.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationMetrics {
    pub accuracy: f64,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    /// Rows are actual class, columns predicted: `[[tn, fp], [fn, tp]]`.
    pub confusion_matrix: [[u64; 2]; 2],
    /// Only present when the held-out split contains both classes.
    pub roc_auc: Option<f64>,
}

/// Importance of one feature in a fitted model.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureImportance {
    pub feature: String,
    pub importance: f64,
    pub description: String,
}

/// DTO for registering a model. New models start in `created` with no
/// payload.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateModel {
    pub name: String,
    pub description: Option<String>,
    #[serde(default)]
    pub hyperparameters: serde_json::Map<String, serde_json::Value>,
}

/// Filters for listing models.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ModelListQuery {
    pub status: Option<ModelStatus>,
    pub limit: Option<usize>,
    pub offset: Option<usize>,
}

/// Everything a successful training run writes back in one update.
#[derive(Debug, Clone)]
pub struct TrainingOutcome {
    pub feature_names: Vec<String>,
    pub hyperparameters: serde_json::Map<String, serde_json::Value>,
    pub metrics: EvaluationMetrics,
    pub feature_importance: Vec<FeatureImportance>,
    pub payload: Vec<u8>,
}
