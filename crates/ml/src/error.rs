//! ML error type.

use vulnscan_core::types::EntityId;
use vulnscan_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum MlError {
    /// No usable trained model exists (neither the requested one nor a
    /// fallback).
    #[error("no trained model available")]
    NoTrainedModel,

    /// The model's payload carries no feature ordering, so a prediction
    /// vector cannot be assembled.
    #[error("model {0} has no feature names")]
    MissingFeatureNames(EntityId),

    #[error("training dataset is empty")]
    EmptyDataset,

    #[error("training dataset contains only one class")]
    SingleClassDataset,

    #[error("model payload serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error(transparent)]
    Store(#[from] StoreError),
}
