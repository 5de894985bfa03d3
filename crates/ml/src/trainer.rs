//! Training runs against the model store's claim-based lifecycle.

use std::sync::Arc;

use vulnscan_core::features::canonical_feature_names;
use vulnscan_core::types::EntityId;
use vulnscan_store::models::{TrainedModel, TrainingOutcome};
use vulnscan_store::ModelStore;

use crate::dataset::{design_matrix, evaluate, labels, train_test_split, LabeledVulnerability};
use crate::error::MlError;
use crate::model::{Hyperparameters, PriorityModel};

/// Runs training jobs for registered models.
pub struct Trainer {
    models: Arc<dyn ModelStore>,
}

impl Trainer {
    pub fn new(models: Arc<dyn ModelStore>) -> Self {
        Self { models }
    }

    /// Train `model_id` on a labeled dataset.
    ///
    /// Claims the model (refused while another run holds it), fits on the
    /// seeded 80/20 split, and writes payload plus metrics back in one
    /// update. Any failure after the claim lands the model in `error` with
    /// the failure message, and the original error is returned.
    pub async fn train(
        &self,
        model_id: EntityId,
        samples: Vec<LabeledVulnerability>,
    ) -> Result<TrainedModel, MlError> {
        let claimed = self.models.claim_training(model_id).await?;
        tracing::info!(
            model_id = %model_id,
            samples = samples.len(),
            "Training started",
        );

        match self.fit_and_evaluate(&claimed, samples) {
            Ok(outcome) => match self.models.mark_trained(model_id, outcome).await {
                Ok(trained) => {
                    tracing::info!(model_id = %model_id, "Training completed");
                    Ok(trained)
                }
                // A failed write-back must not leave the record stuck in
                // `training`.
                Err(e) => {
                    self.record_failure(model_id, &e.to_string()).await;
                    Err(e.into())
                }
            },
            Err(e) => {
                self.record_failure(model_id, &e.to_string()).await;
                Err(e)
            }
        }
    }

    /// Best-effort transition to `error`; the original failure is what the
    /// caller sees either way.
    async fn record_failure(&self, model_id: EntityId, message: &str) {
        tracing::error!(model_id = %model_id, error = message, "Training failed");
        if let Err(store_err) = self.models.mark_training_error(model_id, message).await {
            tracing::error!(
                model_id = %model_id,
                error = %store_err,
                "Failed to record training error",
            );
        }
    }

    fn fit_and_evaluate(
        &self,
        claimed: &TrainedModel,
        samples: Vec<LabeledVulnerability>,
    ) -> Result<TrainingOutcome, MlError> {
        if samples.is_empty() {
            return Err(MlError::EmptyDataset);
        }

        // A retrained model keeps its persisted feature ordering; a first
        // training run adopts the canonical one.
        let feature_names = if claimed.payload.is_some() {
            claimed.feature_names.clone()
        } else {
            canonical_feature_names()
        };
        let params = Hyperparameters::from_map(&claimed.hyperparameters);

        let (train, test) = train_test_split(samples);
        let rows = design_matrix(&feature_names, &train);
        let train_labels = labels(&train);

        let model = PriorityModel::fit(feature_names.clone(), &rows, &train_labels, &params)?;
        let metrics = evaluate(&model, &test);

        Ok(TrainingOutcome {
            feature_names,
            hyperparameters: claimed.hyperparameters.clone(),
            metrics,
            feature_importance: model.feature_importance(),
            payload: model.to_bytes()?,
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
