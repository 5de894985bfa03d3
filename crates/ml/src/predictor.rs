//! Prediction: model resolution, scoring, and persisting scores back onto
//! stored vulnerabilities.

use std::sync::Arc;

use serde::Serialize;
use vulnscan_core::enums::ModelStatus;
use vulnscan_core::features::feature_vector_for;
use vulnscan_core::finding::NormalizedFinding;
use vulnscan_core::priority::{
    confidence, generate_explanation, priority_class, recommended_action, PriorityClass,
};
use vulnscan_core::types::EntityId;
use vulnscan_store::models::Vulnerability;
use vulnscan_store::{ModelStore, StoreError, VulnerabilityStore};

use crate::error::MlError;
use crate::model::PriorityModel;

/// A scored vulnerability with its full interpretation.
#[derive(Debug, Clone, Serialize)]
pub struct Prediction {
    /// Model used to produce this prediction.
    pub model_id: EntityId,
    /// Priority score in `[0, 1]`.
    pub score: f64,
    pub class: PriorityClass,
    pub confidence: f64,
    /// Signed per-feature contributions, in feature order.
    pub contributions: Vec<(String, f64)>,
    pub explanation: String,
    pub recommended_action: &'static str,
}

/// Scores findings against trained models.
pub struct Predictor {
    models: Arc<dyn ModelStore>,
}

impl Predictor {
    pub fn new(models: Arc<dyn ModelStore>) -> Self {
        Self { models }
    }

    /// Resolve the model to score with: the explicitly requested one when it
    /// is `trained` and carries a payload, otherwise the most recently
    /// trained one.
    ///
    /// An explicit id that is unknown, not yet trained, or sitting in
    /// `training`/`error` (an errored retrain keeps its stale payload) falls
    /// back to the latest trained model; only when no usable model exists at
    /// all does this fail with [`MlError::NoTrainedModel`].
    async fn resolve_model(
        &self,
        model_id: Option<EntityId>,
    ) -> Result<(EntityId, PriorityModel), MlError> {
        let explicit = match model_id {
            Some(id) => {
                let record = self.models.get_model(id).await?;
                let usable =
                    record.filter(|r| r.status == ModelStatus::Trained && r.payload.is_some());
                if usable.is_none() {
                    tracing::warn!(
                        model_id = %id,
                        "Requested model unavailable, falling back to latest trained",
                    );
                }
                usable
            }
            None => None,
        };

        let record = match explicit {
            Some(record) => record,
            None => self
                .models
                .latest_trained()
                .await?
                .ok_or(MlError::NoTrainedModel)?,
        };

        // latest_trained only returns payload-carrying records.
        let payload = record.payload.as_deref().unwrap_or_default();
        let model = PriorityModel::from_bytes(payload)?;
        if model.feature_names.is_empty() {
            return Err(MlError::MissingFeatureNames(record.id));
        }
        Ok((record.id, model))
    }

    /// Score one normalized finding.
    pub async fn predict(
        &self,
        finding: &NormalizedFinding,
        model_id: Option<EntityId>,
    ) -> Result<Prediction, MlError> {
        let (model_id, model) = self.resolve_model(model_id).await?;

        let values = feature_vector_for(&model.feature_names, finding);
        let score = model.predict_score(&values);
        let contributions = model.contributions(&values);
        let class = priority_class(score);

        Ok(Prediction {
            model_id,
            score,
            class,
            confidence: confidence(score),
            explanation: generate_explanation(score, &contributions, finding),
            recommended_action: recommended_action(class),
            contributions,
        })
    }

    /// Score a stored vulnerability and persist the score and explanation
    /// onto its record.
    pub async fn score_and_persist(
        &self,
        vulnerabilities: &dyn VulnerabilityStore,
        vulnerability_id: EntityId,
        model_id: Option<EntityId>,
    ) -> Result<(Vulnerability, Prediction), MlError> {
        let vulnerability = vulnerabilities
            .get_vulnerability(vulnerability_id)
            .await?
            .ok_or(StoreError::NotFound {
                entity: "vulnerability",
                id: vulnerability_id,
            })?;

        let prediction = self.predict(&vulnerability.as_finding(), model_id).await?;
        tracing::debug!(
            vulnerability_id = %vulnerability_id,
            score = prediction.score,
            class = %prediction.class,
            "Scored vulnerability",
        );

        let updated = vulnerabilities
            .set_priority(vulnerability_id, prediction.score, &prediction.explanation)
            .await?;
        Ok((updated, prediction))
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use vulnscan_core::finding::{normalize_finding, RawFinding};
    use vulnscan_store::models::{CreateModel, NewVulnerability};
    use vulnscan_store::MemoryStore;

    use crate::dataset::LabeledVulnerability;
    use crate::trainer::Trainer;

    fn finding(cvss: f64, exploit: bool) -> NormalizedFinding {
        normalize_finding(&RawFinding {
            severity: Some(if cvss >= 7.0 { "critical" } else { "low" }.to_string()),
            cvss_score: Some(cvss),
            exploit_available: Some(exploit),
            ..Default::default()
        })
    }

    fn dataset() -> Vec<LabeledVulnerability> {
        (0..10)
            .flat_map(|i| {
                [
                    LabeledVulnerability {
                        finding: finding(8.0 + i as f64 * 0.2, true),
                        high_priority: true,
                    },
                    LabeledVulnerability {
                        finding: finding(1.0 + i as f64 * 0.2, false),
                        high_priority: false,
                    },
                ]
            })
            .collect()
    }

    async fn trained_model(store: &Arc<MemoryStore>) -> EntityId {
        let model = store
            .insert_model(CreateModel {
                name: "priority".to_string(),
                description: None,
                hyperparameters: Default::default(),
            })
            .await
            .unwrap();
        Trainer::new(store.clone())
            .train(model.id, dataset())
            .await
            .unwrap();
        model.id
    }

    #[tokio::test]
    async fn no_model_registered_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let predictor = Predictor::new(store);
        let result = predictor.predict(&finding(9.0, true), None).await;
        assert_matches!(result, Err(MlError::NoTrainedModel));
    }

    #[tokio::test]
    async fn explicit_unknown_model_falls_back_to_latest_trained() {
        let store = Arc::new(MemoryStore::new());
        let trained = trained_model(&store).await;
        let predictor = Predictor::new(store);

        let prediction = predictor
            .predict(&finding(9.0, true), Some(EntityId::new_v4()))
            .await
            .unwrap();
        assert_eq!(prediction.model_id, trained);
    }

    #[tokio::test]
    async fn explicit_untrained_model_falls_back_to_latest_trained() {
        let store = Arc::new(MemoryStore::new());
        let trained = trained_model(&store).await;
        let fresh = store
            .insert_model(CreateModel {
                name: "fresh".to_string(),
                description: None,
                hyperparameters: Default::default(),
            })
            .await
            .unwrap();
        let predictor = Predictor::new(store);

        let prediction = predictor
            .predict(&finding(9.0, true), Some(fresh.id))
            .await
            .unwrap();
        assert_eq!(prediction.model_id, trained);
    }

    #[tokio::test]
    async fn explicit_model_with_stale_payload_falls_back_to_latest_trained() {
        let store = Arc::new(MemoryStore::new());
        let fallback = trained_model(&store).await;

        // Second model trains successfully, then a failed retrain leaves it
        // in `error` with its previous payload still attached.
        let stale = store
            .insert_model(CreateModel {
                name: "stale".to_string(),
                description: None,
                hyperparameters: Default::default(),
            })
            .await
            .unwrap();
        Trainer::new(store.clone())
            .train(stale.id, dataset())
            .await
            .unwrap();
        let predictor = Predictor::new(store.clone());

        // Mid-retrain (`training`) the model must not be selected.
        store.claim_training(stale.id).await.unwrap();
        let prediction = predictor
            .predict(&finding(9.0, true), Some(stale.id))
            .await
            .unwrap();
        assert_eq!(prediction.model_id, fallback);

        // Nor after the retrain fails, even though the old payload survives.
        store.mark_training_error(stale.id, "empty dataset").await.unwrap();
        let record = store.get_model(stale.id).await.unwrap().unwrap();
        assert!(record.payload.is_some());

        let prediction = predictor
            .predict(&finding(9.0, true), Some(stale.id))
            .await
            .unwrap();
        assert_eq!(prediction.model_id, fallback);
    }

    #[tokio::test]
    async fn explicit_untrained_model_without_fallback_is_an_error() {
        let store = Arc::new(MemoryStore::new());
        let fresh = store
            .insert_model(CreateModel {
                name: "fresh".to_string(),
                description: None,
                hyperparameters: Default::default(),
            })
            .await
            .unwrap();
        let predictor = Predictor::new(store);
        let result = predictor.predict(&finding(9.0, true), Some(fresh.id)).await;
        assert_matches!(result, Err(MlError::NoTrainedModel));
    }

    #[tokio::test]
    async fn prediction_carries_full_interpretation() {
        let store = Arc::new(MemoryStore::new());
        let model_id = trained_model(&store).await;
        let predictor = Predictor::new(store);

        let prediction = predictor.predict(&finding(9.8, true), None).await.unwrap();
        assert_eq!(prediction.model_id, model_id);
        assert!((0.0..=1.0).contains(&prediction.score));
        assert!(prediction.score > 0.5);
        assert_eq!(prediction.class, priority_class(prediction.score));
        assert_eq!(prediction.confidence, confidence(prediction.score));
        assert!(!prediction.contributions.is_empty());
        assert!(prediction
            .explanation
            .contains(&format!("score of {:.2}", prediction.score)));
        assert_eq!(
            prediction.recommended_action,
            recommended_action(prediction.class)
        );
    }

    #[tokio::test]
    async fn severe_finding_outranks_benign_finding() {
        let store = Arc::new(MemoryStore::new());
        trained_model(&store).await;
        let predictor = Predictor::new(store);

        let severe = predictor.predict(&finding(9.8, true), None).await.unwrap();
        let benign = predictor.predict(&finding(1.2, false), None).await.unwrap();
        assert!(severe.score > benign.score);
        assert!(benign.score < 0.5);
    }

    #[tokio::test]
    async fn score_and_persist_writes_back() {
        let store = Arc::new(MemoryStore::new());
        trained_model(&store).await;
        let predictor = Predictor::new(store.clone());

        let stored = store
            .insert_vulnerability(NewVulnerability {
                scan_id: None,
                asset_id: None,
                finding: finding(9.8, true),
            })
            .await
            .unwrap();

        let (updated, prediction) = predictor
            .score_and_persist(store.as_ref(), stored.id, None)
            .await
            .unwrap();
        assert_eq!(updated.priority_score, Some(prediction.score));
        assert_eq!(
            updated.priority_explanation.as_deref(),
            Some(prediction.explanation.as_str())
        );

        let reloaded = store.get_vulnerability(stored.id).await.unwrap().unwrap();
        assert_eq!(reloaded.priority_score, Some(prediction.score));
    }

    #[tokio::test]
    async fn score_and_persist_missing_vulnerability_is_not_found() {
        let store = Arc::new(MemoryStore::new());
        trained_model(&store).await;
        let predictor = Predictor::new(store.clone());

        let result = predictor
            .score_and_persist(store.as_ref(), EntityId::new_v4(), None)
            .await;
        assert_matches!(result, Err(MlError::Store(StoreError::NotFound { .. })));
    }
}
