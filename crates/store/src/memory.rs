//! In-memory store implementation.
//!
//! One `RwLock<HashMap>` per entity type. Conditional transitions take the
//! write lock for the whole check-and-mutate, which is what makes the claim
//! operations exactly-once under concurrent callers.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use vulnscan_core::enums::{ModelStatus, ScanStatus};
use vulnscan_core::finding::SeverityCounts;
use vulnscan_core::lifecycle;
use vulnscan_core::types::EntityId;

use crate::error::StoreError;
use crate::models::{
    CreateModel, CreateScan, ModelListQuery, NewVulnerability, Scan, ScanListQuery, TrainedModel,
    TrainingOutcome, UpdateScan, Vulnerability,
};
use crate::repositories::{ModelStore, ScanStore, VulnerabilityStore};

/// Default page size for list queries.
const DEFAULT_LIMIT: usize = 50;

/// Maximum page size for list queries.
const MAX_LIMIT: usize = 100;

/// In-memory implementation of all three store traits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    scans: RwLock<HashMap<EntityId, Scan>>,
    vulnerabilities: RwLock<HashMap<EntityId, Vulnerability>>,
    models: RwLock<HashMap<EntityId, TrainedModel>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn page(limit: Option<usize>, offset: Option<usize>) -> (usize, usize) {
    (limit.unwrap_or(DEFAULT_LIMIT).min(MAX_LIMIT), offset.unwrap_or(0))
}

// ---------------------------------------------------------------------------
// Scans
// ---------------------------------------------------------------------------

#[async_trait]
impl ScanStore for MemoryStore {
    async fn insert_scan(&self, scan: CreateScan) -> Result<Scan, StoreError> {
        let now = Utc::now();
        let entity = Scan {
            id: EntityId::new_v4(),
            name: scan.name,
            description: scan.description,
            scanner_kind: scan.scanner_kind,
            asset_id: scan.asset_id,
            target_type: scan.target_type,
            target_identifier: scan.target_identifier,
            depth: scan.depth,
            scan_frequency: scan.scan_frequency,
            scanner_config: scan.scanner_config,
            status: ScanStatus::Pending,
            status_message: None,
            counts: SeverityCounts::default(),
            created_at: now,
            updated_at: now,
            started_at: None,
            completed_at: None,
        };
        self.scans.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_scan(&self, id: EntityId) -> Result<Option<Scan>, StoreError> {
        Ok(self.scans.read().await.get(&id).cloned())
    }

    async fn list_scans(&self, query: &ScanListQuery) -> Result<Vec<Scan>, StoreError> {
        let (limit, offset) = page(query.limit, query.offset);
        let scans = self.scans.read().await;
        let mut matching: Vec<Scan> = scans
            .values()
            .filter(|s| query.status.map_or(true, |status| s.status == status))
            .filter(|s| query.scanner_kind.map_or(true, |kind| s.scanner_kind == kind))
            .filter(|s| query.asset_id.map_or(true, |asset| s.asset_id == asset))
            .cloned()
            .collect();
        matching.sort_by_key(|s| s.created_at);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn update_scan(&self, id: EntityId, update: UpdateScan) -> Result<Scan, StoreError> {
        let mut scans = self.scans.write().await;
        let scan = scans
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Scan", id })?;
        if let Some(name) = update.name {
            scan.name = name;
        }
        if let Some(description) = update.description {
            scan.description = Some(description);
        }
        if let Some(depth) = update.depth {
            scan.depth = depth;
        }
        if let Some(frequency) = update.scan_frequency {
            scan.scan_frequency = Some(frequency);
        }
        if let Some(config) = update.scanner_config {
            scan.scanner_config = config;
        }
        scan.updated_at = Utc::now();
        Ok(scan.clone())
    }

    async fn delete_scan(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self.scans.write().await.remove(&id).is_some())
    }

    async fn claim_start(&self, id: EntityId) -> Result<Scan, StoreError> {
        let mut scans = self.scans.write().await;
        let scan = scans
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Scan", id })?;
        if !lifecycle::can_start(scan.status) {
            return Err(StoreError::StateConflict(format!(
                "Cannot start scan in state '{}'",
                scan.status
            )));
        }
        let now = Utc::now();
        scan.status = ScanStatus::Running;
        scan.started_at = Some(now);
        scan.updated_at = now;
        Ok(scan.clone())
    }

    async fn complete_scan(
        &self,
        id: EntityId,
        message: &str,
        counts: SeverityCounts,
    ) -> Result<Scan, StoreError> {
        let mut scans = self.scans.write().await;
        let scan = scans
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Scan", id })?;
        lifecycle::validate_transition(scan.status, ScanStatus::Completed)?;
        let now = Utc::now();
        scan.status = ScanStatus::Completed;
        scan.status_message = Some(message.to_string());
        scan.counts = counts;
        scan.completed_at = Some(now);
        scan.updated_at = now;
        Ok(scan.clone())
    }

    async fn fail_scan(&self, id: EntityId, message: &str) -> Result<Scan, StoreError> {
        let mut scans = self.scans.write().await;
        let scan = scans
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Scan", id })?;
        lifecycle::validate_transition(scan.status, ScanStatus::Failed)?;
        scan.status = ScanStatus::Failed;
        scan.status_message = Some(message.to_string());
        scan.updated_at = Utc::now();
        Ok(scan.clone())
    }

    async fn stop_scan(&self, id: EntityId) -> Result<Scan, StoreError> {
        let mut scans = self.scans.write().await;
        let scan = scans
            .get_mut(&id)
            .ok_or(StoreError::NotFound { entity: "Scan", id })?;
        if !lifecycle::can_stop(scan.status) {
            return Err(StoreError::StateConflict(format!(
                "Cannot stop scan in state '{}'",
                scan.status
            )));
        }
        scan.status = ScanStatus::Stopped;
        scan.updated_at = Utc::now();
        Ok(scan.clone())
    }
}

// ---------------------------------------------------------------------------
// Vulnerabilities
// ---------------------------------------------------------------------------

#[async_trait]
impl VulnerabilityStore for MemoryStore {
    async fn insert_vulnerability(
        &self,
        vulnerability: NewVulnerability,
    ) -> Result<Vulnerability, StoreError> {
        let now = Utc::now();
        let finding = vulnerability.finding;
        let mut metadata = finding.metadata;
        if finding.duplicate {
            metadata.insert("duplicate".to_string(), serde_json::Value::Bool(true));
        }
        let entity = Vulnerability {
            id: EntityId::new_v4(),
            scan_id: vulnerability.scan_id,
            asset_id: vulnerability.asset_id,
            title: finding.title,
            description: finding.description,
            cve_id: finding.cve_id,
            severity: finding.severity,
            cvss_score: finding.cvss_score,
            cvss_vector: finding.cvss_vector,
            affected_component: finding.affected_component,
            affected_version: finding.affected_version,
            exploit_available: finding.exploit_available,
            exploit_maturity: finding.exploit_maturity,
            patch_available: finding.patch_available,
            business_impact: finding.business_impact,
            data_classification: finding.data_classification,
            system_exposure: finding.system_exposure,
            metadata,
            status: vulnscan_core::enums::RemediationStatus::Open,
            priority_score: None,
            priority_explanation: None,
            created_at: now,
            updated_at: now,
        };
        self.vulnerabilities
            .write()
            .await
            .insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_vulnerability(&self, id: EntityId) -> Result<Option<Vulnerability>, StoreError> {
        Ok(self.vulnerabilities.read().await.get(&id).cloned())
    }

    async fn vulnerabilities_by_scan(
        &self,
        scan_id: EntityId,
    ) -> Result<Vec<Vulnerability>, StoreError> {
        let vulnerabilities = self.vulnerabilities.read().await;
        let mut matching: Vec<Vulnerability> = vulnerabilities
            .values()
            .filter(|v| v.scan_id == Some(scan_id))
            .cloned()
            .collect();
        matching.sort_by_key(|v| v.created_at);
        Ok(matching)
    }

    async fn vulnerabilities_by_asset(
        &self,
        asset_id: EntityId,
    ) -> Result<Vec<Vulnerability>, StoreError> {
        let vulnerabilities = self.vulnerabilities.read().await;
        let mut matching: Vec<Vulnerability> = vulnerabilities
            .values()
            .filter(|v| v.asset_id == Some(asset_id))
            .cloned()
            .collect();
        matching.sort_by_key(|v| v.created_at);
        Ok(matching)
    }

    async fn delete_vulnerability(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self.vulnerabilities.write().await.remove(&id).is_some())
    }

    async fn set_priority(
        &self,
        id: EntityId,
        score: f64,
        explanation: &str,
    ) -> Result<Vulnerability, StoreError> {
        let mut vulnerabilities = self.vulnerabilities.write().await;
        let vulnerability = vulnerabilities.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "Vulnerability",
            id,
        })?;
        vulnerability.priority_score = Some(score);
        vulnerability.priority_explanation = Some(explanation.to_string());
        vulnerability.updated_at = Utc::now();
        Ok(vulnerability.clone())
    }
}

// ---------------------------------------------------------------------------
// Models
// ---------------------------------------------------------------------------

#[async_trait]
impl ModelStore for MemoryStore {
    async fn insert_model(&self, model: CreateModel) -> Result<TrainedModel, StoreError> {
        let now = Utc::now();
        let entity = TrainedModel {
            id: EntityId::new_v4(),
            name: model.name,
            description: model.description,
            feature_names: Vec::new(),
            hyperparameters: model.hyperparameters,
            metrics: None,
            feature_importance: Vec::new(),
            payload: None,
            status: ModelStatus::Created,
            status_message: None,
            created_at: now,
            updated_at: now,
        };
        self.models.write().await.insert(entity.id, entity.clone());
        Ok(entity)
    }

    async fn get_model(&self, id: EntityId) -> Result<Option<TrainedModel>, StoreError> {
        Ok(self.models.read().await.get(&id).cloned())
    }

    async fn list_models(&self, query: &ModelListQuery) -> Result<Vec<TrainedModel>, StoreError> {
        let (limit, offset) = page(query.limit, query.offset);
        let models = self.models.read().await;
        let mut matching: Vec<TrainedModel> = models
            .values()
            .filter(|m| query.status.map_or(true, |status| m.status == status))
            .cloned()
            .collect();
        matching.sort_by_key(|m| m.created_at);
        Ok(matching.into_iter().skip(offset).take(limit).collect())
    }

    async fn delete_model(&self, id: EntityId) -> Result<bool, StoreError> {
        Ok(self.models.write().await.remove(&id).is_some())
    }

    async fn claim_training(&self, id: EntityId) -> Result<TrainedModel, StoreError> {
        let mut models = self.models.write().await;
        let model = models.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "TrainedModel",
            id,
        })?;
        if !lifecycle::can_claim_training(model.status) {
            return Err(StoreError::StateConflict(format!(
                "Model {id} is already training"
            )));
        }
        model.status = ModelStatus::Training;
        model.status_message = None;
        model.updated_at = Utc::now();
        Ok(model.clone())
    }

    async fn mark_trained(
        &self,
        id: EntityId,
        outcome: TrainingOutcome,
    ) -> Result<TrainedModel, StoreError> {
        let mut models = self.models.write().await;
        let model = models.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "TrainedModel",
            id,
        })?;
        lifecycle::validate_model_transition(model.status, ModelStatus::Trained)?;
        if model.payload.is_some() && model.feature_names != outcome.feature_names {
            return Err(StoreError::StateConflict(format!(
                "Model {id} was trained with a different feature set; \
                 create a new model instead of retraining with changed features"
            )));
        }
        model.feature_names = outcome.feature_names;
        model.hyperparameters = outcome.hyperparameters;
        model.metrics = Some(outcome.metrics);
        model.feature_importance = outcome.feature_importance;
        model.payload = Some(outcome.payload);
        model.status = ModelStatus::Trained;
        model.status_message = None;
        model.updated_at = Utc::now();
        Ok(model.clone())
    }

    async fn mark_training_error(
        &self,
        id: EntityId,
        message: &str,
    ) -> Result<TrainedModel, StoreError> {
        let mut models = self.models.write().await;
        let model = models.get_mut(&id).ok_or(StoreError::NotFound {
            entity: "TrainedModel",
            id,
        })?;
        lifecycle::validate_model_transition(model.status, ModelStatus::Error)?;
        model.status = ModelStatus::Error;
        model.status_message = Some(message.to_string());
        model.updated_at = Utc::now();
        Ok(model.clone())
    }

    async fn latest_trained(&self) -> Result<Option<TrainedModel>, StoreError> {
        let models = self.models.read().await;
        Ok(models
            .values()
            .filter(|m| m.status == ModelStatus::Trained && m.payload.is_some())
            .max_by_key(|m| m.updated_at)
            .cloned())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
