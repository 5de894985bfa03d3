//! Repository traits — the persistence contract the engine and ML crates
//! program against.
//!
//! Conditional transitions (`claim_start`, `claim_training`, the terminal
//! updates) are atomic per entity: an implementation must check the current
//! state and mutate under one critical section so that concurrent callers
//! observe exactly one successful claim.

use async_trait::async_trait;
use vulnscan_core::finding::SeverityCounts;
use vulnscan_core::types::EntityId;

use crate::error::StoreError;
use crate::models::{
    CreateModel, CreateScan, ModelListQuery, NewVulnerability, Scan, ScanListQuery, TrainedModel,
    TrainingOutcome, UpdateScan, Vulnerability,
};

/// CRUD and lifecycle transitions for scans.
#[async_trait]
pub trait ScanStore: Send + Sync {
    async fn insert_scan(&self, scan: CreateScan) -> Result<Scan, StoreError>;
    async fn get_scan(&self, id: EntityId) -> Result<Option<Scan>, StoreError>;
    async fn list_scans(&self, query: &ScanListQuery) -> Result<Vec<Scan>, StoreError>;
    async fn update_scan(&self, id: EntityId, update: UpdateScan) -> Result<Scan, StoreError>;
    async fn delete_scan(&self, id: EntityId) -> Result<bool, StoreError>;

    /// Atomically transition `pending -> running` and record the start
    /// timestamp. Any other current state is a state-conflict error; under
    /// concurrent callers exactly one claim succeeds.
    async fn claim_start(&self, id: EntityId) -> Result<Scan, StoreError>;

    /// Transition `running -> completed`, recording the completion
    /// timestamp, a summary message, and the aggregate counts.
    async fn complete_scan(
        &self,
        id: EntityId,
        message: &str,
        counts: SeverityCounts,
    ) -> Result<Scan, StoreError>;

    /// Transition `running -> failed` with a failure message.
    async fn fail_scan(&self, id: EntityId, message: &str) -> Result<Scan, StoreError>;

    /// Transition `running -> stopped`. Only valid while running.
    async fn stop_scan(&self, id: EntityId) -> Result<Scan, StoreError>;
}

/// CRUD and queries for vulnerabilities.
#[async_trait]
pub trait VulnerabilityStore: Send + Sync {
    async fn insert_vulnerability(
        &self,
        vulnerability: NewVulnerability,
    ) -> Result<Vulnerability, StoreError>;
    async fn get_vulnerability(&self, id: EntityId) -> Result<Option<Vulnerability>, StoreError>;
    async fn vulnerabilities_by_scan(
        &self,
        scan_id: EntityId,
    ) -> Result<Vec<Vulnerability>, StoreError>;
    async fn vulnerabilities_by_asset(
        &self,
        asset_id: EntityId,
    ) -> Result<Vec<Vulnerability>, StoreError>;
    async fn delete_vulnerability(&self, id: EntityId) -> Result<bool, StoreError>;

    /// Persist a prediction back onto a stored record.
    async fn set_priority(
        &self,
        id: EntityId,
        score: f64,
        explanation: &str,
    ) -> Result<Vulnerability, StoreError>;
}

/// CRUD and lifecycle transitions for trained models.
#[async_trait]
pub trait ModelStore: Send + Sync {
    async fn insert_model(&self, model: CreateModel) -> Result<TrainedModel, StoreError>;
    async fn get_model(&self, id: EntityId) -> Result<Option<TrainedModel>, StoreError>;
    async fn list_models(&self, query: &ModelListQuery) -> Result<Vec<TrainedModel>, StoreError>;
    async fn delete_model(&self, id: EntityId) -> Result<bool, StoreError>;

    /// Atomically claim the model for training (`created`/`trained`/`error`
    /// -> `training`). A model already `training` is refused with a
    /// state-conflict error — the status is the mutual-exclusion claim.
    async fn claim_training(&self, id: EntityId) -> Result<TrainedModel, StoreError>;

    /// Transition `training -> trained`, writing payload and metadata in one
    /// update. Rejected if a previous payload exists and the feature name
    /// list differs — a new feature set requires a new model record.
    async fn mark_trained(
        &self,
        id: EntityId,
        outcome: TrainingOutcome,
    ) -> Result<TrainedModel, StoreError>;

    /// Transition `training -> error` with a message. Never touches an
    /// existing payload.
    async fn mark_training_error(
        &self,
        id: EntityId,
        message: &str,
    ) -> Result<TrainedModel, StoreError>;

    /// The most recently updated `trained` model that has a payload.
    async fn latest_trained(&self) -> Result<Option<TrainedModel>, StoreError>;
}
