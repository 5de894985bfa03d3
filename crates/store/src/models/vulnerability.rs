//! Vulnerability entity and DTOs.

use serde::{Deserialize, Serialize};
use vulnscan_core::enums::{
    BusinessImpact, DataClassification, ExploitMaturity, RemediationStatus, Severity,
    SystemExposure,
};
use vulnscan_core::finding::NormalizedFinding;
use vulnscan_core::types::{EntityId, Timestamp};

/// A single normalized security issue, tied to at most one scan and one
/// asset. Always created through finding normalization except for ad-hoc
/// prediction requests, which stay transient and unpersisted.
#[derive(Debug, Clone, Serialize)]
pub struct Vulnerability {
    pub id: EntityId,
    pub scan_id: Option<EntityId>,
    pub asset_id: Option<EntityId>,
    pub title: String,
    pub description: String,
    pub cve_id: String,
    pub severity: Severity,
    pub cvss_score: f64,
    pub cvss_vector: String,
    pub affected_component: String,
    pub affected_version: String,
    pub exploit_available: bool,
    pub exploit_maturity: Option<ExploitMaturity>,
    pub patch_available: bool,
    pub business_impact: Option<BusinessImpact>,
    pub data_classification: Option<DataClassification>,
    pub system_exposure: Option<SystemExposure>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
    pub status: RemediationStatus,
    /// Predicted priority, absent until scored.
    pub priority_score: Option<f64>,
    pub priority_explanation: Option<String>,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Vulnerability {
    /// View this record as a normalized finding, for feature extraction.
    pub fn as_finding(&self) -> NormalizedFinding {
        NormalizedFinding {
            title: self.title.clone(),
            description: self.description.clone(),
            cve_id: self.cve_id.clone(),
            severity: self.severity,
            cvss_score: self.cvss_score,
            cvss_vector: self.cvss_vector.clone(),
            affected_component: self.affected_component.clone(),
            affected_version: self.affected_version.clone(),
            exploit_available: self.exploit_available,
            exploit_maturity: self.exploit_maturity,
            patch_available: self.patch_available,
            business_impact: self.business_impact,
            data_classification: self.data_classification,
            system_exposure: self.system_exposure,
            metadata: self.metadata.clone(),
            duplicate: false,
        }
    }
}

/// Insert DTO. Built from a normalized finding plus its (scan, asset) pair.
#[derive(Debug, Clone, Deserialize)]
pub struct NewVulnerability {
    pub scan_id: Option<EntityId>,
    pub asset_id: Option<EntityId>,
    pub finding: NormalizedFinding,
}

impl NewVulnerability {
    pub fn from_finding(
        finding: NormalizedFinding,
        scan_id: EntityId,
        asset_id: EntityId,
    ) -> Self {
        Self {
            scan_id: Some(scan_id),
            asset_id: Some(asset_id),
            finding,
        }
    }
}

/// Compact view of a vulnerability for scan result listings.
#[derive(Debug, Clone, Serialize)]
pub struct VulnerabilitySummary {
    pub id: EntityId,
    pub title: String,
    pub severity: Severity,
    pub cvss_score: f64,
    pub cve_id: String,
    pub status: RemediationStatus,
    pub priority_score: Option<f64>,
}

impl From<&Vulnerability> for VulnerabilitySummary {
    fn from(v: &Vulnerability) -> Self {
        Self {
            id: v.id,
            title: v.title.clone(),
            severity: v.severity,
            cvss_score: v.cvss_score,
            cve_id: v.cve_id.clone(),
            status: v.status,
            priority_score: v.priority_score,
        }
    }
}
