//! Scan entity and DTOs.

use serde::{Deserialize, Serialize};
use vulnscan_core::enums::{ScanDepth, ScanStatus, ScannerKind, TargetType};
use vulnscan_core::finding::SeverityCounts;
use vulnscan_core::types::{EntityId, Timestamp};

/// One invocation (or scheduled recurrence) of a scanner against a target.
#[derive(Debug, Clone, Serialize)]
pub struct Scan {
    pub id: EntityId,
    pub name: String,
    pub description: Option<String>,
    pub scanner_kind: ScannerKind,
    pub asset_id: EntityId,
    pub target_type: TargetType,
    /// Opaque target identifier, e.g. an image ref or URL.
    pub target_identifier: String,
    pub depth: ScanDepth,
    /// Recurrence descriptor for scheduled scans (e.g. "daily"), if any.
    pub scan_frequency: Option<String>,
    /// Scanner-specific configuration, passed through to the adapter.
    pub scanner_config: serde_json::Map<String, serde_json::Value>,
    pub status: ScanStatus,
    /// Human-readable completion or failure message.
    pub status_message: Option<String>,
    /// Aggregate counts, recomputed from this scan's findings when the scan
    /// reaches a terminal state.
    pub counts: SeverityCounts,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
    pub started_at: Option<Timestamp>,
    pub completed_at: Option<Timestamp>,
}

/// DTO for creating a scan. New scans always start in `pending`.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateScan {
    pub name: String,
    pub description: Option<String>,
    pub scanner_kind: ScannerKind,
    pub asset_id: EntityId,
    pub target_type: TargetType,
    pub target_identifier: String,
    pub depth: ScanDepth,
    pub scan_frequency: Option<String>,
    #[serde(default)]
    pub scanner_config: serde_json::Map<String, serde_json::Value>,
}

/// DTO for patching scan configuration. All fields optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateScan {
    pub name: Option<String>,
    pub description: Option<String>,
    pub depth: Option<ScanDepth>,
    pub scan_frequency: Option<String>,
    pub scanner_config: Option<serde_json::Map<String, serde_json::Value>>,
}

/// Filters for listing scans.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ScanListQuery {
    pub status: Option<ScanStatus>,
    pub scanner_kind: Option<ScannerKind>,
    pub asset_id: Option<EntityId>,
    /// Maximum number of results. Defaults to 50, capped at 100.
    pub limit: Option<usize>,
    /// Number of results to skip. Defaults to 0.
    pub offset: Option<usize>,
}
