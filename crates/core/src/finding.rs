//! Canonical finding normalization.
//!
//! Scanner adapters emit [`RawFinding`] records using the canonical field
//! names but with no guarantees about presence or domain validity — every
//! field is optional and every enum-valued field is a free string.
//! [`normalize_finding`] turns one into a [`NormalizedFinding`] with all
//! defaults applied and all enum fields coerced into their domains.

use serde::{Deserialize, Serialize};

use crate::enums::{
    parse_optional, BusinessImpact, DataClassification, ExploitMaturity, Severity, SystemExposure,
};

/// Default title when a scanner reports none.
pub const DEFAULT_TITLE: &str = "Unknown";

// ---------------------------------------------------------------------------
// Raw adapter output
// ---------------------------------------------------------------------------

/// A single finding as emitted by a scanner adapter.
///
/// Field names match the canonical schema; values are whatever the tool
/// produced. Missing keys deserialize to their defaults rather than failing,
/// so a shape deviation in tool output can never crash normalization.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RawFinding {
    pub title: Option<String>,
    pub description: Option<String>,
    pub cve_id: Option<String>,
    pub severity: Option<String>,
    pub cvss_score: Option<f64>,
    pub cvss_vector: Option<String>,
    pub affected_component: Option<String>,
    pub affected_version: Option<String>,
    pub exploit_available: Option<bool>,
    pub exploit_maturity: Option<String>,
    pub patch_available: Option<bool>,
    pub business_impact: Option<String>,
    pub data_classification: Option<String>,
    pub system_exposure: Option<String>,
    pub metadata: serde_json::Map<String, serde_json::Value>,
}

// ---------------------------------------------------------------------------
// Normalized output
// ---------------------------------------------------------------------------

/// A finding with all canonical defaults applied and enum fields coerced
/// into their domains. Tied to a (scan, asset) pair by the caller when it
/// becomes a persisted vulnerability record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizedFinding {
    pub title: String,
    pub description: String,
    pub cve_id: String,
    pub severity: Severity,
    /// Always within `[0.0, 10.0]`.
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
    /// Set by [`flag_duplicates`] when an earlier finding in the same batch
    /// reports the same CVE against the same component and version.
    pub duplicate: bool,
}

/// Normalize one raw finding.
///
/// Defaults: missing title -> "Unknown", missing description -> empty,
/// missing severity -> low, missing CVSS -> 0.0 (clamped to `[0, 10]`),
/// missing booleans -> false. Out-of-domain enum values coerce (severity
/// to low, optional-context enums to unset) instead of erroring.
pub fn normalize_finding(raw: &RawFinding) -> NormalizedFinding {
    let severity = raw
        .severity
        .as_deref()
        .map(Severity::parse_or_low)
        .unwrap_or(Severity::Low);

    let cvss_score = raw.cvss_score.unwrap_or(0.0).clamp(0.0, 10.0);

    NormalizedFinding {
        title: raw
            .title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or(DEFAULT_TITLE)
            .to_string(),
        description: raw.description.clone().unwrap_or_default(),
        cve_id: raw.cve_id.clone().unwrap_or_default(),
        severity,
        cvss_score,
        cvss_vector: raw.cvss_vector.clone().unwrap_or_default(),
        affected_component: raw.affected_component.clone().unwrap_or_default(),
        affected_version: raw.affected_version.clone().unwrap_or_default(),
        exploit_available: raw.exploit_available.unwrap_or(false),
        exploit_maturity: raw
            .exploit_maturity
            .as_deref()
            .and_then(|s| parse_optional(s, ExploitMaturity::from_str)),
        patch_available: raw.patch_available.unwrap_or(false),
        business_impact: raw
            .business_impact
            .as_deref()
            .and_then(|s| parse_optional(s, BusinessImpact::from_str)),
        data_classification: raw
            .data_classification
            .as_deref()
            .and_then(|s| parse_optional(s, DataClassification::from_str)),
        system_exposure: raw
            .system_exposure
            .as_deref()
            .and_then(|s| parse_optional(s, SystemExposure::from_str)),
        metadata: raw.metadata.clone(),
        duplicate: false,
    }
}

/// Normalize a whole adapter batch and flag within-batch duplicates.
pub fn normalize_findings(raw: &[RawFinding]) -> Vec<NormalizedFinding> {
    let mut findings: Vec<NormalizedFinding> = raw.iter().map(normalize_finding).collect();
    flag_duplicates(&mut findings);
    findings
}

/// Mark later entries that repeat an earlier entry's non-empty CVE against
/// the same component and version. Findings from different scans are never
/// compared; deduplication across scans is a caller policy.
pub fn flag_duplicates(findings: &mut [NormalizedFinding]) {
    let mut seen: std::collections::HashSet<(String, String, String)> = Default::default();
    for finding in findings.iter_mut() {
        if finding.cve_id.is_empty() {
            continue;
        }
        let key = (
            finding.cve_id.clone(),
            finding.affected_component.clone(),
            finding.affected_version.clone(),
        );
        if !seen.insert(key) {
            finding.duplicate = true;
        }
    }
}

// ---------------------------------------------------------------------------
// Aggregate counts
// ---------------------------------------------------------------------------

/// Per-severity finding counts for a scan summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityCounts {
    pub total: u32,
    pub critical: u32,
    pub high: u32,
    pub medium: u32,
    pub low: u32,
}

/// Compute aggregate counts from a set of findings.
///
/// Scan summary counts are always recomputed from the full finding set at
/// completion time; they are never incremented piecemeal.
pub fn severity_counts<'a, I>(findings: I) -> SeverityCounts
where
    I: IntoIterator<Item = &'a NormalizedFinding>,
{
    let mut counts = SeverityCounts::default();
    for finding in findings {
        counts.total += 1;
        match finding.severity {
            Severity::Critical => counts.critical += 1,
            Severity::High => counts.high += 1,
            Severity::Medium => counts.medium += 1,
            Severity::Low => counts.low += 1,
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
