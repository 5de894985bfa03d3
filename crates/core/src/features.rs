//! Feature extraction for vulnerability prioritization.
//!
//! Deterministic, pure mapping from a normalized finding's semantic fields
//! to a fixed-order numeric vector. Numeric fields pass through, booleans
//! cast to 0/1, and categorical fields expand to one-hot indicators with an
//! explicit `_unknown` bucket for the optional-context enums.
//!
//! The ordering produced by [`extract_features`] is persisted with a trained
//! model and replayed byte-for-byte at prediction time via
//! [`feature_vector_for`]; a feature missing from the record scores 0.0
//! rather than erroring, so partially-specified ad-hoc records still score.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::enums::{
    BusinessImpact, DataClassification, ExploitMaturity, Severity, SystemExposure,
};
use crate::finding::NormalizedFinding;

/// A named feature vector. `names[i]` labels `values[i]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub names: Vec<String>,
    pub values: Vec<f64>,
}

// ---------------------------------------------------------------------------
// Extraction
// ---------------------------------------------------------------------------

fn one_hot<T: Copy + PartialEq>(
    out: &mut Vec<(String, f64)>,
    prefix: &str,
    value: Option<T>,
    variants: &[(T, &str)],
    with_unknown: bool,
) {
    for (variant, label) in variants {
        let hit = value == Some(*variant);
        out.push((format!("{prefix}_{label}"), if hit { 1.0 } else { 0.0 }));
    }
    if with_unknown {
        let hit = value.is_none();
        out.push((format!("{prefix}_unknown"), if hit { 1.0 } else { 0.0 }));
    }
}

fn feature_pairs(finding: &NormalizedFinding) -> Vec<(String, f64)> {
    let mut pairs = vec![
        ("cvss_score".to_string(), finding.cvss_score),
        (
            "exploit_available".to_string(),
            if finding.exploit_available { 1.0 } else { 0.0 },
        ),
        (
            "patch_available".to_string(),
            if finding.patch_available { 1.0 } else { 0.0 },
        ),
    ];

    // Severity is always known (normalization defaults it to low), so it
    // carries no unknown bucket.
    one_hot(
        &mut pairs,
        "severity",
        Some(finding.severity),
        &[
            (Severity::Critical, "critical"),
            (Severity::High, "high"),
            (Severity::Medium, "medium"),
            (Severity::Low, "low"),
        ],
        false,
    );
    one_hot(
        &mut pairs,
        "exploit_maturity",
        finding.exploit_maturity,
        &[
            (ExploitMaturity::High, "high"),
            (ExploitMaturity::Functional, "functional"),
            (ExploitMaturity::Poc, "poc"),
            (ExploitMaturity::Unproven, "unproven"),
        ],
        true,
    );
    one_hot(
        &mut pairs,
        "business_impact",
        finding.business_impact,
        &[
            (BusinessImpact::Critical, "critical"),
            (BusinessImpact::High, "high"),
            (BusinessImpact::Medium, "medium"),
            (BusinessImpact::Low, "low"),
        ],
        true,
    );
    one_hot(
        &mut pairs,
        "data_classification",
        finding.data_classification,
        &[
            (DataClassification::Restricted, "restricted"),
            (DataClassification::Confidential, "confidential"),
            (DataClassification::Internal, "internal"),
            (DataClassification::Public, "public"),
        ],
        true,
    );
    one_hot(
        &mut pairs,
        "system_exposure",
        finding.system_exposure,
        &[
            (SystemExposure::Internet, "internet"),
            (SystemExposure::Intranet, "intranet"),
            (SystemExposure::Internal, "internal"),
            (SystemExposure::Isolated, "isolated"),
        ],
        true,
    );

    pairs
}

/// Extract the canonical, training-time feature vector.
pub fn extract_features(finding: &NormalizedFinding) -> FeatureVector {
    let (names, values) = feature_pairs(finding).into_iter().unzip();
    FeatureVector { names, values }
}

/// The canonical feature name ordering, as produced by [`extract_features`].
pub fn canonical_feature_names() -> Vec<String> {
    extract_features(&crate::finding::normalize_finding(&Default::default())).names
}

/// Replay a persisted feature ordering against a record.
///
/// Any name the record does not produce (e.g. a feature added after the
/// model was trained, or vice versa) scores 0.0.
pub fn feature_vector_for(names: &[String], finding: &NormalizedFinding) -> Vec<f64> {
    let map: HashMap<String, f64> = feature_pairs(finding).into_iter().collect();
    names
        .iter()
        .map(|name| map.get(name).copied().unwrap_or(0.0))
        .collect()
}

// ---------------------------------------------------------------------------
// Feature descriptions
// ---------------------------------------------------------------------------

/// Human-readable description of a feature, used in explanations and
/// importance reports. Unknown names return an empty string.
pub fn feature_description(name: &str) -> &'static str {
    match name {
        "cvss_score" => "CVSS score indicating the severity of the vulnerability",
        "exploit_available" => "Whether an exploit is publicly available",
        "patch_available" => "Whether a patch is available for the vulnerability",
        "severity_critical" => "Vulnerability has critical severity",
        "severity_high" => "Vulnerability has high severity",
        "severity_medium" => "Vulnerability has medium severity",
        "severity_low" => "Vulnerability has low severity",
        "exploit_maturity_high" => "A reliable, widely available exploit exists",
        "exploit_maturity_functional" => "A functional exploit exists",
        "exploit_maturity_poc" => "A proof-of-concept exploit exists",
        "exploit_maturity_unproven" => "No practical exploit is known",
        "business_impact_critical" => "Vulnerability has critical business impact",
        "business_impact_high" => "Vulnerability has high business impact",
        "business_impact_medium" => "Vulnerability has medium business impact",
        "business_impact_low" => "Vulnerability has low business impact",
        "data_classification_restricted" => "Affected system holds restricted data",
        "data_classification_confidential" => "Affected system holds confidential data",
        "data_classification_internal" => "Affected system holds internal data",
        "data_classification_public" => "Affected system holds only public data",
        "system_exposure_internet" => "Affected system is exposed to the internet",
        "system_exposure_intranet" => "Affected system is reachable from the intranet",
        "system_exposure_internal" => "Affected system is internal",
        "system_exposure_isolated" => "Affected system is isolated",
        _ => "",
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
