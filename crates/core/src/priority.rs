//! Priority score interpretation: class thresholds, confidence, explanation
//! text, and recommended remediation actions.

use serde::{Deserialize, Serialize};

use crate::finding::NormalizedFinding;

/// Number of top contributing features cited in an explanation.
const EXPLANATION_TOP_FEATURES: usize = 3;

// ---------------------------------------------------------------------------
// Priority class
// ---------------------------------------------------------------------------

/// Priority class derived from a continuous score via fixed thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityClass {
    Critical,
    High,
    Medium,
    Low,
}

impl PriorityClass {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

impl std::fmt::Display for PriorityClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Map a priority score to its class.
///
/// Thresholds are inclusive: `>= 0.8` critical, `>= 0.6` high,
/// `>= 0.4` medium, otherwise low.
pub fn priority_class(score: f64) -> PriorityClass {
    if score >= 0.8 {
        PriorityClass::Critical
    } else if score >= 0.6 {
        PriorityClass::High
    } else if score >= 0.4 {
        PriorityClass::Medium
    } else {
        PriorityClass::Low
    }
}

/// Confidence in a prediction, based on how far the score sits from the
/// 0.5 decision boundary: `min(1, max(0, |score - 0.5| * 2))`.
pub fn confidence(score: f64) -> f64 {
    ((score - 0.5).abs() * 2.0).clamp(0.0, 1.0)
}

/// Recommended action string, keyed purely by priority class.
pub fn recommended_action(class: PriorityClass) -> &'static str {
    match class {
        PriorityClass::Critical => {
            "Immediate remediation required. Create high-priority ticket and patch within 24 hours."
        }
        PriorityClass::High => "Remediate within 7 days. Create ticket and schedule patching.",
        PriorityClass::Medium => "Remediate within 30 days. Include in next patch cycle.",
        PriorityClass::Low => {
            "Remediate as part of regular maintenance. No immediate action required."
        }
    }
}

// ---------------------------------------------------------------------------
// Explanation
// ---------------------------------------------------------------------------

/// Phrase describing one contributing feature, or `None` when the feature's
/// sign does not support a meaningful statement (e.g. an absent exploit).
fn feature_phrase(name: &str, contribution: f64, finding: &NormalizedFinding) -> Option<String> {
    if name == "cvss_score" && contribution > 0.0 {
        Some(format!("high CVSS score ({})", finding.cvss_score))
    } else if name == "exploit_available" && contribution > 0.0 {
        Some("publicly available exploit".to_string())
    } else if name == "patch_available" && contribution < 0.0 {
        Some("available patch".to_string())
    } else if let Some(severity) = name.strip_prefix("severity_") {
        (contribution > 0.0).then(|| format!("{severity} severity"))
    } else if let Some(impact) = name.strip_prefix("business_impact_") {
        (contribution > 0.0 && impact != "unknown").then(|| format!("{impact} business impact"))
    } else if let Some(exposure) = name.strip_prefix("system_exposure_") {
        (contribution > 0.0 && exposure != "unknown").then(|| format!("{exposure} system exposure"))
    } else if let Some(maturity) = name.strip_prefix("exploit_maturity_") {
        (contribution > 0.0 && maturity != "unknown")
            .then(|| format!("{maturity} exploit maturity"))
    } else {
        None
    }
}

/// Generate a human-readable explanation for a prediction.
///
/// Cites the top contributing features by absolute contribution. Features
/// whose contribution sign carries no readable statement are skipped.
pub fn generate_explanation(
    score: f64,
    contributions: &[(String, f64)],
    finding: &NormalizedFinding,
) -> String {
    let class = priority_class(score);

    let mut sorted: Vec<&(String, f64)> = contributions.iter().collect();
    sorted.sort_by(|a, b| b.1.abs().total_cmp(&a.1.abs()));

    let mut explanation = format!(
        "This vulnerability has been classified as {class} priority with a score of {score:.2}."
    );

    let phrases: Vec<String> = sorted
        .iter()
        .take(EXPLANATION_TOP_FEATURES)
        .filter_map(|(name, contribution)| feature_phrase(name, *contribution, finding))
        .collect();

    if !phrases.is_empty() {
        explanation.push_str(" The main factors contributing to this classification are: ");
        explanation.push_str(&phrases.join(", "));
        explanation.push('.');
    }

    explanation
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
