//! Trivy adapter.
//!
//! Invokes `trivy --format json` and maps its report onto canonical
//! findings. Scan depth translates to `--light` (quick) or
//! `--list-all-pkgs` (deep); container targets scan in `image` mode and
//! repository targets in `fs` mode.

use async_trait::async_trait;
use serde::Deserialize;
use vulnscan_core::enums::{ScanDepth, ScannerKind, TargetType};
use vulnscan_core::finding::RawFinding;

use crate::adapter::{parse_json, run_tool, AdapterResult, ScanRequest, ScannerAdapter, ToolError};

/// Adapter wrapping the Trivy CLI.
pub struct TrivyAdapter {
    binary_path: String,
}

impl TrivyAdapter {
    /// `binary_path` is the trivy executable, e.g. `"trivy"` or an
    /// absolute path from configuration.
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn build_args(request: &ScanRequest) -> Vec<String> {
        let mut args = vec![
            "--format".to_string(),
            "json".to_string(),
            "--severity".to_string(),
            "CRITICAL,HIGH,MEDIUM,LOW".to_string(),
        ];

        match request.depth {
            ScanDepth::Quick => args.push("--light".to_string()),
            ScanDepth::Deep => args.push("--list-all-pkgs".to_string()),
            ScanDepth::Normal => {}
        }

        match request.target_type {
            TargetType::Container => args.push("image".to_string()),
            TargetType::Repository => args.push("fs".to_string()),
            // Host and application targets pass the identifier through
            // unchanged; trivy decides whether it can handle it.
            TargetType::Host | TargetType::Application => {}
        }

        args.push(request.target_identifier.clone());
        args
    }

    async fn scan(&self, request: &ScanRequest) -> Result<(Vec<RawFinding>, serde_json::Value), ToolError> {
        let args = Self::build_args(request);
        let stdout = run_tool(&self.binary_path, &args).await?;
        let raw_output = parse_json(&stdout)?;
        let report: TrivyReport = serde_json::from_value(raw_output.clone())
            .map_err(|e| ToolError::Parse(e.to_string()))?;
        Ok((map_findings(&report), raw_output))
    }
}

#[async_trait]
impl ScannerAdapter for TrivyAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Trivy
    }

    async fn run(&self, request: &ScanRequest) -> AdapterResult {
        tracing::info!(
            scan_id = %request.scan_id,
            target = %request.target_identifier,
            "Running Trivy scan",
        );
        match self.scan(request).await {
            Ok((findings, raw_output)) => AdapterResult::Success {
                findings,
                raw_output,
            },
            Err(e) => {
                tracing::error!(scan_id = %request.scan_id, error = %e, "Trivy scan failed");
                AdapterResult::failed(format!("Trivy scan failed: {e}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Trivy JSON report structures
// ---------------------------------------------------------------------------

/// Top-level trivy JSON report. Every field is optional so that shape
/// deviations degrade to empty findings instead of parse failures.
#[derive(Debug, Deserialize)]
struct TrivyReport {
    #[serde(default, rename = "Results")]
    results: Vec<TrivyResult>,
}

#[derive(Debug, Deserialize)]
struct TrivyResult {
    #[serde(rename = "Target")]
    target: Option<String>,
    #[serde(default, rename = "Vulnerabilities")]
    vulnerabilities: Vec<TrivyVulnerability>,
}

#[derive(Debug, Deserialize)]
struct TrivyVulnerability {
    #[serde(rename = "VulnerabilityID")]
    vulnerability_id: Option<String>,
    #[serde(rename = "Title")]
    title: Option<String>,
    #[serde(rename = "Description")]
    description: Option<String>,
    #[serde(rename = "Severity")]
    severity: Option<String>,
    #[serde(rename = "PkgName")]
    pkg_name: Option<String>,
    #[serde(rename = "InstalledVersion")]
    installed_version: Option<String>,
    #[serde(rename = "FixedVersion")]
    fixed_version: Option<String>,
    #[serde(rename = "ExploitAvailable")]
    exploit_available: Option<bool>,
    #[serde(rename = "CVSS")]
    cvss: Option<TrivyCvss>,
    #[serde(default, rename = "References")]
    references: Vec<String>,
}

/// CVSS block keyed by source; only the NVD entry is used.
#[derive(Debug, Deserialize)]
struct TrivyCvss {
    nvd: Option<TrivyCvssEntry>,
}

#[derive(Debug, Deserialize)]
struct TrivyCvssEntry {
    #[serde(rename = "V3Score")]
    v3_score: Option<f64>,
    #[serde(rename = "V3Vector")]
    v3_vector: Option<String>,
}

fn map_findings(report: &TrivyReport) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    for result in &report.results {
        for vuln in &result.vulnerabilities {
            let nvd = vuln.cvss.as_ref().and_then(|c| c.nvd.as_ref());
            let fixed_version = vuln.fixed_version.clone().unwrap_or_default();

            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "package_name".to_string(),
                vuln.pkg_name.clone().unwrap_or_default().into(),
            );
            metadata.insert("fixed_version".to_string(), fixed_version.clone().into());
            metadata.insert(
                "references".to_string(),
                serde_json::Value::from(vuln.references.clone()),
            );

            findings.push(RawFinding {
                title: vuln
                    .title
                    .clone()
                    .or_else(|| vuln.vulnerability_id.clone()),
                description: vuln.description.clone(),
                cve_id: vuln.vulnerability_id.clone(),
                severity: vuln.severity.as_deref().map(str::to_lowercase),
                cvss_score: nvd.and_then(|n| n.v3_score),
                cvss_vector: nvd.and_then(|n| n.v3_vector.clone()),
                affected_component: result.target.clone(),
                affected_version: vuln.installed_version.clone(),
                exploit_available: vuln.exploit_available,
                patch_available: Some(!fixed_version.is_empty()),
                metadata,
                ..Default::default()
            });
        }
    }
    findings
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
