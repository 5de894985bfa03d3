//! OWASP Dependency-Check adapter.
//!
//! Dependency-Check writes its JSON report to a file rather than stdout,
//! so the adapter points `--out` at a scratch directory, reads the report
//! back, and lets the directory clean itself up on drop.

use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use vulnscan_core::enums::{ScanDepth, ScannerKind};
use vulnscan_core::finding::RawFinding;

use crate::adapter::{parse_json, run_tool, AdapterResult, ScanRequest, ScannerAdapter, ToolError};

/// Report file name inside the scratch directory.
const REPORT_FILE: &str = "dependency-check-report.json";

/// Adapter wrapping the Dependency-Check CLI.
pub struct DependencyCheckAdapter {
    binary_path: String,
}

impl DependencyCheckAdapter {
    pub fn new(binary_path: impl Into<String>) -> Self {
        Self {
            binary_path: binary_path.into(),
        }
    }

    fn build_args(request: &ScanRequest, report_path: &Path) -> Vec<String> {
        let mut args = vec![
            "--scan".to_string(),
            request.target_identifier.clone(),
            "--format".to_string(),
            "JSON".to_string(),
            "--out".to_string(),
            report_path.to_string_lossy().to_string(),
        ];

        match request.depth {
            ScanDepth::Quick => args.push("--disableRetireJS".to_string()),
            ScanDepth::Deep => args.push("--enableExperimental".to_string()),
            ScanDepth::Normal => {}
        }

        args
    }

    async fn scan(
        &self,
        request: &ScanRequest,
    ) -> Result<(Vec<RawFinding>, serde_json::Value), ToolError> {
        let scratch = tempfile::tempdir()?;
        let report_path = scratch.path().join(REPORT_FILE);

        let args = Self::build_args(request, &report_path);
        run_tool(&self.binary_path, &args).await?;

        let report_json = tokio::fs::read_to_string(&report_path)
            .await
            .map_err(|e| ToolError::Parse(format!("report file missing: {e}")))?;
        let raw_output = parse_json(&report_json)?;
        let report: DependencyCheckReport = serde_json::from_value(raw_output.clone())
            .map_err(|e| ToolError::Parse(e.to_string()))?;

        Ok((map_findings(&report), raw_output))
    }
}

#[async_trait]
impl ScannerAdapter for DependencyCheckAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::DependencyCheck
    }

    async fn run(&self, request: &ScanRequest) -> AdapterResult {
        tracing::info!(
            scan_id = %request.scan_id,
            target = %request.target_identifier,
            "Running Dependency-Check scan",
        );
        match self.scan(request).await {
            Ok((findings, raw_output)) => AdapterResult::Success {
                findings,
                raw_output,
            },
            Err(e) => {
                tracing::error!(
                    scan_id = %request.scan_id,
                    error = %e,
                    "Dependency-Check scan failed",
                );
                AdapterResult::failed(format!("Dependency-Check scan failed: {e}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Dependency-Check JSON report structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct DependencyCheckReport {
    #[serde(default)]
    dependencies: Vec<Dependency>,
}

#[derive(Debug, Deserialize)]
struct Dependency {
    #[serde(rename = "fileName")]
    file_name: Option<String>,
    version: Option<String>,
    #[serde(default)]
    vulnerabilities: Vec<DependencyVulnerability>,
}

#[derive(Debug, Deserialize)]
struct DependencyVulnerability {
    name: Option<String>,
    description: Option<String>,
    severity: Option<String>,
    cvssv3: Option<CvssV3>,
    #[serde(default)]
    references: Vec<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct CvssV3 {
    #[serde(rename = "baseScore")]
    base_score: Option<f64>,
    #[serde(rename = "attackVector")]
    attack_vector: Option<String>,
}

fn map_findings(report: &DependencyCheckReport) -> Vec<RawFinding> {
    let mut findings = Vec::new();
    for dependency in &report.dependencies {
        for vuln in &dependency.vulnerabilities {
            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "package_name".to_string(),
                dependency.file_name.clone().unwrap_or_default().into(),
            );
            metadata.insert(
                "references".to_string(),
                serde_json::Value::from(vuln.references.clone()),
            );

            findings.push(RawFinding {
                title: vuln.name.clone(),
                description: vuln.description.clone(),
                cve_id: vuln.name.clone(),
                severity: vuln.severity.as_deref().map(str::to_lowercase),
                cvss_score: vuln.cvssv3.as_ref().and_then(|c| c.base_score),
                cvss_vector: vuln.cvssv3.as_ref().and_then(|c| c.attack_vector.clone()),
                affected_component: dependency.file_name.clone(),
                affected_version: dependency.version.clone(),
                // Dependency-Check does not report exploit intelligence;
                // a patch is assumed available for dependency upgrades.
                exploit_available: Some(false),
                patch_available: Some(true),
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
