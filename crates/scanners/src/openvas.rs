//! OpenVAS adapter.
//!
//! OpenVAS deployments differ too much for a single hardcoded invocation,
//! so the adapter executes a configured command (typically a wrapper around
//! `gvm-cli` or `omp`) that takes the target host as its final argument and
//! prints a JSON result list on stdout.

use async_trait::async_trait;
use serde::Deserialize;
use vulnscan_core::enums::{ScanDepth, ScannerKind};
use vulnscan_core::finding::RawFinding;

use crate::adapter::{parse_json, run_tool, AdapterResult, ScanRequest, ScannerAdapter, ToolError};

/// Adapter wrapping an OpenVAS command-line frontend.
pub struct OpenVasAdapter {
    program: String,
    base_args: Vec<String>,
}

impl OpenVasAdapter {
    /// `command` is the full invocation split into words, e.g.
    /// `["gvm-script", "--gmp-username", "admin", "scan.gmp.py"]`.
    /// The first word is the program, the rest are leading arguments.
    pub fn new(command: &[String]) -> Self {
        let (program, base_args) = match command.split_first() {
            Some((program, rest)) => (program.clone(), rest.to_vec()),
            None => ("openvas-scan".to_string(), Vec::new()),
        };
        Self { program, base_args }
    }

    fn build_args(&self, request: &ScanRequest) -> Vec<String> {
        let mut args = self.base_args.clone();

        // Depth selects the scan config profile.
        let profile = match request.depth {
            ScanDepth::Quick => "Discovery",
            ScanDepth::Normal => "Full and fast",
            ScanDepth::Deep => "Full and very deep",
        };
        args.push("--profile".to_string());
        args.push(profile.to_string());

        args.push(request.target_identifier.clone());
        args
    }

    async fn scan(
        &self,
        request: &ScanRequest,
    ) -> Result<(Vec<RawFinding>, serde_json::Value), ToolError> {
        let args = self.build_args(request);
        let stdout = run_tool(&self.program, &args).await?;
        let raw_output = parse_json(&stdout)?;
        let report: OpenVasReport = serde_json::from_value(raw_output.clone())
            .map_err(|e| ToolError::Parse(e.to_string()))?;
        Ok((map_findings(&report), raw_output))
    }
}

#[async_trait]
impl ScannerAdapter for OpenVasAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::OpenVas
    }

    async fn run(&self, request: &ScanRequest) -> AdapterResult {
        tracing::info!(
            scan_id = %request.scan_id,
            target = %request.target_identifier,
            "Running OpenVAS scan",
        );
        match self.scan(request).await {
            Ok((findings, raw_output)) => AdapterResult::Success {
                findings,
                raw_output,
            },
            Err(e) => {
                tracing::error!(scan_id = %request.scan_id, error = %e, "OpenVAS scan failed");
                AdapterResult::failed(format!("OpenVAS scan failed: {e}"))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OpenVAS JSON result structures
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct OpenVasReport {
    #[serde(default)]
    results: Vec<OpenVasResult>,
}

#[derive(Debug, Deserialize)]
struct OpenVasResult {
    name: Option<String>,
    description: Option<String>,
    cve: Option<String>,
    severity: Option<f64>,
    threat: Option<String>,
    host: Option<String>,
    port: Option<String>,
    nvt_oid: Option<String>,
}

fn map_findings(report: &OpenVasReport) -> Vec<RawFinding> {
    report
        .results
        .iter()
        .map(|result| {
            let mut metadata = serde_json::Map::new();
            metadata.insert(
                "port".to_string(),
                result.port.clone().unwrap_or_default().into(),
            );
            metadata.insert(
                "nvt_oid".to_string(),
                result.nvt_oid.clone().unwrap_or_default().into(),
            );

            RawFinding {
                title: result.name.clone(),
                description: result.description.clone(),
                // "NOCVE" is OpenVAS for no identifier assigned.
                cve_id: result
                    .cve
                    .clone()
                    .filter(|cve| cve != "NOCVE"),
                severity: result.threat.as_deref().map(str::to_lowercase),
                cvss_score: result.severity,
                affected_component: result.host.clone(),
                metadata,
                ..Default::default()
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::enums::TargetType;
    use vulnscan_core::types::EntityId;

    fn request(depth: ScanDepth) -> ScanRequest {
        ScanRequest {
            scan_id: EntityId::new_v4(),
            target_type: TargetType::Host,
            target_identifier: "10.0.0.12".to_string(),
            depth,
            scanner_config: Default::default(),
        }
    }

    const SAMPLE_REPORT: &str = r#"{
        "results": [
            {
                "name": "OpenSSH < 8.0 Multiple Vulnerabilities",
                "description": "The remote host is running an outdated OpenSSH.",
                "cve": "CVE-2019-6111",
                "severity": 5.9,
                "threat": "Medium",
                "host": "10.0.0.12",
                "port": "22/tcp",
                "nvt_oid": "1.3.6.1.4.1.25623.1.0.142442"
            },
            {
                "name": "Service Detection",
                "cve": "NOCVE",
                "severity": 0.0,
                "threat": "Log",
                "host": "10.0.0.12"
            }
        ]
    }"#;

    #[test]
    fn maps_results_to_canonical_fields() {
        let report: OpenVasReport = serde_json::from_str(SAMPLE_REPORT).unwrap();
        let findings = map_findings(&report);
        assert_eq!(findings.len(), 2);

        let first = &findings[0];
        assert_eq!(
            first.title.as_deref(),
            Some("OpenSSH < 8.0 Multiple Vulnerabilities")
        );
        assert_eq!(first.cve_id.as_deref(), Some("CVE-2019-6111"));
        assert_eq!(first.severity.as_deref(), Some("medium"));
        assert_eq!(first.cvss_score, Some(5.9));
        assert_eq!(first.affected_component.as_deref(), Some("10.0.0.12"));
        assert_eq!(
            first.metadata.get("port").and_then(|v| v.as_str()),
            Some("22/tcp")
        );
    }

    #[test]
    fn nocve_marker_maps_to_none() {
        let report: OpenVasReport = serde_json::from_str(SAMPLE_REPORT).unwrap();
        let findings = map_findings(&report);
        assert_eq!(findings[1].cve_id, None);
    }

    #[test]
    fn depth_selects_scan_profile() {
        let adapter = OpenVasAdapter::new(&["gvm-scan".to_string(), "--json".to_string()]);

        let args = adapter.build_args(&request(ScanDepth::Quick));
        assert_eq!(args[0], "--json");
        assert!(args.contains(&"Discovery".to_string()));

        let args = adapter.build_args(&request(ScanDepth::Deep));
        assert!(args.contains(&"Full and very deep".to_string()));
        assert_eq!(args.last().map(String::as_str), Some("10.0.0.12"));
    }

    #[tokio::test]
    async fn missing_command_reports_failed_result() {
        let adapter = OpenVasAdapter::new(&["/nonexistent/gvm-scan".to_string()]);
        match adapter.run(&request(ScanDepth::Normal)).await {
            AdapterResult::Failed { message } => {
                assert!(message.contains("OpenVAS scan failed"));
            }
            AdapterResult::Success { .. } => panic!("expected failure"),
        }
    }
}
