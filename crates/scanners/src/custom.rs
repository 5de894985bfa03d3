//! Custom scanner adapter.
//!
//! Runs a user-supplied command taken from the scan's scanner
//! configuration and expects it to print findings on stdout already in the
//! canonical schema, as a JSON array or under a top-level `findings` key.
//! The `{target}` placeholder in any argument is replaced with the target
//! identifier; if no argument carries the placeholder, the identifier is
//! appended last.

use async_trait::async_trait;
use vulnscan_core::enums::ScannerKind;
use vulnscan_core::finding::RawFinding;

use crate::adapter::{parse_json, run_tool, AdapterResult, ScanRequest, ScannerAdapter, ToolError};

const TARGET_PLACEHOLDER: &str = "{target}";

/// Adapter that shells out to a configured command.
#[derive(Default)]
pub struct CustomAdapter;

impl CustomAdapter {
    pub fn new() -> Self {
        Self
    }

    /// Pull the command line out of scanner configuration. `command` is
    /// required; `args` is an optional array of strings.
    fn command_line(request: &ScanRequest) -> Result<(String, Vec<String>), ToolError> {
        let program = request
            .scanner_config
            .get("command")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                ToolError::Parse("custom scanner requires a 'command' in scanner config".into())
            })?
            .to_string();

        let mut args: Vec<String> = request
            .scanner_config
            .get("args")
            .and_then(|v| v.as_array())
            .map(|items| {
                items
                    .iter()
                    .filter_map(|v| v.as_str())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        let mut substituted = false;
        for arg in &mut args {
            if arg.contains(TARGET_PLACEHOLDER) {
                *arg = arg.replace(TARGET_PLACEHOLDER, &request.target_identifier);
                substituted = true;
            }
        }
        if !substituted {
            args.push(request.target_identifier.clone());
        }

        Ok((program, args))
    }

    async fn scan(
        &self,
        request: &ScanRequest,
    ) -> Result<(Vec<RawFinding>, serde_json::Value), ToolError> {
        let (program, args) = Self::command_line(request)?;
        let stdout = run_tool(&program, &args).await?;
        let raw_output = parse_json(&stdout)?;
        let findings = extract_findings(&raw_output)?;
        Ok((findings, raw_output))
    }
}

#[async_trait]
impl ScannerAdapter for CustomAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Custom
    }

    async fn run(&self, request: &ScanRequest) -> AdapterResult {
        tracing::info!(
            scan_id = %request.scan_id,
            target = %request.target_identifier,
            "Running custom scan",
        );
        match self.scan(request).await {
            Ok((findings, raw_output)) => AdapterResult::Success {
                findings,
                raw_output,
            },
            Err(e) => {
                tracing::error!(scan_id = %request.scan_id, error = %e, "Custom scan failed");
                AdapterResult::failed(format!("Custom scan failed: {e}"))
            }
        }
    }
}

fn extract_findings(output: &serde_json::Value) -> Result<Vec<RawFinding>, ToolError> {
    let list = match output {
        serde_json::Value::Array(_) => output.clone(),
        serde_json::Value::Object(map) => map
            .get("findings")
            .cloned()
            .unwrap_or(serde_json::Value::Array(Vec::new())),
        _ => {
            return Err(ToolError::Parse(
                "custom scanner output must be a JSON array or object".into(),
            ))
        }
    };
    serde_json::from_value(list).map_err(|e| ToolError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use vulnscan_core::enums::{ScanDepth, TargetType};
    use vulnscan_core::types::EntityId;

    fn request(config: serde_json::Value) -> ScanRequest {
        ScanRequest {
            scan_id: EntityId::new_v4(),
            target_type: TargetType::Application,
            target_identifier: "api.internal".to_string(),
            depth: ScanDepth::Normal,
            scanner_config: config.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn placeholder_substitutes_target() {
        let request = request(serde_json::json!({
            "command": "/opt/scan.sh",
            "args": ["--host", "{target}", "--json"]
        }));
        let (program, args) = CustomAdapter::command_line(&request).unwrap();
        assert_eq!(program, "/opt/scan.sh");
        assert_eq!(args, vec!["--host", "api.internal", "--json"]);
    }

    #[test]
    fn target_appended_without_placeholder() {
        let request = request(serde_json::json!({"command": "my-scanner"}));
        let (_, args) = CustomAdapter::command_line(&request).unwrap();
        assert_eq!(args, vec!["api.internal"]);
    }

    #[test]
    fn missing_command_is_an_error() {
        let request = request(serde_json::json!({}));
        assert!(CustomAdapter::command_line(&request).is_err());
    }

    #[test]
    fn extract_accepts_array_and_findings_key() {
        let array = serde_json::json!([{"title": "weak cipher", "severity": "medium"}]);
        let findings = extract_findings(&array).unwrap();
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title.as_deref(), Some("weak cipher"));

        let object = serde_json::json!({"findings": [{"title": "a"}, {"title": "b"}]});
        assert_eq!(extract_findings(&object).unwrap().len(), 2);

        let no_key = serde_json::json!({"status": "ok"});
        assert!(extract_findings(&no_key).unwrap().is_empty());

        assert!(extract_findings(&serde_json::json!("text")).is_err());
    }

    #[tokio::test]
    #[cfg(unix)]
    async fn echo_command_round_trips_findings() {
        let adapter = CustomAdapter::new();
        let req = request(serde_json::json!({
            "command": "echo",
            "args": [r#"[{"title": "open telnet on {target}", "severity": "medium"}]"#]
        }));
        match adapter.run(&req).await {
            AdapterResult::Success { findings, .. } => {
                assert_eq!(findings.len(), 1);
                assert_eq!(
                    findings[0].title.as_deref(),
                    Some("open telnet on api.internal")
                );
                assert_eq!(findings[0].severity.as_deref(), Some("medium"));
            }
            AdapterResult::Failed { message } => panic!("echo scan failed: {message}"),
        }
    }

    #[tokio::test]
    async fn missing_command_reports_failed_result() {
        let adapter = CustomAdapter::new();
        let req = request(serde_json::json!({}));
        match adapter.run(&req).await {
            AdapterResult::Failed { message } => {
                assert!(message.contains("Custom scan failed"));
            }
            AdapterResult::Success { .. } => panic!("expected failure"),
        }
    }
}
