//! Adapter contract and dispatch registry.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use vulnscan_core::enums::{ScanDepth, ScannerKind, TargetType};
use vulnscan_core::finding::RawFinding;
use vulnscan_core::types::EntityId;

/// Everything an adapter needs to know about one scan invocation.
#[derive(Debug, Clone)]
pub struct ScanRequest {
    pub scan_id: EntityId,
    pub target_type: TargetType,
    pub target_identifier: String,
    pub depth: ScanDepth,
    /// Scanner-specific configuration, opaque to the engine.
    pub scanner_config: serde_json::Map<String, serde_json::Value>,
}

/// Outcome of one adapter invocation.
///
/// External faults (spawn error, non-zero exit, malformed output) are data,
/// not errors: they arrive as `Failed` so the lifecycle controller can
/// record them on the scan without unwinding.
#[derive(Debug)]
pub enum AdapterResult {
    Success {
        findings: Vec<RawFinding>,
        /// The tool's full parsed output, kept for diagnostics.
        raw_output: serde_json::Value,
    },
    Failed {
        message: String,
    },
}

impl AdapterResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed {
            message: message.into(),
        }
    }
}

/// One external scanning tool.
#[async_trait]
pub trait ScannerAdapter: Send + Sync {
    /// The scanner kind this adapter handles.
    fn kind(&self) -> ScannerKind;

    /// Invoke the tool against the request's target. Blocks for the
    /// duration of the external process; callers bound it with a timeout.
    async fn run(&self, request: &ScanRequest) -> AdapterResult;
}

/// Registry mapping scanner kinds to adapters.
///
/// The lifecycle controller selects an adapter purely by the scan's
/// declared kind; a kind with no registered adapter is a configuration
/// error the controller reports without invoking anything.
#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ScannerKind, Arc<dyn ScannerAdapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own declared kind, replacing any
    /// previous registration for that kind.
    pub fn register(&mut self, adapter: Arc<dyn ScannerAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    pub fn get(&self, kind: ScannerKind) -> Option<Arc<dyn ScannerAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    pub fn registered_kinds(&self) -> Vec<ScannerKind> {
        self.adapters.keys().copied().collect()
    }
}

// ---------------------------------------------------------------------------
// Shared tool-invocation plumbing
// ---------------------------------------------------------------------------

/// Error type for external tool invocation, shared by the adapters.
/// Always converted to [`AdapterResult::Failed`] at the adapter boundary.
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    #[error("scanner binary not found: {0}")]
    NotFound(std::io::Error),

    #[error("scanner execution failed (exit code {exit_code:?}): {stderr}")]
    ExecutionFailed {
        exit_code: Option<i32>,
        stderr: String,
    },

    #[error("failed to parse scanner output: {0}")]
    Parse(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run a command, capture stdout, and require a zero exit status.
pub(crate) async fn run_tool(
    program: &str,
    args: &[String],
) -> Result<String, ToolError> {
    tracing::debug!(program, ?args, "Running scanner command");
    let output = tokio::process::Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(ToolError::NotFound)?;

    if !output.status.success() {
        return Err(ToolError::ExecutionFailed {
            exit_code: output.status.code(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        });
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// Parse tool stdout as JSON, keeping the full document for diagnostics.
pub(crate) fn parse_json(stdout: &str) -> Result<serde_json::Value, ToolError> {
    serde_json::from_str(stdout).map_err(|e| ToolError::Parse(e.to_string()))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
