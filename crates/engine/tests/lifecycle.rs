//! End-to-end scan lifecycle tests with stub adapters.

use std::sync::Arc;
use std::time::Duration;

use assert_matches::assert_matches;
use async_trait::async_trait;
use vulnscan_core::enums::{ScanDepth, ScanStatus, ScannerKind, TargetType};
use vulnscan_core::finding::RawFinding;
use vulnscan_core::types::EntityId;
use vulnscan_engine::{EngineConfig, EngineError, ScanController};
use vulnscan_scanners::{AdapterRegistry, AdapterResult, ScanRequest, ScannerAdapter};
use vulnscan_store::models::CreateScan;
use vulnscan_store::{MemoryStore, ScanStore, StoreError, VulnerabilityStore};

// ---------------------------------------------------------------------------
// Stub adapters
// ---------------------------------------------------------------------------

struct StubAdapter {
    kind: ScannerKind,
    findings: Vec<RawFinding>,
}

#[async_trait]
impl ScannerAdapter for StubAdapter {
    fn kind(&self) -> ScannerKind {
        self.kind
    }

    async fn run(&self, _request: &ScanRequest) -> AdapterResult {
        AdapterResult::Success {
            findings: self.findings.clone(),
            raw_output: serde_json::json!({"stub": true}),
        }
    }
}

struct FailingAdapter;

#[async_trait]
impl ScannerAdapter for FailingAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Trivy
    }

    async fn run(&self, _request: &ScanRequest) -> AdapterResult {
        AdapterResult::failed("Trivy scan failed: connection refused")
    }
}

struct SlowAdapter;

#[async_trait]
impl ScannerAdapter for SlowAdapter {
    fn kind(&self) -> ScannerKind {
        ScannerKind::Trivy
    }

    async fn run(&self, _request: &ScanRequest) -> AdapterResult {
        tokio::time::sleep(Duration::from_secs(60)).await;
        AdapterResult::Success {
            findings: Vec::new(),
            raw_output: serde_json::Value::Null,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

fn sample_findings() -> Vec<RawFinding> {
    vec![
        RawFinding {
            title: Some("openssl: remote code execution".to_string()),
            cve_id: Some("CVE-2024-0001".to_string()),
            severity: Some("critical".to_string()),
            cvss_score: Some(9.8),
            exploit_available: Some(true),
            patch_available: Some(false),
            ..Default::default()
        },
        RawFinding {
            title: Some("coreutils: minor information leak".to_string()),
            cve_id: Some("CVE-2024-0002".to_string()),
            severity: Some("low".to_string()),
            cvss_score: Some(2.1),
            ..Default::default()
        },
    ]
}

fn registry_with(adapter: Arc<dyn ScannerAdapter>) -> Arc<AdapterRegistry> {
    let mut registry = AdapterRegistry::new();
    registry.register(adapter);
    Arc::new(registry)
}

fn controller_with(
    store: &Arc<MemoryStore>,
    registry: Arc<AdapterRegistry>,
    timeout: Duration,
) -> ScanController {
    let config = EngineConfig {
        scan_timeout: timeout,
        ..EngineConfig::default()
    };
    ScanController::new(store.clone(), store.clone(), registry, config)
}

async fn create_scan(store: &MemoryStore, kind: ScannerKind) -> EntityId {
    store
        .insert_scan(CreateScan {
            name: "nightly image scan".to_string(),
            description: None,
            scanner_kind: kind,
            asset_id: EntityId::new_v4(),
            target_type: TargetType::Container,
            target_identifier: "registry.local/app:latest".to_string(),
            depth: ScanDepth::Normal,
            scan_frequency: None,
            scanner_config: Default::default(),
        })
        .await
        .unwrap()
        .id
}

/// Poll until the scan leaves `running`, or panic after a few seconds.
async fn wait_terminal(store: &MemoryStore, id: EntityId) -> vulnscan_store::models::Scan {
    for _ in 0..500 {
        let scan = store.get_scan(id).await.unwrap().unwrap();
        if vulnscan_core::lifecycle::is_terminal(scan.status) {
            return scan;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("scan never reached a terminal state");
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

#[tokio::test]
async fn successful_scan_completes_with_counts_and_findings() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(StubAdapter {
        kind: ScannerKind::Trivy,
        findings: sample_findings(),
    }));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    let started = controller.start_scan(scan_id).await.unwrap();
    assert_eq!(started.status, ScanStatus::Running);
    assert!(started.started_at.is_some());

    let scan = wait_terminal(&store, scan_id).await;
    assert_eq!(scan.status, ScanStatus::Completed);
    assert!(scan.completed_at.is_some());
    assert_eq!(scan.counts.total, 2);
    assert_eq!(scan.counts.critical, 1);
    assert_eq!(scan.counts.low, 1);
    assert_eq!(scan.counts.high, 0);
    assert_eq!(scan.status_message.as_deref(), Some("Scan completed: 2 findings"));

    let vulnerabilities = store.vulnerabilities_by_scan(scan_id).await.unwrap();
    assert_eq!(vulnerabilities.len(), 2);
    assert!(vulnerabilities
        .iter()
        .all(|v| v.scan_id == Some(scan_id) && v.asset_id == Some(scan.asset_id)));
    assert!(!controller.is_in_flight(scan_id));
}

#[tokio::test]
async fn second_start_is_refused_while_first_holds_the_claim() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(SlowAdapter));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    controller.start_scan(scan_id).await.unwrap();

    let result = controller.start_scan(scan_id).await;
    assert_matches!(result, Err(EngineError::Store(StoreError::StateConflict(_))));

    controller.stop_scan(scan_id).await.unwrap();
}

#[tokio::test]
async fn adapter_failure_fails_the_scan_with_its_message() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(FailingAdapter));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    controller.start_scan(scan_id).await.unwrap();

    let scan = wait_terminal(&store, scan_id).await;
    assert_eq!(scan.status, ScanStatus::Failed);
    assert_eq!(
        scan.status_message.as_deref(),
        Some("Trivy scan failed: connection refused")
    );
    assert!(store.vulnerabilities_by_scan(scan_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn unregistered_scanner_kind_fails_without_invocation() {
    let store = Arc::new(MemoryStore::new());
    // Registry only knows trivy; the scan asks for openvas.
    let registry = registry_with(Arc::new(StubAdapter {
        kind: ScannerKind::Trivy,
        findings: Vec::new(),
    }));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::OpenVas).await;
    controller.start_scan(scan_id).await.unwrap();

    let scan = wait_terminal(&store, scan_id).await;
    assert_eq!(scan.status, ScanStatus::Failed);
    assert!(scan
        .status_message
        .as_deref()
        .unwrap()
        .contains("No adapter registered for scanner kind 'openvas'"));
}

#[tokio::test]
async fn slow_adapter_times_out_into_failed() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(SlowAdapter));
    let controller = controller_with(&store, registry, Duration::from_millis(50));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    controller.start_scan(scan_id).await.unwrap();

    let scan = wait_terminal(&store, scan_id).await;
    assert_eq!(scan.status, ScanStatus::Failed);
    assert!(scan.status_message.as_deref().unwrap().contains("timed out"));
}

// ---------------------------------------------------------------------------
// Stop
// ---------------------------------------------------------------------------

#[tokio::test]
async fn running_scan_stops_and_stays_stopped() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(SlowAdapter));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    controller.start_scan(scan_id).await.unwrap();
    assert!(controller.is_in_flight(scan_id));

    let stopped = controller.stop_scan(scan_id).await.unwrap();
    assert_eq!(stopped.status, ScanStatus::Stopped);
    assert!(!controller.is_in_flight(scan_id));

    // The cancelled task must not overwrite the terminal state.
    tokio::time::sleep(Duration::from_millis(50)).await;
    let scan = store.get_scan(scan_id).await.unwrap().unwrap();
    assert_eq!(scan.status, ScanStatus::Stopped);
}

#[tokio::test]
async fn stopping_a_pending_scan_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(SlowAdapter));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    let result = controller.stop_scan(scan_id).await;
    assert_matches!(result, Err(EngineError::Store(StoreError::StateConflict(_))));

    let scan = store.get_scan(scan_id).await.unwrap().unwrap();
    assert_eq!(scan.status, ScanStatus::Pending);
}

#[tokio::test]
async fn stopping_a_completed_scan_is_refused() {
    let store = Arc::new(MemoryStore::new());
    let registry = registry_with(Arc::new(StubAdapter {
        kind: ScannerKind::Trivy,
        findings: Vec::new(),
    }));
    let controller = controller_with(&store, registry, Duration::from_secs(30));

    let scan_id = create_scan(&store, ScannerKind::Trivy).await;
    controller.start_scan(scan_id).await.unwrap();
    let scan = wait_terminal(&store, scan_id).await;
    assert_eq!(scan.status, ScanStatus::Completed);

    let result = controller.stop_scan(scan_id).await;
    assert_matches!(result, Err(EngineError::Store(StoreError::StateConflict(_))));
}
