//! Scan lifecycle controller.
//!
//! `start_scan` is the fast path: claim the pending scan, spawn the
//! execution task, return. The spawned task owns the rest of the lifecycle
//! and drives the scan to exactly one terminal state — completed, failed
//! (adapter fault, timeout, or persistence fault), or stopped via its
//! cancellation token. Stop transitions the store first and then cancels,
//! so the execution task never races it for the terminal write.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio_util::sync::CancellationToken;
use vulnscan_core::finding::{normalize_findings, severity_counts, RawFinding};
use vulnscan_core::types::EntityId;
use vulnscan_scanners::{AdapterRegistry, AdapterResult, ScanRequest};
use vulnscan_store::models::{NewVulnerability, Scan};
use vulnscan_store::{ScanStore, StoreError, VulnerabilityStore};

use crate::config::EngineConfig;
use crate::error::EngineError;

/// Cheap to clone; clones share the in-flight map, so any clone can stop a
/// scan another clone started.
#[derive(Clone)]
pub struct ScanController {
    scans: Arc<dyn ScanStore>,
    vulnerabilities: Arc<dyn VulnerabilityStore>,
    registry: Arc<AdapterRegistry>,
    config: EngineConfig,
    in_flight: Arc<Mutex<HashMap<EntityId, CancellationToken>>>,
}

impl ScanController {
    pub fn new(
        scans: Arc<dyn ScanStore>,
        vulnerabilities: Arc<dyn VulnerabilityStore>,
        registry: Arc<AdapterRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            scans,
            vulnerabilities,
            registry,
            config,
            in_flight: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Claim a pending scan and dispatch its execution task.
    ///
    /// Returns the claimed (now running) scan immediately; execution
    /// continues in the background. A scan in any state other than pending
    /// is refused with a state-conflict error, and under concurrent callers
    /// exactly one claim succeeds.
    pub async fn start_scan(&self, id: EntityId) -> Result<Scan, EngineError> {
        let scan = self.scans.claim_start(id).await?;
        tracing::info!(
            scan_id = %scan.id,
            scanner = %scan.scanner_kind,
            target = %scan.target_identifier,
            "Scan started",
        );

        let token = CancellationToken::new();
        self.track(scan.id, token.clone());

        let worker = self.clone();
        let dispatched = scan.clone();
        tokio::spawn(async move {
            worker.execute_scan(dispatched, token).await;
        });

        Ok(scan)
    }

    /// Stop a running scan.
    ///
    /// The store transition happens first, then the execution task is
    /// cancelled; `stopped` is the terminal state and the task writes
    /// nothing further. Only a running scan can be stopped.
    pub async fn stop_scan(&self, id: EntityId) -> Result<Scan, EngineError> {
        let scan = self.scans.stop_scan(id).await?;
        if let Some(token) = self.untrack(id) {
            token.cancel();
        }
        tracing::info!(scan_id = %id, "Scan stopped");
        Ok(scan)
    }

    /// Whether the controller currently holds an execution task for a scan.
    pub fn is_in_flight(&self, id: EntityId) -> bool {
        self.in_flight.lock().unwrap().contains_key(&id)
    }

    fn track(&self, id: EntityId, token: CancellationToken) {
        self.in_flight.lock().unwrap().insert(id, token);
    }

    fn untrack(&self, id: EntityId) -> Option<CancellationToken> {
        self.in_flight.lock().unwrap().remove(&id)
    }

    // -- Execution task --

    async fn execute_scan(&self, scan: Scan, token: CancellationToken) {
        let Some(adapter) = self.registry.get(scan.scanner_kind) else {
            self.untrack(scan.id);
            self.finish_failed(
                scan.id,
                &format!(
                    "No adapter registered for scanner kind '{}'",
                    scan.scanner_kind
                ),
            )
            .await;
            return;
        };

        let request = ScanRequest {
            scan_id: scan.id,
            target_type: scan.target_type,
            target_identifier: scan.target_identifier.clone(),
            depth: scan.depth,
            scanner_config: scan.scanner_config.clone(),
        };

        let outcome = tokio::select! {
            _ = token.cancelled() => None,
            result = tokio::time::timeout(self.config.scan_timeout, adapter.run(&request)) => {
                Some(result)
            }
        };
        self.untrack(scan.id);

        match outcome {
            // Cancelled: stop_scan already wrote the terminal state.
            None => {
                tracing::debug!(scan_id = %scan.id, "Execution task cancelled");
            }
            Some(Err(_elapsed)) => {
                self.finish_failed(
                    scan.id,
                    &format!(
                        "Scan timed out after {} seconds",
                        self.config.scan_timeout.as_secs()
                    ),
                )
                .await;
            }
            Some(Ok(AdapterResult::Failed { message })) => {
                self.finish_failed(scan.id, &message).await;
            }
            Some(Ok(AdapterResult::Success { findings, .. })) => {
                if let Err(e) = self.finish_completed(&scan, &findings).await {
                    self.finish_failed(scan.id, &format!("Failed to record findings: {e}"))
                        .await;
                }
            }
        }
    }

    /// Persist the findings and complete the scan. Counts come from the
    /// full normalized set, never incremented piecemeal.
    async fn finish_completed(
        &self,
        scan: &Scan,
        findings: &[RawFinding],
    ) -> Result<(), StoreError> {
        let normalized = normalize_findings(findings);
        let counts = severity_counts(&normalized);

        for finding in normalized {
            self.vulnerabilities
                .insert_vulnerability(NewVulnerability::from_finding(
                    finding,
                    scan.id,
                    scan.asset_id,
                ))
                .await?;
        }

        let message = format!("Scan completed: {} findings", counts.total);
        self.scans.complete_scan(scan.id, &message, counts).await?;
        tracing::info!(
            scan_id = %scan.id,
            total = counts.total,
            critical = counts.critical,
            "Scan completed",
        );
        Ok(())
    }

    /// Write the failed terminal state. A state conflict here means a stop
    /// won the race; the terminal state stands and the failure is dropped.
    async fn finish_failed(&self, id: EntityId, message: &str) {
        tracing::error!(scan_id = %id, message, "Scan failed");
        if let Err(e) = self.scans.fail_scan(id, message).await {
            tracing::warn!(scan_id = %id, error = %e, "Could not record scan failure");
        }
    }
}
