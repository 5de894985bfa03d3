//! Engine configuration and default adapter wiring.

use std::time::Duration;

use vulnscan_scanners::{
    AdapterRegistry, CustomAdapter, DependencyCheckAdapter, OpenVasAdapter, TrivyAdapter,
};

/// Default adapter timeout. Deep scans on large targets take a while.
const DEFAULT_SCAN_TIMEOUT: Duration = Duration::from_secs(1800);

#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub trivy_path: String,
    pub dependency_check_path: String,
    /// OpenVAS invocation split into words; the first word is the program.
    pub openvas_command: Vec<String>,
    /// Hard upper bound on one adapter invocation.
    pub scan_timeout: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            trivy_path: "trivy".to_string(),
            dependency_check_path: "dependency-check".to_string(),
            openvas_command: vec!["gvm-cli".to_string()],
            scan_timeout: DEFAULT_SCAN_TIMEOUT,
        }
    }
}

impl EngineConfig {
    /// Read configuration from `VULNSCAN_*` environment variables, falling
    /// back to defaults for anything unset.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            trivy_path: env_or("VULNSCAN_TRIVY_PATH", defaults.trivy_path),
            dependency_check_path: env_or(
                "VULNSCAN_DEPENDENCY_CHECK_PATH",
                defaults.dependency_check_path,
            ),
            openvas_command: std::env::var("VULNSCAN_OPENVAS_COMMAND")
                .ok()
                .map(|raw| raw.split_whitespace().map(str::to_string).collect())
                .filter(|words: &Vec<String>| !words.is_empty())
                .unwrap_or(defaults.openvas_command),
            scan_timeout: std::env::var("VULNSCAN_SCAN_TIMEOUT_SECS")
                .ok()
                .and_then(|raw| raw.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.scan_timeout),
        }
    }

    /// Build a registry with all four bundled adapters wired from this
    /// configuration.
    pub fn build_registry(&self) -> AdapterRegistry {
        let mut registry = AdapterRegistry::new();
        registry.register(std::sync::Arc::new(TrivyAdapter::new(
            self.trivy_path.as_str(),
        )));
        registry.register(std::sync::Arc::new(DependencyCheckAdapter::new(
            self.dependency_check_path.as_str(),
        )));
        registry.register(std::sync::Arc::new(OpenVasAdapter::new(
            &self.openvas_command,
        )));
        registry.register(std::sync::Arc::new(CustomAdapter::new()));
        registry
    }
}

fn env_or(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}
