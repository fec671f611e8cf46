//! # Application State
//!
//! Shared state for the Axum application, passed to all route handlers via
//! the `State` extractor. Every collaborator is constructed explicitly and
//! injected — there is no lazily-built client singleton anywhere, so tests
//! assemble the state over in-memory gateways.

use std::sync::Arc;
use std::time::Duration;

use zkr_ceremony::CeremonyCoordinator;
use zkr_proof::{
    ArtifactLoader, DeterministicBackend, ProofCache, ProofEngine, ProofGenerator, ProvingBackend,
    ToolchainConfig, ToolchainProver,
};
use zkr_storage::{BlobStore, MemoryBlobStore, MemoryRecordStore, RecordStore};

/// Application configuration, loaded from the environment.
///
/// Custom `Debug` redacts the storage API key.
#[derive(Clone)]
pub struct AppConfig {
    /// Port to bind the HTTP server to.
    pub port: u16,
    /// Base URL of the blob-storage API. `None` runs the in-memory
    /// development store.
    pub storage_base_url: Option<String>,
    /// Storage bucket for ceremony and circuit artifacts.
    pub storage_bucket: String,
    /// Service-role API key for the storage API.
    pub storage_api_key: Option<String>,
    /// Postgres connection string for the record store. `None` runs the
    /// in-memory development store.
    pub database_url: Option<String>,
    /// Contributions each circuit needs before finalization.
    pub required_contributions: u32,
    /// Proof cache entry lifetime in seconds.
    pub proof_ttl_secs: u64,
    /// Directory of compiled circuits for the snarkjs toolchain path.
    /// `None` selects the deterministic in-process backend.
    pub toolchain_circuits_dir: Option<String>,
    /// Whether to mount the Prometheus `/metrics` endpoint.
    pub metrics_enabled: bool,
}

impl AppConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset variables fall back to development defaults; set-but-invalid
    /// numeric values are an error rather than a silent default.
    pub fn from_env() -> Result<Self, String> {
        Ok(Self {
            port: parse_env("PORT")?.unwrap_or(8080),
            storage_base_url: std::env::var("STORAGE_BASE_URL").ok(),
            storage_bucket: std::env::var("STORAGE_BUCKET")
                .unwrap_or_else(|_| "zk-artifacts".to_string()),
            storage_api_key: std::env::var("STORAGE_API_KEY").ok(),
            database_url: std::env::var("DATABASE_URL").ok(),
            required_contributions: parse_env("REQUIRED_CONTRIBUTIONS")?
                .unwrap_or(zkr_core::REQUIRED_CONTRIBUTIONS),
            proof_ttl_secs: parse_env("PROOF_CACHE_TTL_SECS")?.unwrap_or(30 * 60),
            toolchain_circuits_dir: std::env::var("TOOLCHAIN_CIRCUITS_DIR").ok(),
            metrics_enabled: parse_env("METRICS_ENABLED")?.unwrap_or(true),
        })
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            storage_base_url: None,
            storage_bucket: "zk-artifacts".to_string(),
            storage_api_key: None,
            database_url: None,
            required_contributions: zkr_core::REQUIRED_CONTRIBUTIONS,
            proof_ttl_secs: 30 * 60,
            toolchain_circuits_dir: None,
            metrics_enabled: true,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("port", &self.port)
            .field("storage_base_url", &self.storage_base_url)
            .field("storage_bucket", &self.storage_bucket)
            .field(
                "storage_api_key",
                &self.storage_api_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field(
                "database_url",
                &self.database_url.as_ref().map(|_| "[REDACTED]"),
            )
            .field("required_contributions", &self.required_contributions)
            .field("proof_ttl_secs", &self.proof_ttl_secs)
            .field("toolchain_circuits_dir", &self.toolchain_circuits_dir)
            .field("metrics_enabled", &self.metrics_enabled)
            .finish()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>, String> {
    match std::env::var(name) {
        Ok(raw) => raw
            .parse()
            .map(Some)
            .map_err(|_| format!("{name} is not a valid value: {raw:?}")),
        Err(_) => Ok(None),
    }
}

/// Shared application state accessible to all route handlers.
///
/// Clone-friendly: every field is an `Arc` or small value.
#[derive(Clone)]
pub struct AppState {
    /// Ceremony coordination over the two storage gateways.
    pub coordinator: Arc<CeremonyCoordinator>,
    /// Caching, de-duplicating proof generation.
    pub proofs: Arc<ProofCache>,
    /// The verification capability, exposed standalone by the verify
    /// endpoint.
    pub verifier: Arc<dyn ProvingBackend>,
    /// Application configuration.
    pub config: Arc<AppConfig>,
}

impl AppState {
    /// Assemble state from explicit gateways and a proving backend.
    ///
    /// The proof path uses the toolchain prover when
    /// `config.toolchain_circuits_dir` is set, otherwise the engine over
    /// the injected backend.
    pub fn with_gateways(
        blob: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        backend: Arc<dyn ProvingBackend>,
        config: AppConfig,
    ) -> Self {
        let coordinator = Arc::new(CeremonyCoordinator::with_required(
            Arc::clone(&blob),
            records,
            config.required_contributions,
        ));

        let generator: Arc<dyn ProofGenerator> = match &config.toolchain_circuits_dir {
            Some(dir) => Arc::new(ToolchainProver::new(ToolchainConfig::new(dir))),
            None => Arc::new(ProofEngine::new(
                ArtifactLoader::new(Arc::clone(&blob)),
                Arc::clone(&backend),
            )),
        };
        let proofs = Arc::new(ProofCache::with_ttl(
            generator,
            Duration::from_secs(config.proof_ttl_secs),
        ));

        Self {
            coordinator,
            proofs,
            verifier: backend,
            config: Arc::new(config),
        }
    }

    /// Fully in-memory state for development and tests.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::with_gateways(
            Arc::new(MemoryBlobStore::new()),
            Arc::new(MemoryRecordStore::new()),
            Arc::new(DeterministicBackend::new()),
            config,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_redacts_secrets() {
        let config = AppConfig {
            storage_api_key: Some("sk-secret".to_string()),
            database_url: Some("postgres://user:hunter2@db/zkrune".to_string()),
            ..AppConfig::default()
        };
        let debug = format!("{config:?}");
        assert!(!debug.contains("sk-secret"));
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn default_config_is_development_mode() {
        let config = AppConfig::default();
        assert_eq!(config.port, 8080);
        assert!(config.storage_base_url.is_none());
        assert!(config.database_url.is_none());
        assert_eq!(
            config.required_contributions,
            zkr_core::REQUIRED_CONTRIBUTIONS
        );
        assert_eq!(config.proof_ttl_secs, 1800);
    }

    #[test]
    fn in_memory_state_builds() {
        let state = AppState::in_memory(AppConfig::default());
        assert_eq!(state.coordinator.required_contributions(), 5);
        assert!(state.proofs.is_empty());
    }

    #[test]
    fn custom_threshold_reaches_coordinator() {
        let config = AppConfig {
            required_contributions: 2,
            ..AppConfig::default()
        };
        let state = AppState::in_memory(config);
        assert_eq!(state.coordinator.required_contributions(), 2);
    }
}
