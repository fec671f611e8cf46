//! # Ceremony Coordinator
//!
//! Orchestrates the contribution lifecycle over the two storage seams.
//! Collaborators are injected at construction — the coordinator owns no
//! clients and holds no global state, so tests run it against the
//! in-memory doubles.
//!
//! ## Consistency model
//!
//! The blob store is the source of truth for which contributions exist;
//! the record store annotates who made them. Status reads degrade to a
//! documented default snapshot when storage is down (status is advisory),
//! while `record_contribution` treats artifact-upload failure as fatal and
//! only the metadata row as best-effort.
//!
//! ## Index serialization
//!
//! Contributions for the same circuit are serialized through a per-circuit
//! async mutex, and the upload itself is create-if-absent. A concurrent
//! writer outside this process therefore surfaces as a storage conflict,
//! which is retried once with a freshly computed index before being
//! reported as [`CeremonyError::IndexConflict`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use uuid::Uuid;

use zkr_core::{CeremonyPhase, CircuitId, REQUIRED_CONTRIBUTIONS};
use zkr_storage::{BlobStore, BlobStoreError, ContributionRow, RecordStore, SignedUrl};

use crate::artifact::{artifact_name, artifact_path, circuit_dir, latest_from_listing, parse_index};
use crate::error::CeremonyError;

/// Contributor label for the distinguished first (genesis) contribution.
pub const GENESIS_CONTRIBUTOR: &str = "zkRune Genesis";

/// Commitment recorded for the genesis contribution in the default snapshot.
const GENESIS_HASH: &str = "a1b2c3d4e5f6789012345678901234567890abcd1234567890abcdef12345678";

/// Validity window for signed upload/download URLs.
const SIGNED_URL_TTL: Duration = Duration::from_secs(3600);

/// Where a ceremony snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Derived from live storage listings.
    Live,
    /// Storage was unreachable; this is the documented default snapshot.
    DegradedDefault,
}

/// Per-circuit contribution progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitStatus {
    /// Highest contribution index found in the circuit's blob directory.
    pub current_index: u32,
    /// Name of the blob carrying that index, if any exist.
    pub latest_artifact_name: Option<String>,
}

/// Global ceremony snapshot across every tracked circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeremonyStatus {
    /// Derived phase; gated by the minimum contribution count.
    pub phase: CeremonyPhase,
    /// Progress per circuit, keyed by circuit id.
    pub per_circuit: BTreeMap<CircuitId, CircuitStatus>,
    /// Minimum contribution count across all circuits — the gating value.
    pub min_contributions: u32,
    /// Sum of contribution counts across all circuits.
    pub total_contributions: u32,
    /// Contributions each circuit needs before finalization.
    pub required_contributions: u32,
    /// True once every circuit has at least one contribution.
    pub initialized: bool,
    /// Contributor metadata rows (best effort; empty when the record
    /// store is unavailable).
    pub contributions: Vec<ContributionRow>,
    /// Whether this snapshot is live or the degraded default.
    pub source: SnapshotSource,
}

/// A reserved slot for the next contribution upload. Issuing one has no
/// side effect — nothing is claimed until the holder actually uploads.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadTarget {
    /// The circuit being extended.
    pub circuit: CircuitId,
    /// The index the next contribution should claim.
    pub next_index: u32,
    /// The deterministic artifact name for that index.
    pub artifact_name: String,
    /// Time-bounded URL for writing the artifact.
    pub upload_url: SignedUrl,
}

/// Download descriptor for a circuit's latest key material.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadDescriptor {
    /// The circuit whose material is being fetched.
    pub circuit: CircuitId,
    /// Highest contribution index currently in the blob store.
    pub current_index: u32,
    /// The index the next contribution would claim.
    pub next_index: u32,
    /// Name of the latest artifact.
    pub artifact_name: String,
    /// Time-bounded URL for reading the artifact.
    pub download_url: SignedUrl,
}

/// Outcome of a successfully recorded contribution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecordedContribution {
    /// The circuit that was extended.
    pub circuit: CircuitId,
    /// The index this contribution claimed.
    pub index: u32,
    /// The artifact name it was stored under.
    pub artifact_name: String,
    /// Contributor display name.
    pub contributor_name: String,
    /// Commitment to the contributed randomness.
    pub contribution_hash: String,
}

/// Reconciliation procedure to run against the record store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReconcileAction {
    /// Delete every metadata row unconditionally.
    Clean,
    /// Rebuild the metadata table from the blob-store listings.
    Sync,
}

/// Result of a reconciliation run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReconcileOutcome {
    /// Which procedure ran.
    pub action: ReconcileAction,
    /// Rows deleted (`Clean`) or created (`Sync`).
    pub rows: u64,
}

/// Agreement report between the two stores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncStatus {
    /// Key-material blobs found across all circuit directories.
    pub blob_artifacts: u64,
    /// Rows currently in the record store.
    pub record_rows: u64,
    /// Whether the two counts agree.
    pub in_sync: bool,
}

/// Coordinates ceremony contributions over injected storage gateways.
pub struct CeremonyCoordinator {
    blob: Arc<dyn BlobStore>,
    records: Arc<dyn RecordStore>,
    required_contributions: u32,
    // One lock per circuit; the registry is closed, so the map is built
    // once and never mutated.
    circuit_locks: BTreeMap<CircuitId, Mutex<()>>,
}

impl CeremonyCoordinator {
    /// Coordinator with the standard contribution threshold.
    pub fn new(blob: Arc<dyn BlobStore>, records: Arc<dyn RecordStore>) -> Self {
        Self::with_required(blob, records, REQUIRED_CONTRIBUTIONS)
    }

    /// Coordinator with an explicit contribution threshold.
    pub fn with_required(
        blob: Arc<dyn BlobStore>,
        records: Arc<dyn RecordStore>,
        required_contributions: u32,
    ) -> Self {
        let circuit_locks = CircuitId::all()
            .iter()
            .map(|&c| (c, Mutex::new(())))
            .collect();
        Self {
            blob,
            records,
            required_contributions,
            circuit_locks,
        }
    }

    /// The configured contribution threshold.
    pub fn required_contributions(&self) -> u32 {
        self.required_contributions
    }

    /// Current contribution progress for one circuit.
    ///
    /// Malformed listing entries degrade to index 0; only storage
    /// unavailability is an error.
    pub async fn circuit_status(&self, circuit: CircuitId) -> Result<CircuitStatus, CeremonyError> {
        let entries = self
            .blob
            .list(&circuit_dir(circuit))
            .await
            .map_err(read_error)?;
        let (current_index, latest_artifact_name) = latest_from_listing(&entries);
        Ok(CircuitStatus {
            current_index,
            latest_artifact_name,
        })
    }

    /// Global ceremony snapshot.
    ///
    /// Never fails: ceremony status is advisory, so a storage outage
    /// degrades to the documented default snapshot instead of propagating.
    pub async fn ceremony_status(&self) -> CeremonyStatus {
        let mut per_circuit = BTreeMap::new();
        for &circuit in CircuitId::all() {
            match self.circuit_status(circuit).await {
                Ok(status) => {
                    per_circuit.insert(circuit, status);
                }
                Err(err) => {
                    tracing::warn!(
                        circuit = %circuit,
                        error = %err,
                        "ceremony status degraded to default snapshot"
                    );
                    return self.default_snapshot();
                }
            }
        }

        let min_contributions = per_circuit
            .values()
            .map(|s| s.current_index)
            .min()
            .unwrap_or(0);
        let total_contributions = per_circuit.values().map(|s| s.current_index).sum();

        // Contributor rows are an annotation; their absence never fails
        // the status call.
        let contributions = match self.records.list().await {
            Ok(rows) => rows,
            Err(err) => {
                tracing::warn!(error = %err, "contribution rows unavailable; omitting from status");
                Vec::new()
            }
        };

        CeremonyStatus {
            phase: self.derive_phase(min_contributions),
            per_circuit,
            min_contributions,
            total_contributions,
            required_contributions: self.required_contributions,
            initialized: min_contributions > 0,
            contributions,
            source: SnapshotSource::Live,
        }
    }

    /// Reserve (without claiming) the next contribution slot for a circuit.
    pub async fn upload_target(&self, circuit: CircuitId) -> Result<UploadTarget, CeremonyError> {
        let status = self.circuit_status(circuit).await?;
        let next_index = status.current_index + 1;
        let name = artifact_name(circuit, next_index);
        let upload_url = self
            .blob
            .signed_upload_url(&artifact_path(circuit, next_index), SIGNED_URL_TTL)
            .await
            .map_err(read_error)?;
        Ok(UploadTarget {
            circuit,
            next_index,
            artifact_name: name,
            upload_url,
        })
    }

    /// Signed download descriptor for a circuit's latest key material.
    pub async fn download_descriptor(
        &self,
        circuit: CircuitId,
    ) -> Result<DownloadDescriptor, CeremonyError> {
        let status = self.circuit_status(circuit).await?;
        let Some(name) = status.latest_artifact_name else {
            return Err(CeremonyError::ArtifactMissing { circuit });
        };
        let path = format!("{}/{}", circuit_dir(circuit), name);
        let download_url = self
            .blob
            .signed_download_url(&path, SIGNED_URL_TTL)
            .await
            .map_err(|e| match e {
                BlobStoreError::NotFound { .. } => CeremonyError::ArtifactMissing { circuit },
                other => read_error(other),
            })?;
        Ok(DownloadDescriptor {
            circuit,
            current_index: status.current_index,
            next_index: status.current_index + 1,
            artifact_name: name,
            download_url,
        })
    }

    /// Validate and append one contribution.
    ///
    /// The next index is recomputed fresh under the circuit's lock — a
    /// caller-supplied index is never trusted, closing the race where two
    /// contributors compute the same "next" index concurrently. The
    /// artifact upload is fatal on failure; the metadata row is
    /// best-effort because the blob listing is authoritative either way.
    pub async fn record_contribution(
        &self,
        circuit: CircuitId,
        contributor_name: &str,
        contribution_hash: &str,
        artifact_bytes: Vec<u8>,
    ) -> Result<RecordedContribution, CeremonyError> {
        let _guard = self.circuit_locks[&circuit].lock().await;

        let mut index = self.circuit_status(circuit).await?.current_index + 1;
        const ATTEMPTS: u32 = 2;
        for attempt in 1..=ATTEMPTS {
            let path = artifact_path(circuit, index);
            match self
                .blob
                .upload(&path, artifact_bytes.clone(), false)
                .await
            {
                Ok(()) => {
                    let name = artifact_name(circuit, index);
                    self.insert_row_best_effort(circuit, index, contributor_name, contribution_hash)
                        .await;
                    tracing::info!(
                        circuit = %circuit,
                        index,
                        contributor = contributor_name,
                        "recorded ceremony contribution"
                    );
                    return Ok(RecordedContribution {
                        circuit,
                        index,
                        artifact_name: name,
                        contributor_name: contributor_name.to_string(),
                        contribution_hash: contribution_hash.to_string(),
                    });
                }
                Err(BlobStoreError::AlreadyExists { .. }) if attempt < ATTEMPTS => {
                    tracing::warn!(
                        circuit = %circuit,
                        index,
                        "contribution index already claimed; recomputing"
                    );
                    index = self.circuit_status(circuit).await?.current_index + 1;
                }
                Err(BlobStoreError::AlreadyExists { .. }) => {
                    return Err(CeremonyError::IndexConflict { circuit, index });
                }
                Err(e) if e.is_unavailable() => {
                    return Err(CeremonyError::StorageUnavailable(e.to_string()));
                }
                Err(e) => return Err(CeremonyError::UploadFailed(e.to_string())),
            }
        }
        unreachable!("upload loop returns on every branch");
    }

    /// Run a reconciliation procedure against the record store.
    pub async fn reconcile(
        &self,
        action: ReconcileAction,
    ) -> Result<ReconcileOutcome, CeremonyError> {
        match action {
            ReconcileAction::Clean => {
                let removed = self
                    .records
                    .delete_all()
                    .await
                    .map_err(|e| CeremonyError::StorageUnavailable(e.to_string()))?;
                tracing::info!(rows = removed, "cleaned contribution metadata");
                Ok(ReconcileOutcome {
                    action,
                    rows: removed,
                })
            }
            ReconcileAction::Sync => {
                let rows = self.derive_rows_from_blobs().await?;
                let created = self
                    .records
                    .replace_all(rows)
                    .await
                    .map_err(|e| CeremonyError::StorageUnavailable(e.to_string()))?;
                tracing::info!(rows = created, "rebuilt contribution metadata from blob store");
                Ok(ReconcileOutcome {
                    action,
                    rows: created,
                })
            }
        }
    }

    /// Report whether the two stores agree on the number of contributions.
    pub async fn sync_status(&self) -> Result<SyncStatus, CeremonyError> {
        let mut blob_artifacts = 0u64;
        for &circuit in CircuitId::all() {
            let entries = self
                .blob
                .list(&circuit_dir(circuit))
                .await
                .map_err(read_error)?;
            blob_artifacts += entries
                .iter()
                .filter(|e| parse_index(&e.name) > 0)
                .count() as u64;
        }
        let record_rows = self
            .records
            .count()
            .await
            .map_err(|e| CeremonyError::StorageUnavailable(e.to_string()))?;
        Ok(SyncStatus {
            blob_artifacts,
            record_rows,
            in_sync: blob_artifacts == record_rows,
        })
    }

    fn derive_phase(&self, min_contributions: u32) -> CeremonyPhase {
        if min_contributions >= self.required_contributions {
            CeremonyPhase::ReadyToFinalize
        } else {
            CeremonyPhase::Contribution
        }
    }

    async fn insert_row_best_effort(
        &self,
        circuit: CircuitId,
        index: u32,
        contributor_name: &str,
        contribution_hash: &str,
    ) {
        let row = ContributionRow {
            id: Uuid::new_v4(),
            circuit,
            index,
            contributor_name: contributor_name.to_string(),
            contribution_hash: contribution_hash.to_string(),
            verified: false,
            created_at: Utc::now(),
        };
        if let Err(err) = self.records.insert(row).await {
            // The artifact is already uploaded and the blob listing is
            // authoritative, so the contribution still counts. The row can
            // be rebuilt later via reconcile(Sync).
            tracing::warn!(
                circuit = %circuit,
                index,
                error = %err,
                "contribution artifact stored but metadata row insert failed"
            );
        }
    }

    /// Derive one metadata row per key-material blob, for `Sync`.
    ///
    /// Everything in the derived row comes from the blob name (and listing
    /// timestamp when present), so running the derivation twice over the
    /// same blobs produces the same logical rows.
    async fn derive_rows_from_blobs(&self) -> Result<Vec<ContributionRow>, CeremonyError> {
        let mut rows = Vec::new();
        for &circuit in CircuitId::all() {
            let entries = self
                .blob
                .list(&circuit_dir(circuit))
                .await
                .map_err(read_error)?;
            let mut indexed: Vec<_> = entries
                .iter()
                .filter_map(|e| {
                    let index = parse_index(&e.name);
                    (index > 0).then_some((index, e))
                })
                .collect();
            indexed.sort_by_key(|&(index, _)| index);

            for (index, entry) in indexed {
                let contributor_name = if index == 1 {
                    GENESIS_CONTRIBUTOR.to_string()
                } else {
                    format!("Contributor #{index}")
                };
                rows.push(ContributionRow {
                    id: Uuid::new_v4(),
                    circuit,
                    index,
                    contributor_name,
                    contribution_hash: format!("storage:{}/{}", circuit_dir(circuit), entry.name),
                    verified: true,
                    created_at: entry.created_at.unwrap_or_else(Utc::now),
                });
            }
        }
        Ok(rows)
    }

    /// The documented default snapshot returned when storage is down:
    /// every circuit at its genesis contribution, still in the
    /// contribution phase.
    fn default_snapshot(&self) -> CeremonyStatus {
        let per_circuit: BTreeMap<CircuitId, CircuitStatus> = CircuitId::all()
            .iter()
            .map(|&c| {
                (
                    c,
                    CircuitStatus {
                        current_index: 1,
                        latest_artifact_name: Some(artifact_name(c, 1)),
                    },
                )
            })
            .collect();
        let total = per_circuit.len() as u32;

        CeremonyStatus {
            phase: CeremonyPhase::Contribution,
            per_circuit,
            min_contributions: 1,
            total_contributions: total,
            required_contributions: self.required_contributions,
            initialized: true,
            contributions: vec![genesis_row()],
            source: SnapshotSource::DegradedDefault,
        }
    }
}

/// Map a blob-store failure on a read path to the ceremony error space.
fn read_error(err: BlobStoreError) -> CeremonyError {
    CeremonyError::StorageUnavailable(err.to_string())
}

/// The synthetic genesis contribution shown in the default snapshot.
fn genesis_row() -> ContributionRow {
    ContributionRow {
        id: Uuid::nil(),
        circuit: CircuitId::AgeVerification,
        index: 1,
        contributor_name: GENESIS_CONTRIBUTOR.to_string(),
        contribution_hash: GENESIS_HASH.to_string(),
        verified: true,
        created_at: genesis_timestamp(),
    }
}

/// Fixed timestamp of the ceremony's genesis contribution.
fn genesis_timestamp() -> DateTime<Utc> {
    chrono::DateTime::parse_from_rfc3339("2026-01-14T00:00:00Z")
        .expect("genesis timestamp literal is valid")
        .with_timezone(&Utc)
}
