//! # zkr-ceremony — Trusted-Setup Ceremony Coordination
//!
//! Tracks, per circuit, a monotonically increasing sequence of contributions
//! to the circuit's proving key, reconciling state held in two
//! independently-failing stores: the blob store holding the key-material
//! files (authoritative) and the record store holding contributor metadata
//! (an annotation layer, rebuildable from blob names).
//!
//! - **Artifacts** (`artifact.rs`): deterministic key-material naming and
//!   trailing-index parsing. A corrupt listing degrades to "no
//!   contributions yet", never to an error.
//!
//! - **Coordinator** (`coordinator.rs`): per-circuit and global ceremony
//!   status, upload/download descriptors, contribution recording with
//!   per-circuit serialization and a detectable index-conflict path, and
//!   the `Clean`/`Sync` reconciliation procedures.

pub mod artifact;
pub mod coordinator;
pub mod error;

pub use artifact::{artifact_name, artifact_path, circuit_dir, latest_from_listing, parse_index};
pub use coordinator::{
    CeremonyCoordinator, CeremonyStatus, CircuitStatus, DownloadDescriptor, ReconcileAction,
    ReconcileOutcome, RecordedContribution, SnapshotSource, SyncStatus, UploadTarget,
};
pub use error::CeremonyError;
