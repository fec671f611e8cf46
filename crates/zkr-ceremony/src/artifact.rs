//! # Key-Material Artifact Naming
//!
//! Every accepted contribution produces exactly one blob named
//! `{circuit}_{index:04}.keymaterial` under the circuit's ceremony
//! directory. The name is the contract: the current contribution index of
//! a circuit is the maximum index parsed from its listing, so the blob
//! store can always answer "how far along is this circuit" without
//! consulting the record store.
//!
//! ## Degradation Invariant
//!
//! Parsing is total. A name without the `_NNNN` suffix, with a non-numeric
//! suffix, or with the wrong extension contributes index 0 — a corrupt or
//! partially-migrated listing reads as "no contributions yet" rather than
//! failing the status call.

use zkr_core::CircuitId;
use zkr_storage::BlobEntry;

/// File extension for ceremony key material.
pub const KEY_MATERIAL_EXT: &str = "keymaterial";

/// Top-level blob-store directory for in-progress ceremony artifacts.
///
/// Distinct from `circuits/`, which serves the latest finalized key
/// material to the proof path.
pub const CEREMONY_DIR: &str = "ceremony";

/// Blob directory for one circuit's contribution sequence.
pub fn circuit_dir(circuit: CircuitId) -> String {
    format!("{CEREMONY_DIR}/{circuit}")
}

/// Deterministic artifact name for one contribution.
pub fn artifact_name(circuit: CircuitId, index: u32) -> String {
    format!("{circuit}_{index:04}.{KEY_MATERIAL_EXT}")
}

/// Full blob path for one contribution.
pub fn artifact_path(circuit: CircuitId, index: u32) -> String {
    format!("{}/{}", circuit_dir(circuit), artifact_name(circuit, index))
}

/// Parse the trailing `_NNNN` contribution index from an artifact name.
///
/// Returns 0 for anything that is not a well-formed key-material name.
pub fn parse_index(name: &str) -> u32 {
    let Some(stem) = name.strip_suffix(&format!(".{KEY_MATERIAL_EXT}")) else {
        return 0;
    };
    let Some((_, suffix)) = stem.rsplit_once('_') else {
        return 0;
    };
    if suffix.is_empty() || !suffix.bytes().all(|b| b.is_ascii_digit()) {
        return 0;
    }
    suffix.parse().unwrap_or(0)
}

/// Resolve the highest contribution index in a listing, with the name of
/// the blob that carries it.
///
/// Entries that do not parse to an index ≥ 1 are ignored; an empty or
/// fully-malformed listing resolves to `(0, None)`.
pub fn latest_from_listing(entries: &[BlobEntry]) -> (u32, Option<String>) {
    entries
        .iter()
        .map(|e| (parse_index(&e.name), &e.name))
        .filter(|&(index, _)| index > 0)
        .max_by_key(|&(index, _)| index)
        .map(|(index, name)| (index, Some(name.clone())))
        .unwrap_or((0, None))
}
