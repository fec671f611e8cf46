//! # Proof Result Types
//!
//! The structured output of a proof generation: three opaque pairing-group
//! elements plus the ordered public signals, with the verification flag and
//! timing the caller needs to decide what to do with it.
//!
//! The group elements are fixed-width byte strings. This crate does not
//! interpret them — widths are validated where they matter (the compact
//! encoder) and everything else passes them through.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::circuit::CircuitId;

/// Expected width of proof element A (a G1 point: two 32-byte coordinates).
pub const PROOF_A_LEN: usize = 64;
/// Expected width of proof element B (a G2 point: four 32-byte coordinates).
pub const PROOF_B_LEN: usize = 128;
/// Expected width of proof element C (a G1 point).
pub const PROOF_C_LEN: usize = 64;

/// Number of characters of the serialized proof kept as a display
/// fingerprint. Not cryptographically meaningful.
pub const PROOF_HASH_LEN: usize = 66;

/// The three pairing-group elements of a generated proof.
///
/// Serialized as lowercase hex strings so proof payloads stay readable in
/// API responses and logs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofData {
    /// Proof element A, 64 bytes.
    #[serde(with = "hex_bytes")]
    pub a: Vec<u8>,
    /// Proof element B, 128 bytes.
    #[serde(with = "hex_bytes")]
    pub b: Vec<u8>,
    /// Proof element C, 64 bytes.
    #[serde(with = "hex_bytes")]
    pub c: Vec<u8>,
}

impl ProofData {
    /// Whether all three elements have their expected fixed widths.
    pub fn has_expected_lengths(&self) -> bool {
        self.a.len() == PROOF_A_LEN && self.b.len() == PROOF_B_LEN && self.c.len() == PROOF_C_LEN
    }

    /// The display fingerprint: the first [`PROOF_HASH_LEN`] characters of
    /// the serialized proof.
    pub fn display_hash(&self) -> String {
        let serialized =
            serde_json::to_string(self).expect("hex-string proof serialization cannot fail");
        serialized.chars().take(PROOF_HASH_LEN).collect()
    }
}

/// The outcome of one proof generation, cached by request fingerprint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofResult {
    /// The circuit that was proven.
    pub circuit: CircuitId,
    /// The pairing-group elements.
    pub proof_data: ProofData,
    /// Ordered public signals, as decimal-string field elements.
    pub public_signals: Vec<String>,
    /// Whether the proof verified against the circuit's verification key.
    /// A proof that was produced but failed verification is returned with
    /// this flag false rather than as an error.
    pub is_valid: bool,
    /// The verification key the proof was checked against.
    pub verification_key: String,
    /// Display fingerprint of the proof (see [`ProofData::display_hash`]).
    pub proof_hash: String,
    /// When the proof was generated.
    pub generated_at: DateTime<Utc>,
    /// Wall-clock generation time, prove plus verify.
    pub elapsed_ms: u64,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], serializer: S) -> Result<S::Ok, S::Error> {
        let hex: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
        serializer.serialize_str(&hex)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Vec<u8>, D::Error> {
        let hex = String::deserialize(deserializer)?;
        if hex.len() % 2 != 0 {
            return Err(serde::de::Error::custom("odd-length hex string"));
        }
        (0..hex.len())
            .step_by(2)
            .map(|i| {
                u8::from_str_radix(&hex[i..i + 2], 16)
                    .map_err(|_| serde::de::Error::custom("invalid hex"))
            })
            .collect()
    }
}
