//! # Proof-Request Fingerprinting
//!
//! A proof request is a `(circuit, named inputs)` pair. Its fingerprint is
//! the cache and de-duplication key for proof generation, so it must be
//! deterministic regardless of the order in which the caller assembled the
//! inputs.
//!
//! ## Canonicalization Invariant
//!
//! Inputs are held in a `BTreeMap`, which fixes the key order before
//! serialization; the canonical form is the compact JSON object with keys
//! in sorted order. Two requests that differ only in construction order
//! produce identical canonical bytes and identical fingerprints.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

use crate::circuit::CircuitId;

/// A request to generate a proof for a circuit with named inputs.
///
/// Input values are opaque decimal-string field elements; the service
/// passes them through to the proving capability without interpreting
/// their meaning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProofRequest {
    /// The circuit to prove against.
    pub circuit: CircuitId,
    /// Named inputs, keyed by signal name. Sorted by construction.
    pub inputs: BTreeMap<String, String>,
}

impl ProofRequest {
    /// Build a request from any iterable of named inputs.
    pub fn new<K, V>(circuit: CircuitId, inputs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            circuit,
            inputs: inputs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// The canonical serialization of the inputs: a compact JSON object
    /// with keys in sorted order.
    pub fn canonical_inputs(&self) -> String {
        // BTreeMap serializes in key order; serde_json emits compact
        // separators by default. Both are load-bearing for determinism.
        serde_json::to_string(&self.inputs).expect("string map serialization cannot fail")
    }

    /// The cache/de-duplication key for this request.
    pub fn fingerprint(&self) -> Fingerprint {
        let mut hasher = Sha256::new();
        hasher.update(self.circuit.as_str().as_bytes());
        hasher.update(b":");
        hasher.update(self.canonical_inputs().as_bytes());
        let digest = hasher.finalize();
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Fingerprint(bytes)
    }
}

/// A 32-byte request fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Fingerprint([u8; 32]);

impl Fingerprint {
    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex rendering, used in log fields.
    pub fn to_hex(&self) -> String {
        self.0.iter().map(|b| format!("{b:02x}")).collect()
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.to_hex())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(pairs: &[(&str, &str)]) -> ProofRequest {
        ProofRequest::new(
            CircuitId::AgeVerification,
            pairs.iter().map(|&(k, v)| (k, v)),
        )
    }

    #[test]
    fn fingerprint_is_key_order_independent() {
        let a = request(&[("a", "1"), ("b", "2")]);
        let b = request(&[("b", "2"), ("a", "1")]);
        assert_eq!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_value_change() {
        let a = request(&[("birthYear", "1990")]);
        let b = request(&[("birthYear", "1991")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_on_key_change() {
        let a = request(&[("birthYear", "1990")]);
        let b = request(&[("birthyear", "1990")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn fingerprint_differs_across_circuits() {
        let a = ProofRequest::new(CircuitId::AgeVerification, [("x", "1")]);
        let b = ProofRequest::new(CircuitId::RangeProof, [("x", "1")]);
        assert_ne!(a.fingerprint(), b.fingerprint());
    }

    #[test]
    fn canonical_inputs_sorted_and_compact() {
        let req = request(&[("z", "26"), ("a", "1"), ("m", "13")]);
        assert_eq!(req.canonical_inputs(), r#"{"a":"1","m":"13","z":"26"}"#);
    }

    #[test]
    fn empty_inputs_fingerprint_is_stable() {
        let a = request(&[]);
        let b = request(&[]);
        assert_eq!(a.fingerprint(), b.fingerprint());
        assert_eq!(a.canonical_inputs(), "{}");
    }

    #[test]
    fn hex_rendering_is_64_chars() {
        let fp = request(&[("a", "1")]).fingerprint();
        let hex = fp.to_hex();
        assert_eq!(hex.len(), 64);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(fp.to_string(), hex);
    }
}
