//! # zkr-encode — Compact Proof Encoding
//!
//! Serializes a generated proof plus its public signals into the
//! fixed-layout buffer the on-chain verifier consumes. The verification
//! key is deliberately not included: the verifier holds per-circuit keys
//! keyed by the 8-bit small id, so the buffer stays a few hundred bytes.
//!
//! ## Layout (bit-exact wire contract)
//!
//! | Offset | Size   | Field                                  |
//! |--------|--------|----------------------------------------|
//! | 0      | 1      | circuit small id (u8)                  |
//! | 1      | 64     | proof element A                        |
//! | 65     | 128    | proof element B                        |
//! | 193    | 64     | proof element C                        |
//! | 257    | 4      | public-signal count (u32, little-endian) |
//! | 261    | 32 × N | public signals, 32-byte big-endian each |
//!
//! Total size: `261 + 32 * N` bytes — 293 for one public signal.
//!
//! Any change here must land in lockstep with the verifier's decoder.

use thiserror::Error;

use zkr_core::{
    field_element_bytes, CircuitId, ProofData, FIELD_ELEMENT_LEN, PROOF_A_LEN, PROOF_B_LEN,
    PROOF_C_LEN,
};

/// Size of the fixed-layout header: small id, three proof elements, and
/// the signal count.
pub const HEADER_LEN: usize = 1 + PROOF_A_LEN + PROOF_B_LEN + PROOF_C_LEN + 4;

/// Error from compact proof encoding. Always fatal; encoding produces a
/// complete buffer or nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EncodeError {
    /// The circuit has no small id in the compact-encoding table.
    #[error("circuit {0} has no compact encoding id")]
    UnknownCircuit(CircuitId),

    /// A proof element has the wrong width for its slot.
    #[error("malformed proof: element {element} is {actual} bytes, expected {expected}")]
    MalformedProof {
        /// Which element failed ("a", "b", or "c").
        element: &'static str,
        /// Width found.
        actual: usize,
        /// Width the layout requires.
        expected: usize,
    },

    /// A public signal is not representable as a 32-byte field element.
    #[error("malformed public signal #{index}: {reason}")]
    MalformedSignal {
        /// Position of the offending signal.
        index: usize,
        /// Why it could not be encoded.
        reason: String,
    },
}

/// Size in bytes of the encoded buffer for `signal_count` public signals.
pub const fn encoded_len(signal_count: usize) -> usize {
    HEADER_LEN + FIELD_ELEMENT_LEN * signal_count
}

/// Encode a proof and its public signals for on-chain submission.
///
/// Pure and total over well-formed inputs. Signals are decimal (or
/// `0x`-hex) strings and are written as 32-byte big-endian field elements.
pub fn encode(
    proof: &ProofData,
    public_signals: &[String],
    circuit: CircuitId,
) -> Result<Vec<u8>, EncodeError> {
    let small_id = circuit
        .small_id()
        .ok_or(EncodeError::UnknownCircuit(circuit))?;

    check_width("a", &proof.a, PROOF_A_LEN)?;
    check_width("b", &proof.b, PROOF_B_LEN)?;
    check_width("c", &proof.c, PROOF_C_LEN)?;

    let mut out = Vec::with_capacity(encoded_len(public_signals.len()));
    out.push(small_id);
    out.extend_from_slice(&proof.a);
    out.extend_from_slice(&proof.b);
    out.extend_from_slice(&proof.c);
    out.extend_from_slice(&(public_signals.len() as u32).to_le_bytes());

    for (index, signal) in public_signals.iter().enumerate() {
        let bytes = field_element_bytes(signal).map_err(|e| EncodeError::MalformedSignal {
            index,
            reason: e.to_string(),
        })?;
        out.extend_from_slice(&bytes);
    }

    debug_assert_eq!(out.len(), encoded_len(public_signals.len()));
    Ok(out)
}

fn check_width(
    element: &'static str,
    bytes: &[u8],
    expected: usize,
) -> Result<(), EncodeError> {
    if bytes.len() != expected {
        return Err(EncodeError::MalformedProof {
            element,
            actual: bytes.len(),
            expected,
        });
    }
    Ok(())
}
