//! # zkr-core — Circuit Registry and Shared Types
//!
//! Foundational types for the zkRune proof service.
//!
//! - **Circuits** (`circuit.rs`): the closed registry of provable circuits.
//!   Every circuit carries a stable string id; the subset that can be
//!   submitted on-chain also carries a dense 8-bit small id used by the
//!   compact proof encoding.
//!
//! - **Phase** (`phase.rs`): ceremony phase derivation. A circuit's phase
//!   is derived from its contribution count, never stored; the global phase
//!   is gated by the minimum count across all circuits.
//!
//! - **Fingerprint** (`fingerprint.rs`): deterministic fingerprinting of
//!   proof requests for caching and de-duplication. Canonicalization is
//!   key-order independent.
//!
//! - **Proof** (`proof.rs`): the structured proof result — three opaque
//!   fixed-width pairing-group elements, public signals, validity, timing.
//!
//! - **Field** (`field.rs`): the one decimal-to-32-byte field-element
//!   conversion path shared by the proof backends and the compact encoder.
//!
//! ## Crate Policy
//!
//! - No I/O, no async. Everything here is a pure function over its inputs.
//! - The circuit registry is compile-time closed: adding a circuit forces
//!   every exhaustive `match` in the stack to handle it.

pub mod circuit;
pub mod field;
pub mod fingerprint;
pub mod phase;
pub mod proof;

pub use circuit::{CircuitId, ParseCircuitError, CIRCUIT_COUNT};
pub use field::{field_element_bytes, FieldParseError, FIELD_ELEMENT_LEN};
pub use fingerprint::{Fingerprint, ProofRequest};
pub use phase::{CeremonyPhase, REQUIRED_CONTRIBUTIONS};
pub use proof::{ProofData, ProofResult, PROOF_A_LEN, PROOF_B_LEN, PROOF_C_LEN};
