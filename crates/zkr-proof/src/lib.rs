//! # zkr-proof — Proof Lifecycle
//!
//! Turns `(circuit, named inputs)` into a verified, timed, cacheable proof
//! result using the circuit's current key material.
//!
//! - **Artifacts** (`artifacts.rs`): fetches the three assets a proof
//!   requires — circuit program, proving key, verification key — as opaque
//!   byte buffers. All three or none.
//!
//! - **Backend** (`backend.rs`): the opaque proving capability boundary
//!   (`prove` / `verify`), plus the deterministic in-process backend used
//!   by tests and development deployments.
//!
//! - **Engine** (`engine.rs`): load → prove → verify → result. A proof
//!   that fails verification is returned with `is_valid = false`, never
//!   raised.
//!
//! - **Toolchain** (`toolchain.rs`): the server-side fallback that shells
//!   out to the snarkjs toolchain against temporary files. Allow-listed
//!   circuits produce real proofs; everything else produces a
//!   type-distinct placeholder that cannot be mistaken for one.
//!
//! - **Cache** (`cache.rs`): fingerprint-keyed result cache with a TTL,
//!   at-most-one-concurrent-generation-per-fingerprint, and cooperative
//!   cancellation of superseded generations.

pub mod artifacts;
pub mod backend;
pub mod cache;
pub mod engine;
pub mod error;
pub mod toolchain;

pub use artifacts::{ArtifactKind, ArtifactLoader, CircuitArtifacts};
pub use backend::{BackendError, DeterministicBackend, ProvingBackend};
pub use cache::{Generation, ProofCache};
pub use engine::{GeneratedProof, PlaceholderProof, ProofEngine, ProofGenerator};
pub use error::ProofError;
pub use toolchain::{ToolchainConfig, ToolchainProver};
