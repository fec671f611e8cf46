//! # Circuit Registry — Single Source of Truth
//!
//! Defines the `CircuitId` enum with all 13 circuits the service tracks.
//! This is the ONE definition used across the entire stack: the ceremony
//! coordinator, the proof engine, and the compact encoder all match on it
//! exhaustively, so adding a circuit forces every consumer to handle it at
//! compile time.
//!
//! ## Small ids
//!
//! The compact on-chain encoding identifies a circuit by a dense 8-bit
//! "small id" instead of embedding its verification key. The small-id table
//! is closed and must stay in lockstep with the on-chain verifier's table —
//! extending it is a coordinated change on both sides. `private-voting` is
//! tracked by the ceremony but has no small id and therefore cannot be
//! encoded for submission.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

/// A circuit id string that is not in the registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown circuit: {0:?}")]
pub struct ParseCircuitError(pub String);

/// All circuits tracked by the zkRune proof service.
///
/// Each circuit is a compiled statement provable in zero knowledge. The
/// string form (e.g. `"age-verification"`) is the stable public identifier
/// used in artifact names, storage paths, and API payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CircuitId {
    /// Prove an age threshold without revealing the birth year.
    AgeVerification,
    /// Prove a reputation score bracket without revealing the score.
    AnonymousReputation,
    /// Prove an account balance exceeds a threshold.
    BalanceProof,
    /// Prove possession of a credential without revealing it.
    CredentialProof,
    /// Prove knowledge of a hash preimage.
    HashPreimage,
    /// Prove membership in a committed set.
    MembershipProof,
    /// Prove ownership of an NFT without revealing the wallet.
    NftOwnership,
    /// Prove a holding period has elapsed.
    PatienceProof,
    /// Cast a ballot without revealing the choice.
    PrivateVoting,
    /// Quadratic-weighted private ballot.
    QuadraticVoting,
    /// Prove a value lies within a range.
    RangeProof,
    /// Prove a signature verifies without revealing the message.
    SignatureVerification,
    /// Prove swap terms are satisfied without revealing balances.
    TokenSwap,
}

/// Total number of registered circuits. Used for compile-time assertions.
pub const CIRCUIT_COUNT: usize = 13;

impl CircuitId {
    /// Returns all registered circuits in canonical (alphabetical) order.
    ///
    /// This is the iteration order used by ceremony status reports, so the
    /// per-circuit map in API responses is stable across calls.
    pub fn all() -> &'static [CircuitId] {
        &[
            Self::AgeVerification,
            Self::AnonymousReputation,
            Self::BalanceProof,
            Self::CredentialProof,
            Self::HashPreimage,
            Self::MembershipProof,
            Self::NftOwnership,
            Self::PatienceProof,
            Self::PrivateVoting,
            Self::QuadraticVoting,
            Self::RangeProof,
            Self::SignatureVerification,
            Self::TokenSwap,
        ]
    }

    /// Returns the stable string identifier for this circuit.
    ///
    /// Must match the serde serialization format — artifact names and
    /// storage directory prefixes are built from this string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AgeVerification => "age-verification",
            Self::AnonymousReputation => "anonymous-reputation",
            Self::BalanceProof => "balance-proof",
            Self::CredentialProof => "credential-proof",
            Self::HashPreimage => "hash-preimage",
            Self::MembershipProof => "membership-proof",
            Self::NftOwnership => "nft-ownership",
            Self::PatienceProof => "patience-proof",
            Self::PrivateVoting => "private-voting",
            Self::QuadraticVoting => "quadratic-voting",
            Self::RangeProof => "range-proof",
            Self::SignatureVerification => "signature-verification",
            Self::TokenSwap => "token-swap",
        }
    }

    /// Returns the dense 8-bit id used by the compact proof encoding, or
    /// `None` for circuits the on-chain verifier does not know.
    ///
    /// The table is closed. The values are a wire-format contract shared
    /// with the verifier and must never be renumbered.
    pub fn small_id(&self) -> Option<u8> {
        match self {
            Self::AgeVerification => Some(0),
            Self::BalanceProof => Some(1),
            Self::HashPreimage => Some(2),
            Self::AnonymousReputation => Some(3),
            Self::CredentialProof => Some(4),
            Self::MembershipProof => Some(5),
            Self::NftOwnership => Some(6),
            Self::PatienceProof => Some(7),
            Self::QuadraticVoting => Some(8),
            Self::RangeProof => Some(9),
            Self::SignatureVerification => Some(10),
            Self::TokenSwap => Some(11),
            Self::PrivateVoting => None,
        }
    }
}

impl FromStr for CircuitId {
    type Err = ParseCircuitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::all()
            .iter()
            .find(|c| c.as_str() == s)
            .copied()
            .ok_or_else(|| ParseCircuitError(s.to_string()))
    }
}

impl std::fmt::Display for CircuitId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_returns_every_circuit_once() {
        let all = CircuitId::all();
        assert_eq!(all.len(), CIRCUIT_COUNT);
        let mut dedup: Vec<_> = all.to_vec();
        dedup.sort();
        dedup.dedup();
        assert_eq!(dedup.len(), CIRCUIT_COUNT);
    }

    #[test]
    fn string_roundtrip_for_every_circuit() {
        for &circuit in CircuitId::all() {
            let parsed: CircuitId = circuit.as_str().parse().unwrap();
            assert_eq!(parsed, circuit);
        }
    }

    #[test]
    fn serde_matches_as_str() {
        for &circuit in CircuitId::all() {
            let json = serde_json::to_string(&circuit).unwrap();
            assert_eq!(json, format!("\"{}\"", circuit.as_str()));
            let back: CircuitId = serde_json::from_str(&json).unwrap();
            assert_eq!(back, circuit);
        }
    }

    #[test]
    fn unknown_circuit_rejected() {
        let err = "not-a-real-circuit".parse::<CircuitId>().unwrap_err();
        assert!(err.to_string().contains("not-a-real-circuit"));
    }

    #[test]
    fn small_id_table_is_pinned() {
        // Wire-format contract with the on-chain verifier. Any change here
        // is a breaking change on both sides.
        assert_eq!(CircuitId::AgeVerification.small_id(), Some(0));
        assert_eq!(CircuitId::BalanceProof.small_id(), Some(1));
        assert_eq!(CircuitId::HashPreimage.small_id(), Some(2));
        assert_eq!(CircuitId::AnonymousReputation.small_id(), Some(3));
        assert_eq!(CircuitId::CredentialProof.small_id(), Some(4));
        assert_eq!(CircuitId::MembershipProof.small_id(), Some(5));
        assert_eq!(CircuitId::NftOwnership.small_id(), Some(6));
        assert_eq!(CircuitId::PatienceProof.small_id(), Some(7));
        assert_eq!(CircuitId::QuadraticVoting.small_id(), Some(8));
        assert_eq!(CircuitId::RangeProof.small_id(), Some(9));
        assert_eq!(CircuitId::SignatureVerification.small_id(), Some(10));
        assert_eq!(CircuitId::TokenSwap.small_id(), Some(11));
    }

    #[test]
    fn private_voting_has_no_small_id() {
        assert_eq!(CircuitId::PrivateVoting.small_id(), None);
    }

    #[test]
    fn small_ids_are_dense_and_unique() {
        let mut ids: Vec<u8> = CircuitId::all()
            .iter()
            .filter_map(|c| c.small_id())
            .collect();
        ids.sort_unstable();
        let expected: Vec<u8> = (0..12).collect();
        assert_eq!(ids, expected);
    }

    #[test]
    fn display_matches_as_str() {
        assert_eq!(
            CircuitId::AgeVerification.to_string(),
            "age-verification"
        );
        assert_eq!(CircuitId::TokenSwap.to_string(), "token-swap");
    }
}
