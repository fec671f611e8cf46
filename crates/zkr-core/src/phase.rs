//! # Ceremony Phase Derivation
//!
//! The ceremony phase is derived, never stored. A circuit is ready to
//! finalize once its contribution count reaches [`REQUIRED_CONTRIBUTIONS`];
//! the ceremony as a whole is gated by the *minimum* count across all
//! circuits, so a single lagging circuit holds back finalization of every
//! other one. `Finalized` is an explicit operator action and is never
//! produced by [`CeremonyPhase::derive`].

use serde::{Deserialize, Serialize};

/// Contributions each circuit needs before the ceremony can be finalized.
pub const REQUIRED_CONTRIBUTIONS: u32 = 5;

/// Lifecycle phase of the trusted-setup ceremony.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CeremonyPhase {
    /// Accepting contributions.
    Contribution,
    /// Every circuit has reached the required contribution count.
    ReadyToFinalize,
    /// Terminal: an operator has finalized the key material.
    Finalized,
}

impl CeremonyPhase {
    /// Derive the phase from the minimum contribution count across circuits.
    pub fn derive(min_contributions: u32) -> Self {
        if min_contributions >= REQUIRED_CONTRIBUTIONS {
            Self::ReadyToFinalize
        } else {
            Self::Contribution
        }
    }

    /// Returns the snake_case string identifier for this phase.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Contribution => "contribution",
            Self::ReadyToFinalize => "ready_to_finalize",
            Self::Finalized => "finalized",
        }
    }
}

impl std::fmt::Display for CeremonyPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn below_threshold_is_contribution() {
        for n in 0..REQUIRED_CONTRIBUTIONS {
            assert_eq!(CeremonyPhase::derive(n), CeremonyPhase::Contribution);
        }
    }

    #[test]
    fn at_threshold_is_ready_to_finalize() {
        assert_eq!(
            CeremonyPhase::derive(REQUIRED_CONTRIBUTIONS),
            CeremonyPhase::ReadyToFinalize
        );
        assert_eq!(
            CeremonyPhase::derive(REQUIRED_CONTRIBUTIONS + 10),
            CeremonyPhase::ReadyToFinalize
        );
    }

    #[test]
    fn finalized_is_never_derived() {
        // Finalized is set by an operator, not computed from counts.
        for n in 0..100 {
            assert_ne!(CeremonyPhase::derive(n), CeremonyPhase::Finalized);
        }
    }

    #[test]
    fn serde_uses_snake_case() {
        assert_eq!(
            serde_json::to_string(&CeremonyPhase::ReadyToFinalize).unwrap(),
            "\"ready_to_finalize\""
        );
        let back: CeremonyPhase = serde_json::from_str("\"contribution\"").unwrap();
        assert_eq!(back, CeremonyPhase::Contribution);
    }
}
