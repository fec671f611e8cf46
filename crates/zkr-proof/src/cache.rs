//! # Proof Cache
//!
//! Fingerprint-keyed result cache over any [`ProofGenerator`], providing:
//!
//! - **TTL reuse**: entries younger than the TTL (30 minutes by default)
//!   are returned without touching the generator, unless the caller forces
//!   a refresh.
//! - **Single flight**: at most one concurrent generation per fingerprint.
//!   Concurrent callers for the same fingerprint share one generator
//!   invocation and observe the same result. This is a required property,
//!   not an optimization — proving work is too expensive to duplicate.
//! - **Cooperative cancellation**: starting a generation for a *different*
//!   fingerprint cancels the in-flight one. A cancelled generation
//!   resolves to [`Generation::Cancelled`] — a distinct outcome, not an
//!   error — and never populates the cache. Cancellation is advisory: the
//!   proving computation is not preemptible mid-flight, so the contract is
//!   "stop waiting and don't cache", not "halt instantly".
//!
//! Entries are evicted only by TTL expiry or `force_refresh`; there is no
//! size-bounded eviction. Acceptable at the low circuit×input cardinality
//! of interactive sessions; a shared deployment would want an LRU bound.
//!
//! The fingerprint table is process-local. No cross-process consistency is
//! claimed or required.

use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

use zkr_core::{Fingerprint, ProofRequest};

use crate::engine::{GeneratedProof, ProofGenerator};
use crate::error::ProofError;

/// Default lifetime of a cached proof result.
pub const DEFAULT_TTL: Duration = Duration::from_secs(30 * 60);

/// Outcome of a cache lookup-or-generate call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Generation {
    /// A result was produced or reused.
    Completed {
        /// The generated (or cached) proof.
        proof: GeneratedProof,
        /// Whether it came from the cache rather than a fresh generation.
        from_cache: bool,
    },
    /// The generation was superseded by a request for a different
    /// fingerprint before it settled.
    Cancelled,
}

impl Generation {
    /// The completed proof, if any.
    pub fn proof(&self) -> Option<&GeneratedProof> {
        match self {
            Self::Completed { proof, .. } => Some(proof),
            Self::Cancelled => None,
        }
    }
}

/// How a settled in-flight generation is fanned out to its waiters.
#[derive(Debug, Clone)]
enum Settled {
    Done(GeneratedProof),
    Failed(ProofError),
    Cancelled,
}

struct CacheEntry {
    proof: GeneratedProof,
    inserted_at: Instant,
}

struct InFlight {
    done_rx: watch::Receiver<Option<Settled>>,
    cancel_tx: watch::Sender<bool>,
}

#[derive(Default)]
struct CacheState {
    entries: HashMap<Fingerprint, CacheEntry>,
    in_flight: HashMap<Fingerprint, InFlight>,
}

/// Caching, de-duplicating, cancellable wrapper around a proof generator.
pub struct ProofCache {
    generator: Arc<dyn ProofGenerator>,
    ttl: Duration,
    state: Arc<Mutex<CacheState>>,
}

impl ProofCache {
    /// Cache with the default 30-minute TTL.
    pub fn new(generator: Arc<dyn ProofGenerator>) -> Self {
        Self::with_ttl(generator, DEFAULT_TTL)
    }

    /// Cache with an explicit TTL.
    pub fn with_ttl(generator: Arc<dyn ProofGenerator>, ttl: Duration) -> Self {
        Self {
            generator,
            ttl,
            state: Arc::new(Mutex::new(CacheState::default())),
        }
    }

    /// Drop every cached entry.
    pub fn clear(&self) {
        self.state.lock().entries.clear();
    }

    /// Number of live cache entries (expired ones included until reaped).
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Return the cached result for `request` or generate it.
    ///
    /// `force_refresh` bypasses (and on success replaces) a fresh cache
    /// entry; it does not bypass de-duplication with an in-flight
    /// generation of the same fingerprint.
    pub async fn get_or_generate(
        &self,
        request: &ProofRequest,
        force_refresh: bool,
    ) -> Result<Generation, ProofError> {
        let fingerprint = request.fingerprint();

        enum Role {
            CacheHit(GeneratedProof),
            Follower(watch::Receiver<Option<Settled>>),
            Leader {
                done_tx: watch::Sender<Option<Settled>>,
                cancel_rx: watch::Receiver<bool>,
            },
        }

        let role = {
            let mut state = self.state.lock();

            let fresh_hit = match state.entries.get(&fingerprint) {
                Some(entry) if !force_refresh && entry.inserted_at.elapsed() < self.ttl => {
                    Some(entry.proof.clone())
                }
                _ => None,
            };

            if let Some(proof) = fresh_hit {
                tracing::debug!(fingerprint = %fingerprint, "proof cache hit");
                Role::CacheHit(proof)
            } else if let Some(flight) = state.in_flight.get(&fingerprint) {
                Role::Follower(flight.done_rx.clone())
            } else {
                // A new generation supersedes every in-flight one for a
                // different fingerprint.
                for (other, flight) in state.in_flight.iter() {
                    if *other != fingerprint {
                        tracing::debug!(
                            superseded = %other,
                            by = %fingerprint,
                            "cancelling in-flight proof generation"
                        );
                        let _ = flight.cancel_tx.send(true);
                    }
                }
                let (done_tx, done_rx) = watch::channel(None);
                let (cancel_tx, cancel_rx) = watch::channel(false);
                state
                    .in_flight
                    .insert(fingerprint, InFlight { done_rx, cancel_tx });
                Role::Leader { done_tx, cancel_rx }
            }
        };

        match role {
            Role::CacheHit(proof) => Ok(Generation::Completed {
                proof,
                from_cache: true,
            }),
            Role::Follower(rx) => Self::await_settled(rx).await,
            Role::Leader { done_tx, cancel_rx } => {
                self.lead_generation(request, fingerprint, done_tx, cancel_rx)
                    .await
            }
        }
    }

    /// Run the generation as this fingerprint's single flight.
    async fn lead_generation(
        &self,
        request: &ProofRequest,
        fingerprint: Fingerprint,
        done_tx: watch::Sender<Option<Settled>>,
        mut cancel_rx: watch::Receiver<bool>,
    ) -> Result<Generation, ProofError> {
        let generator = Arc::clone(&self.generator);
        let owned_request = request.clone();
        let mut task = tokio::spawn(async move { generator.generate(&owned_request).await });

        let settled = tokio::select! {
            joined = &mut task => match joined {
                Ok(Ok(proof)) => {
                    // A cancellation that lost the race to completion still
                    // wins: the result is discarded, not cached.
                    if *cancel_rx.borrow() {
                        Settled::Cancelled
                    } else {
                        Settled::Done(proof)
                    }
                }
                Ok(Err(err)) => Settled::Failed(err),
                Err(join_err) => Settled::Failed(ProofError::ProvingFailed(format!(
                    "generation task failed: {join_err}"
                ))),
            },
            _ = cancel_rx.changed() => {
                // The computation itself is not preemptible; dropping the
                // handle detaches the task, which finishes in the
                // background and has its result discarded.
                drop(task);
                Settled::Cancelled
            }
        };

        {
            let mut state = self.state.lock();
            state.in_flight.remove(&fingerprint);
            if let Settled::Done(ref proof) = settled {
                state.entries.insert(
                    fingerprint,
                    CacheEntry {
                        proof: proof.clone(),
                        inserted_at: Instant::now(),
                    },
                );
            }
        }

        let _ = done_tx.send(Some(settled.clone()));

        match settled {
            Settled::Done(proof) => Ok(Generation::Completed {
                proof,
                from_cache: false,
            }),
            Settled::Failed(err) => Err(err),
            Settled::Cancelled => Ok(Generation::Cancelled),
        }
    }

    /// Wait for another caller's in-flight generation to settle.
    async fn await_settled(
        mut rx: watch::Receiver<Option<Settled>>,
    ) -> Result<Generation, ProofError> {
        loop {
            if let Some(settled) = rx.borrow().clone() {
                return match settled {
                    Settled::Done(proof) => Ok(Generation::Completed {
                        proof,
                        from_cache: false,
                    }),
                    Settled::Failed(err) => Err(err),
                    Settled::Cancelled => Ok(Generation::Cancelled),
                };
            }
            if rx.changed().await.is_err() {
                return Err(ProofError::ProvingFailed(
                    "proof generation abandoned without settling".to_string(),
                ));
            }
        }
    }
}
