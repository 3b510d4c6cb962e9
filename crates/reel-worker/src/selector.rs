//! Candidate selection.
//!
//! A candidate is eligible when its popularity meets the policy threshold
//! and the ledger has no record of it. One eligible candidate is chosen
//! uniformly at random, so repeated runs over a slowly changing pool do
//! not always land on the same item.

use rand::rngs::StdRng;
use rand::seq::{IndexedRandom, SliceRandom};
use rand::{Rng, SeedableRng};
use tracing::debug;

use reel_ledger::PublicationLedger;
use reel_models::{Candidate, CandidatePool, SelectionPolicy};

use crate::error::{PipelineError, PipelineResult};
use crate::report::RunStage;

/// Picks the candidate to publish.
#[derive(Debug)]
pub struct Selector<R = StdRng> {
    rng: R,
}

impl Selector<StdRng> {
    /// Selector seeded from the operating system.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_os_rng(),
        }
    }

    /// Deterministic selector.
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl<R: Rng> Selector<R> {
    pub fn with_rng(rng: R) -> Self {
        Self { rng }
    }

    /// Pick the channel for this run.
    pub fn choose_channel<'a>(&mut self, channels: &'a [String]) -> Option<&'a str> {
        channels.choose(&mut self.rng).map(String::as_str)
    }

    /// Choose one eligible candidate from the pool.
    ///
    /// The ledger is only consulted for candidates that pass the popularity
    /// threshold. A ledger error aborts selection rather than being read as
    /// "not published".
    pub async fn select(
        &mut self,
        pool: &CandidatePool,
        ledger: &dyn PublicationLedger,
        policy: &SelectionPolicy,
    ) -> PipelineResult<Candidate> {
        let mut order: Vec<&Candidate> = pool.candidates.iter().collect();
        order.shuffle(&mut self.rng);

        let mut eligible = Vec::with_capacity(order.len());
        for candidate in order {
            if !policy.meets_threshold(candidate) {
                continue;
            }
            let seen = ledger
                .contains(&candidate.id)
                .await
                .map_err(|e| PipelineError::ledger(RunStage::Select, e))?;
            if seen {
                debug!(id = %candidate.id, "Skipping already published candidate");
                continue;
            }
            eligible.push(candidate);
        }

        debug!(
            channel = %pool.channel,
            pool_size = pool.len(),
            eligible = eligible.len(),
            min_popularity = policy.min_popularity,
            "Filtered candidate pool"
        );

        eligible
            .choose(&mut self.rng)
            .map(|c| (*c).clone())
            .ok_or_else(|| PipelineError::NoEligibleCandidate {
                channel: pool.channel.clone(),
                pool_size: pool.len(),
            })
    }
}
