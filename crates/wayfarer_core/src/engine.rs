//! crates/wayfarer_core/src/engine.rs
//!
//! The adventure engine: orchestrates the identity registry, check-in
//! ledger, place catalog and blurb service behind the port traits. All
//! progression is derived from the ledger on every call; nothing here
//! caches a level.

use std::sync::Arc;

use tracing::warn;

use crate::domain::{
    AdventureParams, CheckInRecord, Identity, Progress, Recommendation,
};
use crate::geo;
use crate::ports::{
    BlurbService, CheckInLedger, IdentityStore, PlaceCatalog, PortError, PortResult,
};
use crate::progression::reward_for_visits;

/// The outcome of one check-in: the appended record plus the ledger-derived
/// progression after it, and whether a 100-point boundary was crossed.
#[derive(Debug, Clone)]
pub struct CheckInOutcome {
    pub record: CheckInRecord,
    pub progress: Progress,
    pub leveled_up: bool,
}

/// Orchestrates one user's adventure operations over the service ports.
///
/// Cheap to clone; all ports are shared behind `Arc`.
#[derive(Clone)]
pub struct AdventureEngine {
    identities: Arc<dyn IdentityStore>,
    ledger: Arc<dyn CheckInLedger>,
    catalog: Arc<dyn PlaceCatalog>,
    blurbs: Arc<dyn BlurbService>,
}

impl AdventureEngine {
    pub fn new(
        identities: Arc<dyn IdentityStore>,
        ledger: Arc<dyn CheckInLedger>,
        catalog: Arc<dyn PlaceCatalog>,
        blurbs: Arc<dyn BlurbService>,
    ) -> Self {
        Self {
            identities,
            ledger,
            catalog,
            blurbs,
        }
    }

    /// Registers an unused phrase. `DuplicatePhrase` propagates untouched so
    /// the session layer can surface it as a correctable error.
    pub async fn register(&self, phrase: &str) -> PortResult<Identity> {
        self.identities.register(phrase).await
    }

    /// Exact-match lookup; `None` means "new identity", not a failure.
    pub async fn recall(&self, phrase: &str) -> PortResult<Option<Identity>> {
        self.identities.lookup(phrase).await
    }

    /// Current ledger-derived progression for an identity.
    pub async fn progress(&self, phrase: &str) -> PortResult<Progress> {
        let total = self.ledger.total_experience(phrase).await?;
        Ok(Progress::from_total(total))
    }

    /// The candidate pipeline: catalog query, live distance re-check against
    /// the user's bucket, then one blurb per surviving place.
    ///
    /// Catalog order is preserved end to end. A blurb failure degrades to an
    /// empty blurb and never blocks candidate display.
    pub async fn find_candidates(
        &self,
        params: &AdventureParams,
    ) -> PortResult<Vec<Recommendation>> {
        let bounds = params.time.radius_bounds();
        let places = self
            .catalog
            .find_places(params.mood, bounds, params.origin.keyword())
            .await?;

        // The catalog's stored radius tag is advisory only (ingestion used a
        // fixed radius); the user's current bucket is re-checked here.
        let (origin_lat, origin_lon) = params.origin.coordinates();
        let in_range = geo::filter_by_bounds(origin_lat, origin_lon, bounds, places);

        let mut candidates = Vec::with_capacity(in_range.len());
        for place in in_range {
            let blurb = match self.blurbs.blurb_for(&place.name).await {
                Ok(text) => text,
                Err(PortError::TextServiceUnavailable(msg)) => {
                    warn!(place = %place.name, error = %msg, "blurb generation failed, degrading to empty");
                    String::new()
                }
                Err(other) => return Err(other),
            };
            candidates.push(Recommendation { place, blurb });
        }
        Ok(candidates)
    }

    /// Appends a check-in and reports the resulting progression.
    ///
    /// The reward is a function of the prior-visit count to this exact place;
    /// level-up is detected by comparing ledger-derived levels before and
    /// after the append, never a stored field.
    pub async fn check_in(&self, phrase: &str, place_name: &str) -> PortResult<CheckInOutcome> {
        let before = Progress::from_total(self.ledger.total_experience(phrase).await?);

        let prior_visits = self.ledger.count_visits(phrase, place_name).await?;
        let reward = reward_for_visits(prior_visits);
        let record = self.ledger.append(phrase, place_name, reward).await?;

        let after = Progress::from_total(self.ledger.total_experience(phrase).await?);
        Ok(CheckInOutcome {
            record,
            leveled_up: after.level > before.level,
            progress: after,
        })
    }

    /// Full check-in history for an identity, oldest first.
    pub async fn history(&self, phrase: &str) -> PortResult<Vec<CheckInRecord>> {
        self.ledger.history(phrase).await
    }
}
