//! crates/wayfarer_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the
//! core to be independent of specific external implementations like databases
//! or text-generation APIs.

use async_trait::async_trait;

use crate::domain::{CheckInRecord, Identity, Mood, Place};
use crate::geo::RadiusBounds;

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// The error boundary between the engine and its external collaborators.
///
/// Adapters translate driver-specific failures into these variants;
/// `DuplicatePhrase` in particular must come from the store's uniqueness
/// constraint (error kind), never from matching message text.
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("phrase '{0}' is already registered")]
    DuplicatePhrase(String),
    #[error("item not found: {0}")]
    NotFound(String),
    #[error("persistent store unavailable: {0}")]
    StoreUnavailable(String),
    #[error("place catalog unavailable: {0}")]
    CatalogUnavailable(String),
    #[error("recommendation text service unavailable: {0}")]
    TextServiceUnavailable(String),
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

/// The identity registry: recovery phrase to identity record.
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Registers a fresh identity for an unused phrase.
    ///
    /// The store's uniqueness constraint is the source of truth: a duplicate
    /// attempt fails with `DuplicatePhrase` and leaves existing state intact,
    /// also under concurrent duplicate attempts.
    async fn register(&self, phrase: &str) -> PortResult<Identity>;

    /// Exact-match lookup. Absence is a valid outcome (a new identity),
    /// not an error.
    async fn lookup(&self, phrase: &str) -> PortResult<Option<Identity>>;
}

/// The append-only check-in ledger backing all progression.
#[async_trait]
pub trait CheckInLedger: Send + Sync {
    /// Appends one reward event. Never rejects on business grounds; repeat
    /// check-ins at the same place are expected and feed the decay mechanic.
    async fn append(
        &self,
        identity_phrase: &str,
        place_name: &str,
        experience: i32,
    ) -> PortResult<CheckInRecord>;

    /// Number of prior records for this exact (identity, place) pair.
    async fn count_visits(&self, identity_phrase: &str, place_name: &str) -> PortResult<u32>;

    /// Full history for an identity, ordered by `created_at` ascending.
    async fn history(&self, identity_phrase: &str) -> PortResult<Vec<CheckInRecord>>;

    /// Sum of `experience_awarded` over all records; 0 when none exist.
    async fn total_experience(&self, identity_phrase: &str) -> PortResult<i64>;
}

/// Read-only query capability over the external place catalog.
#[async_trait]
pub trait PlaceCatalog: Send + Sync {
    /// Places matching the mood tag and origin keyword exactly
    /// (case-sensitive). An empty result is a valid outcome, never an error.
    ///
    /// `bounds` describes the radius the caller will accept; the catalog may
    /// have applied a radius at ingestion time, so the engine re-checks
    /// distance live regardless of what the catalog returns.
    async fn find_places(
        &self,
        mood: Mood,
        bounds: RadiusBounds,
        origin_keyword: &str,
    ) -> PortResult<Vec<Place>>;
}

/// The recommendation-text service, cacheable per place name.
#[async_trait]
pub trait BlurbService: Send + Sync {
    /// A short comment recommending the place. Non-deterministic in wording;
    /// callers must degrade gracefully when this fails.
    async fn blurb_for(&self, place_name: &str) -> PortResult<String>;
}
