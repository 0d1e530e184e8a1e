//! Testing utilities for the adventure engine.
//!
//! In-memory implementations of the service ports, for deterministic tests
//! without a database or text-generation API:
//! - `MemoryStore` — identity registry and check-in ledger over a mutexed map
//! - `MemoryCatalog` — a seeded place catalog with exact tag matching
//! - `CannedBlurbs` / `DownBlurbs` — blurb service doubles

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::domain::{CheckInRecord, Identity, Mood, Origin, Place};
use crate::geo::RadiusBounds;
use crate::ports::{
    BlurbService, CheckInLedger, IdentityStore, PlaceCatalog, PortError, PortResult,
};

/// In-memory identity registry plus check-in ledger.
///
/// The ledger is a plain append-only vec, so history order is insertion
/// order, which matches `created_at` ascending.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<MemoryStoreInner>,
}

#[derive(Default)]
struct MemoryStoreInner {
    identities: HashMap<String, Identity>,
    checkins: Vec<CheckInRecord>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IdentityStore for MemoryStore {
    async fn register(&self, phrase: &str) -> PortResult<Identity> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        if inner.identities.contains_key(phrase) {
            return Err(PortError::DuplicatePhrase(phrase.to_string()));
        }
        let identity = Identity {
            phrase: phrase.to_string(),
            created_at: Utc::now(),
        };
        inner
            .identities
            .insert(phrase.to_string(), identity.clone());
        Ok(identity)
    }

    async fn lookup(&self, phrase: &str) -> PortResult<Option<Identity>> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner.identities.get(phrase).cloned())
    }
}

#[async_trait]
impl CheckInLedger for MemoryStore {
    async fn append(
        &self,
        identity_phrase: &str,
        place_name: &str,
        experience: i32,
    ) -> PortResult<CheckInRecord> {
        let mut inner = self.inner.lock().map_err(poisoned)?;
        let record = CheckInRecord {
            id: Uuid::new_v4(),
            identity_phrase: identity_phrase.to_string(),
            place_name: place_name.to_string(),
            experience_awarded: experience,
            created_at: Utc::now(),
        };
        inner.checkins.push(record.clone());
        Ok(record)
    }

    async fn count_visits(&self, identity_phrase: &str, place_name: &str) -> PortResult<u32> {
        let inner = self.inner.lock().map_err(poisoned)?;
        let count = inner
            .checkins
            .iter()
            .filter(|r| r.identity_phrase == identity_phrase && r.place_name == place_name)
            .count();
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn history(&self, identity_phrase: &str) -> PortResult<Vec<CheckInRecord>> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner
            .checkins
            .iter()
            .filter(|r| r.identity_phrase == identity_phrase)
            .cloned()
            .collect())
    }

    async fn total_experience(&self, identity_phrase: &str) -> PortResult<i64> {
        let inner = self.inner.lock().map_err(poisoned)?;
        Ok(inner
            .checkins
            .iter()
            .filter(|r| r.identity_phrase == identity_phrase)
            .map(|r| i64::from(r.experience_awarded))
            .sum())
    }
}

fn poisoned<T>(_: std::sync::PoisonError<T>) -> PortError {
    PortError::StoreUnavailable("memory store mutex poisoned".to_string())
}

/// A seeded in-memory place catalog.
///
/// Matching mirrors the real store: exact, case-sensitive mood tag and
/// origin keyword. The radius bounds are ignored, as the live re-check
/// belongs to the engine.
#[derive(Default)]
pub struct MemoryCatalog {
    rows: Vec<(Origin, Place)>,
}

impl MemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_place(mut self, origin: Origin, place: Place) -> Self {
        self.rows.push((origin, place));
        self
    }
}

#[async_trait]
impl PlaceCatalog for MemoryCatalog {
    async fn find_places(
        &self,
        mood: Mood,
        _bounds: RadiusBounds,
        origin_keyword: &str,
    ) -> PortResult<Vec<Place>> {
        Ok(self
            .rows
            .iter()
            .filter(|(origin, place)| {
                origin.keyword() == origin_keyword && place.mood == mood
            })
            .map(|(_, place)| place.clone())
            .collect())
    }
}

/// Returns the same scripted blurb for every place.
pub struct CannedBlurbs {
    text: String,
}

impl CannedBlurbs {
    pub fn new(text: impl Into<String>) -> Self {
        Self { text: text.into() }
    }
}

#[async_trait]
impl BlurbService for CannedBlurbs {
    async fn blurb_for(&self, _place_name: &str) -> PortResult<String> {
        Ok(self.text.clone())
    }
}

/// Always fails, for exercising the graceful-degradation path.
pub struct DownBlurbs;

#[async_trait]
impl BlurbService for DownBlurbs {
    async fn blurb_for(&self, _place_name: &str) -> PortResult<String> {
        Err(PortError::TextServiceUnavailable(
            "scripted outage".to_string(),
        ))
    }
}
