//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete
//! implementation of the `IdentityStore`, `CheckInLedger` and `PlaceCatalog`
//! ports from the `core` crate. It handles all interactions with the
//! PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use wayfarer_core::domain::{CheckInRecord, Identity, Mood, Place};
use wayfarer_core::geo::RadiusBounds;
use wayfarer_core::ports::{
    CheckInLedger, IdentityStore, PlaceCatalog, PortError, PortResult,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter implementing the three persistent-store ports on one
/// connection pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Creates a new `PgStore`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn store_err(e: sqlx::Error) -> PortError {
    PortError::StoreUnavailable(e.to_string())
}

fn catalog_err(e: sqlx::Error) -> PortError {
    PortError::CatalogUnavailable(e.to_string())
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

#[derive(FromRow)]
struct IdentityRecord {
    phrase: String,
    created_at: DateTime<Utc>,
}
impl IdentityRecord {
    fn to_domain(self) -> Identity {
        Identity {
            phrase: self.phrase,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct CheckInRow {
    id: Uuid,
    identity_phrase: String,
    place_name: String,
    experience: i32,
    created_at: DateTime<Utc>,
}
impl CheckInRow {
    fn to_domain(self) -> CheckInRecord {
        CheckInRecord {
            id: self.id,
            identity_phrase: self.identity_phrase,
            place_name: self.place_name,
            experience_awarded: self.experience,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
struct PlaceRow {
    name: String,
    lat: f64,
    lon: f64,
    mood: String,
    url: Option<String>,
}
impl PlaceRow {
    fn to_domain(self) -> PortResult<Place> {
        let mood = Mood::from_tag(&self.mood).map_err(|_| {
            PortError::CatalogUnavailable(format!(
                "place '{}' carries unknown mood tag '{}'",
                self.name, self.mood
            ))
        })?;
        Ok(Place {
            name: self.name,
            latitude: self.lat,
            longitude: self.lon,
            mood,
            source_url: self.url,
        })
    }
}

//=========================================================================================
// `IdentityStore` Trait Implementation
//=========================================================================================

#[async_trait]
impl IdentityStore for PgStore {
    async fn register(&self, phrase: &str) -> PortResult<Identity> {
        // The primary key on `phrase` is the source of truth for uniqueness;
        // a concurrent duplicate attempt loses here, not in a pre-check.
        let record = sqlx::query_as::<_, IdentityRecord>(
            "INSERT INTO identities (phrase) VALUES ($1) RETURNING phrase, created_at",
        )
        .bind(phrase)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            let is_duplicate = e
                .as_database_error()
                .map(|db| db.is_unique_violation())
                .unwrap_or(false);
            if is_duplicate {
                PortError::DuplicatePhrase(phrase.to_string())
            } else {
                store_err(e)
            }
        })?;
        Ok(record.to_domain())
    }

    async fn lookup(&self, phrase: &str) -> PortResult<Option<Identity>> {
        let record = sqlx::query_as::<_, IdentityRecord>(
            "SELECT phrase, created_at FROM identities WHERE phrase = $1",
        )
        .bind(phrase)
        .fetch_optional(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(record.map(IdentityRecord::to_domain))
    }
}

//=========================================================================================
// `CheckInLedger` Trait Implementation
//=========================================================================================

#[async_trait]
impl CheckInLedger for PgStore {
    async fn append(
        &self,
        identity_phrase: &str,
        place_name: &str,
        experience: i32,
    ) -> PortResult<CheckInRecord> {
        let record = sqlx::query_as::<_, CheckInRow>(
            "INSERT INTO checkins (id, identity_phrase, place_name, experience) \
             VALUES ($1, $2, $3, $4) \
             RETURNING id, identity_phrase, place_name, experience, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(identity_phrase)
        .bind(place_name)
        .bind(experience)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(record.to_domain())
    }

    async fn count_visits(&self, identity_phrase: &str, place_name: &str) -> PortResult<u32> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM checkins WHERE identity_phrase = $1 AND place_name = $2",
        )
        .bind(identity_phrase)
        .bind(place_name)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        // A saturating conversion: the decay floor makes any count beyond
        // u32 range indistinguishable anyway.
        Ok(u32::try_from(count).unwrap_or(u32::MAX))
    }

    async fn history(&self, identity_phrase: &str) -> PortResult<Vec<CheckInRecord>> {
        let records = sqlx::query_as::<_, CheckInRow>(
            "SELECT id, identity_phrase, place_name, experience, created_at \
             FROM checkins WHERE identity_phrase = $1 ORDER BY created_at ASC",
        )
        .bind(identity_phrase)
        .fetch_all(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(records.into_iter().map(CheckInRow::to_domain).collect())
    }

    async fn total_experience(&self, identity_phrase: &str) -> PortResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(experience), 0) FROM checkins WHERE identity_phrase = $1",
        )
        .bind(identity_phrase)
        .fetch_one(&self.pool)
        .await
        .map_err(store_err)?;
        Ok(total)
    }
}

//=========================================================================================
// `PlaceCatalog` Trait Implementation
//=========================================================================================

#[async_trait]
impl PlaceCatalog for PgStore {
    async fn find_places(
        &self,
        mood: Mood,
        _bounds: RadiusBounds,
        origin_keyword: &str,
    ) -> PortResult<Vec<Place>> {
        // The ingestion job applied a fixed radius when seeding; the engine
        // re-checks distance against the live bucket, so only the exact tag
        // matches happen here. Insertion order is the catalog's relevance
        // order and must be preserved.
        let rows = sqlx::query_as::<_, PlaceRow>(
            "SELECT name, lat, lon, mood, url FROM places \
             WHERE mood = $1 AND origin = $2 ORDER BY id ASC",
        )
        .bind(mood.as_tag())
        .bind(origin_keyword)
        .fetch_all(&self.pool)
        .await
        .map_err(catalog_err)?;

        rows.into_iter().map(PlaceRow::to_domain).collect()
    }
}
