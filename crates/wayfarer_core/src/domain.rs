//! crates/wayfarer_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database or serialization format.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::geo::RadiusBounds;

/// Raised when a user selection does not belong to one of the fixed
/// enumerations. Caught at the session boundary so malformed input never
/// reaches the geo filter or the catalog.
#[derive(Debug, Clone, thiserror::Error)]
#[error("invalid {field} selection: '{value}'")]
pub struct InvalidParameter {
    pub field: &'static str,
    pub value: String,
}

/// One pseudonymous player, keyed by their recovery phrase.
///
/// Progression is never stored here: level and experience are always derived
/// from the check-in ledger on read.
#[derive(Debug, Clone)]
pub struct Identity {
    pub phrase: String,
    pub created_at: DateTime<Utc>,
}

/// Ledger-derived progression for one identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub total_experience: i64,
    pub level: i64,
    pub experience_into_level: i64,
}

impl Progress {
    /// Levels are 100 experience wide; the remainder carries into the
    /// current level.
    pub fn from_total(total_experience: i64) -> Self {
        Self {
            total_experience,
            level: total_experience / 100,
            experience_into_level: total_experience % 100,
        }
    }
}

/// The fixed mood categories used to filter places.
///
/// Tags are matched exactly (case-sensitive) against the catalog; there is
/// no fuzzy matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mood {
    Cafe,
    Relaxation,
    Entertainment,
    Shopping,
}

impl Mood {
    pub const ALL: [Mood; 4] = [
        Mood::Cafe,
        Mood::Relaxation,
        Mood::Entertainment,
        Mood::Shopping,
    ];

    pub fn as_tag(&self) -> &'static str {
        match self {
            Mood::Cafe => "cafe",
            Mood::Relaxation => "relaxation",
            Mood::Entertainment => "entertainment",
            Mood::Shopping => "shopping",
        }
    }

    pub fn from_tag(tag: &str) -> Result<Self, InvalidParameter> {
        match tag {
            "cafe" => Ok(Mood::Cafe),
            "relaxation" => Ok(Mood::Relaxation),
            "entertainment" => Ok(Mood::Entertainment),
            "shopping" => Ok(Mood::Shopping),
            other => Err(InvalidParameter {
                field: "mood",
                value: other.to_string(),
            }),
        }
    }
}

/// A time budget for one adventure, selected as a duration label.
///
/// Each budget maps to a fixed distance bucket; the buckets are contiguous,
/// non-overlapping and ascending.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeBudget {
    Min30,
    Min60,
    Min120,
}

impl TimeBudget {
    pub fn from_minutes(minutes: u32) -> Result<Self, InvalidParameter> {
        match minutes {
            30 => Ok(TimeBudget::Min30),
            60 => Ok(TimeBudget::Min60),
            120 => Ok(TimeBudget::Min120),
            other => Err(InvalidParameter {
                field: "time",
                value: other.to_string(),
            }),
        }
    }

    pub fn minutes(&self) -> u32 {
        match self {
            TimeBudget::Min30 => 30,
            TimeBudget::Min60 => 60,
            TimeBudget::Min120 => 120,
        }
    }

    /// The distance bucket for this budget, in meters. Both ends are
    /// inclusive when testing membership.
    pub fn radius_bounds(&self) -> RadiusBounds {
        match self {
            TimeBudget::Min30 => RadiusBounds::new(0.0, 500.0),
            TimeBudget::Min60 => RadiusBounds::new(500.0, 1000.0),
            TimeBudget::Min120 => RadiusBounds::new(1000.0, 2000.0),
        }
    }
}

/// The fixed set of departure stations an adventure can start from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    HakataStation,
    TenjinStation,
    NakasuKawabataStation,
}

impl Origin {
    pub const ALL: [Origin; 3] = [
        Origin::HakataStation,
        Origin::TenjinStation,
        Origin::NakasuKawabataStation,
    ];

    /// The keyword the catalog stores for this station.
    pub fn keyword(&self) -> &'static str {
        match self {
            Origin::HakataStation => "Hakata Station",
            Origin::TenjinStation => "Tenjin Station",
            Origin::NakasuKawabataStation => "Nakasu-Kawabata Station",
        }
    }

    /// Station coordinates, used as the origin of the live distance check.
    pub fn coordinates(&self) -> (f64, f64) {
        match self {
            Origin::HakataStation => (33.5897, 130.4207),
            Origin::TenjinStation => (33.5914, 130.3989),
            Origin::NakasuKawabataStation => (33.5937, 130.4043),
        }
    }

    pub fn from_keyword(keyword: &str) -> Result<Self, InvalidParameter> {
        Origin::ALL
            .into_iter()
            .find(|o| o.keyword() == keyword)
            .ok_or_else(|| InvalidParameter {
                field: "origin",
                value: keyword.to_string(),
            })
    }
}

/// A point of interest from the place catalog. Immutable once ingested;
/// the core only reads.
#[derive(Debug, Clone)]
pub struct Place {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub mood: Mood,
    pub source_url: Option<String>,
}

/// One reward event in the append-only check-in ledger.
#[derive(Debug, Clone)]
pub struct CheckInRecord {
    pub id: Uuid,
    pub identity_phrase: String,
    pub place_name: String,
    pub experience_awarded: i32,
    pub created_at: DateTime<Utc>,
}

/// A candidate place together with its recommendation blurb.
///
/// The pair is built as one value so the commentary can never drift out of
/// alignment with the list of places it describes.
#[derive(Debug, Clone)]
pub struct Recommendation {
    pub place: Place,
    pub blurb: String,
}

/// A validated (time, mood, origin) triple for one adventure cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AdventureParams {
    pub time: TimeBudget,
    pub mood: Mood,
    pub origin: Origin,
}

impl AdventureParams {
    /// Parses raw user selections against the fixed enumerations.
    pub fn from_selections(
        minutes: u32,
        mood_tag: &str,
        origin_keyword: &str,
    ) -> Result<Self, InvalidParameter> {
        Ok(Self {
            time: TimeBudget::from_minutes(minutes)?,
            mood: Mood::from_tag(mood_tag)?,
            origin: Origin::from_keyword(origin_keyword)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_splits_total_into_level_and_remainder() {
        let p = Progress::from_total(250);
        assert_eq!(p.level, 2);
        assert_eq!(p.experience_into_level, 50);
        assert_eq!(p.level * 100 + p.experience_into_level, p.total_experience);

        let zero = Progress::from_total(0);
        assert_eq!(zero.level, 0);
        assert_eq!(zero.experience_into_level, 0);
    }

    #[test]
    fn mood_tags_round_trip_and_reject_unknown() {
        for mood in Mood::ALL {
            assert_eq!(Mood::from_tag(mood.as_tag()).unwrap(), mood);
        }
        // Matching is case-sensitive by design.
        assert!(Mood::from_tag("Cafe").is_err());
        assert!(Mood::from_tag("onsen").is_err());
    }

    #[test]
    fn time_budget_rejects_off_menu_durations() {
        assert!(TimeBudget::from_minutes(30).is_ok());
        assert!(TimeBudget::from_minutes(45).is_err());
        assert!(TimeBudget::from_minutes(0).is_err());
    }

    #[test]
    fn origin_keywords_round_trip() {
        for origin in Origin::ALL {
            assert_eq!(Origin::from_keyword(origin.keyword()).unwrap(), origin);
        }
        assert!(Origin::from_keyword("Kokura Station").is_err());
    }

    #[test]
    fn params_require_all_three_selections_to_be_valid() {
        assert!(AdventureParams::from_selections(30, "cafe", "Hakata Station").is_ok());
        assert!(AdventureParams::from_selections(31, "cafe", "Hakata Station").is_err());
        assert!(AdventureParams::from_selections(30, "café", "Hakata Station").is_err());
        assert!(AdventureParams::from_selections(30, "cafe", "hakata").is_err());
    }
}
