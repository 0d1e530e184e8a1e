pub mod domain;
pub mod engine;
pub mod geo;
pub mod ports;
pub mod progression;
pub mod session;
pub mod testing;

pub use domain::{
    AdventureParams, CheckInRecord, Identity, InvalidParameter, Mood, Origin, Place, Progress,
    Recommendation, TimeBudget,
};
pub use engine::{AdventureEngine, CheckInOutcome};
pub use ports::{BlurbService, CheckInLedger, IdentityStore, PlaceCatalog, PortError, PortResult};
pub use session::{Phase, Session, SessionError};
