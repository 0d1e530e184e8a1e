//! services/api/src/web/state.rs
//!
//! Defines the application's shared state and the in-process session map.

use std::collections::HashMap;

use tokio::sync::Mutex;
use uuid::Uuid;

use wayfarer_core::engine::AdventureEngine;
use wayfarer_core::session::Session;

/// The shared application state, created once at startup and passed to all
/// handlers.
///
/// Each entry in `sessions` is one user's transient `Session` value: created
/// by `POST /sessions`, mutated only through the state-machine transitions,
/// discarded on delete. Sessions are never shared between users, and the
/// engine itself is stateless, so the single map lock is the only
/// serialization point (the engine targets single-user, request/response
/// interaction).
pub struct AppState {
    pub engine: AdventureEngine,
    pub sessions: Mutex<HashMap<Uuid, Session>>,
}

impl AppState {
    pub fn new(engine: AdventureEngine) -> Self {
        Self {
            engine,
            sessions: Mutex::new(HashMap::new()),
        }
    }
}
