pub mod rest;
pub mod state;

// Re-export the handlers so the binary that builds the router can reach
// them without spelling out the module path each time.
pub use rest::{
    candidates_handler, checkin_handler, create_session_handler, delete_session_handler,
    get_session_handler, history_handler, identity_handler, next_adventure_handler,
    parameters_handler, register_pending_handler,
};
