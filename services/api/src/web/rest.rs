//! services/api/src/web/rest.rs
//!
//! Contains the Axum handlers for the REST API endpoints and the master
//! definition for the OpenAPI specification. The endpoints mirror the
//! session state machine one-to-one; a failed call never advances a
//! session's phase.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::error;
use utoipa::{OpenApi, ToSchema};
use uuid::Uuid;

use crate::web::state::AppState;
use wayfarer_core::domain::Progress;
use wayfarer_core::ports::PortError;
use wayfarer_core::session::{Phase, Session, SessionError};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        create_session_handler,
        get_session_handler,
        delete_session_handler,
        identity_handler,
        register_pending_handler,
        parameters_handler,
        candidates_handler,
        checkin_handler,
        next_adventure_handler,
        history_handler,
    ),
    components(schemas(
        SessionCreatedResponse,
        SessionSnapshot,
        ProgressBody,
        IdentityRequest,
        IdentityResponse,
        ParametersRequest,
        CandidateBody,
        CheckInRequest,
        CheckInResponse,
        HistoryEntry,
    )),
    tags(
        (name = "Wayfarer API", description = "Adventure recommendation and check-in progression endpoints.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// API Response and Payload Structs
//=========================================================================================

/// The response payload sent after creating a fresh session.
#[derive(Serialize, ToSchema)]
pub struct SessionCreatedResponse {
    session_id: Uuid,
}

/// Ledger-derived progression, embedded wherever progression is reported.
#[derive(Serialize, ToSchema)]
pub struct ProgressBody {
    total_experience: i64,
    level: i64,
    experience_into_level: i64,
}

impl From<Progress> for ProgressBody {
    fn from(p: Progress) -> Self {
        Self {
            total_experience: p.total_experience,
            level: p.level,
            experience_into_level: p.experience_into_level,
        }
    }
}

/// A point-in-time view of one session.
#[derive(Serialize, ToSchema)]
pub struct SessionSnapshot {
    session_id: Uuid,
    phase: String,
    phrase: Option<String>,
    progress: Option<ProgressBody>,
}

#[derive(Deserialize, ToSchema)]
pub struct IdentityRequest {
    /// Either "new" (register) or "returning" (recall).
    mode: String,
    phrase: String,
}

#[derive(Serialize, ToSchema)]
pub struct IdentityResponse {
    phrase: String,
    progress: ProgressBody,
}

#[derive(Deserialize, ToSchema)]
pub struct ParametersRequest {
    time_minutes: u32,
    mood: String,
    origin: String,
}

/// One candidate place with its recommendation comment; the pair is produced
/// together and stays together.
#[derive(Serialize, ToSchema)]
pub struct CandidateBody {
    name: String,
    latitude: f64,
    longitude: f64,
    source_url: Option<String>,
    blurb: String,
}

#[derive(Deserialize, ToSchema)]
pub struct CheckInRequest {
    place_name: String,
}

#[derive(Serialize, ToSchema)]
pub struct CheckInResponse {
    place_name: String,
    experience_awarded: i32,
    progress: ProgressBody,
    leveled_up: bool,
}

#[derive(Serialize, ToSchema)]
pub struct HistoryEntry {
    place_name: String,
    experience_awarded: i32,
    created_at: DateTime<Utc>,
}

//=========================================================================================
// Error Mapping Helpers
//=========================================================================================

type HandlerError = (StatusCode, String);

fn phase_label(phase: Phase) -> &'static str {
    match phase {
        Phase::Unset => "unset",
        Phase::New => "new",
        Phase::Returning => "returning",
        Phase::Ready => "ready",
        Phase::ParametersChosen => "parameters_chosen",
        Phase::CandidatesShown => "candidates_shown",
        Phase::CheckedIn => "checked_in",
    }
}

/// Maps session failures to HTTP statuses: correctable business-rule
/// failures are 4xx with their message, infrastructure failures are 502
/// with a generic transient-failure message.
fn session_error(err: SessionError) -> HandlerError {
    match &err {
        SessionError::Invalid(_) => (StatusCode::BAD_REQUEST, err.to_string()),
        SessionError::PhraseNotRecognized => (StatusCode::NOT_FOUND, err.to_string()),
        SessionError::InvalidTransition { .. }
        | SessionError::UnknownCandidate(_)
        | SessionError::NoIdentity => (StatusCode::CONFLICT, err.to_string()),
        SessionError::Port(PortError::DuplicatePhrase(_)) => {
            (StatusCode::CONFLICT, err.to_string())
        }
        SessionError::Port(PortError::NotFound(_)) => (StatusCode::NOT_FOUND, err.to_string()),
        SessionError::Port(_) => {
            error!("backing service failure: {err}");
            (
                StatusCode::BAD_GATEWAY,
                "A backing service is temporarily unavailable; please retry.".to_string(),
            )
        }
    }
}

fn unknown_session(id: Uuid) -> HandlerError {
    (StatusCode::NOT_FOUND, format!("unknown session {id}"))
}

//=========================================================================================
// REST API Handlers
//=========================================================================================

/// Create a fresh session with every field unset.
#[utoipa::path(
    post,
    path = "/sessions",
    responses(
        (status = 201, description = "Session created", body = SessionCreatedResponse)
    )
)]
pub async fn create_session_handler(
    State(app_state): State<Arc<AppState>>,
) -> impl IntoResponse {
    let session_id = Uuid::new_v4();
    let session = Session::new(app_state.engine.clone());
    app_state.sessions.lock().await.insert(session_id, session);
    (
        StatusCode::CREATED,
        Json(SessionCreatedResponse { session_id }),
    )
}

/// Current phase and progression snapshot for a session.
#[utoipa::path(
    get,
    path = "/sessions/{id}",
    responses(
        (status = 200, description = "Session snapshot", body = SessionSnapshot),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn get_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let sessions = app_state.sessions.lock().await;
    let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;

    let progress = match session.identity() {
        Some(_) => Some(session.progress().await.map_err(session_error)?.into()),
        None => None,
    };
    Ok(Json(SessionSnapshot {
        session_id: id,
        phase: phase_label(session.phase()).to_string(),
        phrase: session.identity().map(|i| i.phrase.clone()),
        progress,
    }))
}

/// Discard a session. History persists in the ledger; only the transient
/// state is dropped.
#[utoipa::path(
    delete,
    path = "/sessions/{id}",
    responses(
        (status = 204, description = "Session discarded"),
        (status = 404, description = "Unknown session")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn delete_session_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    app_state
        .sessions
        .lock()
        .await
        .remove(&id)
        .ok_or_else(|| unknown_session(id))?;
    Ok(StatusCode::NO_CONTENT)
}

/// Activate an identity: register a new phrase or recall an existing one.
///
/// A duplicate phrase (409) or unrecognized phrase (404) is correctable:
/// the session keeps its phase and the call can simply be retried.
#[utoipa::path(
    post,
    path = "/sessions/{id}/identity",
    request_body = IdentityRequest,
    responses(
        (status = 200, description = "Identity active", body = IdentityResponse),
        (status = 400, description = "Invalid mode"),
        (status = 404, description = "Unknown session or unrecognized phrase"),
        (status = 409, description = "Duplicate phrase or wrong phase")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn identity_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<IdentityRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    // The mode only matters on the first submission; a retry after a
    // correctable failure is already in the New or Returning phase.
    if session.phase() == Phase::Unset {
        match body.mode.as_str() {
            "new" => session.begin_new().map_err(session_error)?,
            "returning" => session.begin_returning().map_err(session_error)?,
            other => {
                return Err((
                    StatusCode::BAD_REQUEST,
                    format!("mode must be 'new' or 'returning', got '{other}'"),
                ))
            }
        }
    }

    let identity = session
        .submit_phrase(&body.phrase)
        .await
        .map_err(session_error)?;
    let progress = session.progress().await.map_err(session_error)?;
    Ok(Json(IdentityResponse {
        phrase: identity.phrase,
        progress: progress.into(),
    }))
}

/// After an unrecognized phrase, fall through to registration with the same
/// phrase.
#[utoipa::path(
    post,
    path = "/sessions/{id}/identity/register-pending",
    responses(
        (status = 200, description = "Identity registered", body = IdentityResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No pending phrase or wrong phase")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn register_pending_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    let identity = session.register_pending().await.map_err(session_error)?;
    let progress = session.progress().await.map_err(session_error)?;
    Ok(Json(IdentityResponse {
        phrase: identity.phrase,
        progress: progress.into(),
    }))
}

/// Choose the (time, mood, origin) triple for the next adventure.
#[utoipa::path(
    post,
    path = "/sessions/{id}/parameters",
    request_body = ParametersRequest,
    responses(
        (status = 204, description = "Parameters accepted"),
        (status = 400, description = "Invalid selection"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Wrong phase")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn parameters_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<ParametersRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    session
        .choose_parameters(body.time_minutes, &body.mood, &body.origin)
        .map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Run the candidate pipeline for the chosen parameters.
///
/// An empty list is a valid result (no matching places), distinct from a
/// 502 catalog failure.
#[utoipa::path(
    post,
    path = "/sessions/{id}/candidates",
    responses(
        (status = 200, description = "Candidates with blurbs", body = [CandidateBody]),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Wrong phase"),
        (status = 502, description = "Catalog unavailable")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn candidates_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    let candidates = session.embark().await.map_err(session_error)?;
    let body: Vec<CandidateBody> = candidates
        .iter()
        .map(|c| CandidateBody {
            name: c.place.name.clone(),
            latitude: c.place.latitude,
            longitude: c.place.longitude,
            source_url: c.place.source_url.clone(),
            blurb: c.blurb.clone(),
        })
        .collect();
    Ok(Json(body))
}

/// Check in at one of the displayed candidates.
#[utoipa::path(
    post,
    path = "/sessions/{id}/checkin",
    request_body = CheckInRequest,
    responses(
        (status = 200, description = "Check-in recorded", body = CheckInResponse),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Wrong phase or place not among candidates"),
        (status = 502, description = "Store unavailable")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn checkin_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(body): Json<CheckInRequest>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    let outcome = session
        .check_in(&body.place_name)
        .await
        .map_err(session_error)?;
    Ok(Json(CheckInResponse {
        place_name: outcome.record.place_name,
        experience_awarded: outcome.record.experience_awarded,
        progress: outcome.progress.into(),
        leveled_up: outcome.leveled_up,
    }))
}

/// Loop back to parameter selection for a new adventure cycle under the
/// same identity.
#[utoipa::path(
    post,
    path = "/sessions/{id}/next",
    responses(
        (status = 204, description = "Ready for the next adventure"),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "Wrong phase")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn next_adventure_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let mut sessions = app_state.sessions.lock().await;
    let session = sessions.get_mut(&id).ok_or_else(|| unknown_session(id))?;

    session.next_adventure().map_err(session_error)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Check-in history for the active identity, oldest first.
#[utoipa::path(
    get,
    path = "/sessions/{id}/history",
    responses(
        (status = 200, description = "Check-in history", body = [HistoryEntry]),
        (status = 404, description = "Unknown session"),
        (status = 409, description = "No active identity")
    ),
    params(("id" = Uuid, Path, description = "Session id"))
)]
pub async fn history_handler(
    State(app_state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, HandlerError> {
    let sessions = app_state.sessions.lock().await;
    let session = sessions.get(&id).ok_or_else(|| unknown_session(id))?;

    let history = session.history().await.map_err(session_error)?;
    let body: Vec<HistoryEntry> = history
        .into_iter()
        .map(|r| HistoryEntry {
            place_name: r.place_name,
            experience_awarded: r.experience_awarded,
            created_at: r.created_at,
        })
        .collect();
    Ok(Json(body))
}
