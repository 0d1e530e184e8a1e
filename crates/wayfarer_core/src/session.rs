//! crates/wayfarer_core/src/session.rs
//!
//! The per-user session state machine. One `Session` value is created at
//! session start, mutated only through the transition methods below, and
//! discarded at session end; it is never shared across sessions.
//!
//! Phases:
//! `Unset -> {New, Returning} -> Ready -> ParametersChosen ->
//! CandidatesShown -> CheckedIn`, with `CheckedIn -> Ready` looping into the
//! next adventure cycle under the same identity.

use crate::domain::{
    AdventureParams, CheckInRecord, Identity, InvalidParameter, Progress, Recommendation,
};
use crate::engine::{AdventureEngine, CheckInOutcome};
use crate::ports::PortError;

/// The user-visible phase of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Unset,
    New,
    Returning,
    Ready,
    ParametersChosen,
    CandidatesShown,
    CheckedIn,
}

/// Errors raised by session transitions.
///
/// Business-rule failures (`PhraseNotRecognized`, `Port(DuplicatePhrase)`)
/// are correctable and never advance the phase; infrastructure failures
/// propagate through `Port` and leave the phase unchanged as well.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("'{action}' is not allowed in phase {phase:?}")]
    InvalidTransition { phase: Phase, action: &'static str },
    #[error("phrase not recognized")]
    PhraseNotRecognized,
    #[error("'{0}' is not among the current candidates")]
    UnknownCandidate(String),
    #[error("no active identity")]
    NoIdentity,
    #[error(transparent)]
    Invalid(#[from] InvalidParameter),
    #[error(transparent)]
    Port(#[from] PortError),
}

/// One user session: the engine plus the transient per-session state.
pub struct Session {
    engine: AdventureEngine,
    phase: Phase,
    identity: Option<Identity>,
    /// Retained after a failed RETURNING lookup so the user can fall through
    /// to registration with the same phrase.
    pending_phrase: Option<String>,
    params: Option<AdventureParams>,
    candidates: Vec<Recommendation>,
}

impl Session {
    /// A fresh session with every field unset.
    pub fn new(engine: AdventureEngine) -> Self {
        Self {
            engine,
            phase: Phase::Unset,
            identity: None,
            pending_phrase: None,
            params: None,
            candidates: Vec::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn params(&self) -> Option<&AdventureParams> {
        self.params.as_ref()
    }

    pub fn candidates(&self) -> &[Recommendation] {
        &self.candidates
    }

    fn require_phase(&self, expected: Phase, action: &'static str) -> Result<(), SessionError> {
        if self.phase == expected {
            Ok(())
        } else {
            Err(SessionError::InvalidTransition {
                phase: self.phase,
                action,
            })
        }
    }

    /// Starts the NEW-identity path.
    pub fn begin_new(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Unset, "begin_new")?;
        self.phase = Phase::New;
        Ok(())
    }

    /// Starts the RETURNING-identity path.
    pub fn begin_returning(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::Unset, "begin_returning")?;
        self.phase = Phase::Returning;
        Ok(())
    }

    /// Submits the recovery phrase for the path chosen at `begin_*`.
    ///
    /// NEW: registers; a `DuplicatePhrase` failure keeps the phase so the
    /// user can try another phrase.
    /// RETURNING: looks up; a miss is `PhraseNotRecognized`, the phrase is
    /// retained for `register_pending`, and the phase is kept for a retry.
    pub async fn submit_phrase(&mut self, phrase: &str) -> Result<Identity, SessionError> {
        match self.phase {
            Phase::New => {
                let identity = self.engine.register(phrase).await?;
                self.activate(identity.clone());
                Ok(identity)
            }
            Phase::Returning => match self.engine.recall(phrase).await? {
                Some(identity) => {
                    self.activate(identity.clone());
                    Ok(identity)
                }
                None => {
                    self.pending_phrase = Some(phrase.to_string());
                    Err(SessionError::PhraseNotRecognized)
                }
            },
            phase => Err(SessionError::InvalidTransition {
                phase,
                action: "submit_phrase",
            }),
        }
    }

    /// Falls through to registration with the phrase from the last failed
    /// RETURNING lookup.
    pub async fn register_pending(&mut self) -> Result<Identity, SessionError> {
        self.require_phase(Phase::Returning, "register_pending")?;
        let phrase = self
            .pending_phrase
            .clone()
            .ok_or(SessionError::InvalidTransition {
                phase: self.phase,
                action: "register_pending",
            })?;
        let identity = self.engine.register(&phrase).await?;
        self.activate(identity.clone());
        Ok(identity)
    }

    fn activate(&mut self, identity: Identity) {
        self.identity = Some(identity);
        self.pending_phrase = None;
        self.phase = Phase::Ready;
    }

    /// Validates the (time, mood, origin) triple and stores it. Any invalid
    /// selection blocks the transition before it can reach the geo filter or
    /// the catalog.
    pub fn choose_parameters(
        &mut self,
        minutes: u32,
        mood_tag: &str,
        origin_keyword: &str,
    ) -> Result<(), SessionError> {
        self.require_phase(Phase::Ready, "choose_parameters")?;
        let params = AdventureParams::from_selections(minutes, mood_tag, origin_keyword)?;
        self.params = Some(params);
        self.phase = Phase::ParametersChosen;
        Ok(())
    }

    /// Runs the candidate pipeline. An empty candidate set still enters
    /// `CandidatesShown`; only a catalog failure leaves the phase unchanged.
    pub async fn embark(&mut self) -> Result<&[Recommendation], SessionError> {
        self.require_phase(Phase::ParametersChosen, "embark")?;
        let params = self.params.as_ref().ok_or(SessionError::InvalidTransition {
            phase: self.phase,
            action: "embark",
        })?;
        let candidates = self.engine.find_candidates(params).await?;
        self.candidates = candidates;
        self.phase = Phase::CandidatesShown;
        Ok(&self.candidates)
    }

    /// Checks in at one of the displayed candidates. Reached once per
    /// adventure cycle; there is no un-check-in.
    pub async fn check_in(&mut self, place_name: &str) -> Result<CheckInOutcome, SessionError> {
        self.require_phase(Phase::CandidatesShown, "check_in")?;
        if !self.candidates.iter().any(|c| c.place.name == place_name) {
            return Err(SessionError::UnknownCandidate(place_name.to_string()));
        }
        let phrase = self.active_phrase()?.to_string();
        let outcome = self.engine.check_in(&phrase, place_name).await?;
        self.phase = Phase::CheckedIn;
        Ok(outcome)
    }

    /// Loops back for a new adventure cycle under the same identity.
    /// History persists; parameters and candidates are cleared.
    pub fn next_adventure(&mut self) -> Result<(), SessionError> {
        self.require_phase(Phase::CheckedIn, "next_adventure")?;
        self.params = None;
        self.candidates.clear();
        self.phase = Phase::Ready;
        Ok(())
    }

    /// Check-in history for the active identity, oldest first.
    pub async fn history(&self) -> Result<Vec<CheckInRecord>, SessionError> {
        let phrase = self.active_phrase()?;
        Ok(self.engine.history(phrase).await?)
    }

    /// Ledger-derived progression for the active identity.
    pub async fn progress(&self) -> Result<Progress, SessionError> {
        let phrase = self.active_phrase()?;
        Ok(self.engine.progress(phrase).await?)
    }

    fn active_phrase(&self) -> Result<&str, SessionError> {
        self.identity
            .as_ref()
            .map(|i| i.phrase.as_str())
            .ok_or(SessionError::NoIdentity)
    }
}
