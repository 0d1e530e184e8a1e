//! End-to-end tests for the adventure engine and session state machine,
//! driven against the in-memory port doubles.

use std::sync::Arc;

use wayfarer_core::testing::{CannedBlurbs, DownBlurbs, MemoryCatalog, MemoryStore};
use wayfarer_core::{
    AdventureEngine, AdventureParams, BlurbService, Mood, Origin, Phase, Place, PortError,
    Session, SessionError,
};

// Coordinates within ~300 m of Hakata Station.
fn canal_city() -> Place {
    Place {
        name: "Canal City".to_string(),
        latitude: 33.5898,
        longitude: 130.4120,
        mood: Mood::Cafe,
        source_url: Some("https://canalcity.example/".to_string()),
    }
}

// ~2 km out, beyond the 30-minute bucket.
fn riverwalk() -> Place {
    Place {
        name: "Riverwalk".to_string(),
        latitude: 33.6060,
        longitude: 130.4207,
        mood: Mood::Cafe,
        source_url: None,
    }
}

fn seeded_catalog() -> MemoryCatalog {
    MemoryCatalog::new()
        .with_place(Origin::HakataStation, canal_city())
        .with_place(Origin::HakataStation, riverwalk())
}

fn engine_with(catalog: MemoryCatalog, blurbs: Arc<dyn BlurbService>) -> AdventureEngine {
    let store = Arc::new(MemoryStore::new());
    AdventureEngine::new(store.clone(), store, Arc::new(catalog), blurbs)
}

fn default_engine() -> AdventureEngine {
    engine_with(seeded_catalog(), Arc::new(CannedBlurbs::new("worth a visit")))
}

#[tokio::test]
async fn fresh_identity_earns_decaying_rewards_at_one_place() {
    let engine = default_engine();

    let hero = engine.register("hoimi").await.unwrap();
    assert_eq!(hero.phrase, "hoimi");
    let progress = engine.progress("hoimi").await.unwrap();
    assert_eq!(progress.total_experience, 0);
    assert_eq!(progress.level, 0);

    let first = engine.check_in("hoimi", "Canal City").await.unwrap();
    assert_eq!(first.record.experience_awarded, 20);
    assert_eq!(first.progress.total_experience, 20);
    assert_eq!(first.progress.level, 0);
    assert!(!first.leveled_up);

    let second = engine.check_in("hoimi", "Canal City").await.unwrap();
    assert_eq!(second.record.experience_awarded, 15);
    assert_eq!(second.progress.total_experience, 35);
    assert_eq!(second.progress.level, 0);
}

#[tokio::test]
async fn five_visits_to_one_place_hit_the_reward_floor() {
    let engine = default_engine();
    engine.register("hoimi").await.unwrap();

    let mut rewards = Vec::new();
    for _ in 0..5 {
        let outcome = engine.check_in("hoimi", "Canal City").await.unwrap();
        rewards.push(outcome.record.experience_awarded);
    }
    assert_eq!(rewards, [20, 15, 10, 5, 5]);

    let progress = engine.progress("hoimi").await.unwrap();
    assert_eq!(progress.total_experience, 55);
    assert_eq!(progress.level, 0);

    let history = engine.history("hoimi").await.unwrap();
    assert_eq!(history.len(), 5);
    let from_history: i64 = history
        .iter()
        .map(|r| i64::from(r.experience_awarded))
        .sum();
    assert_eq!(from_history, progress.total_experience);
}

#[tokio::test]
async fn crossing_a_hundred_point_boundary_levels_up() {
    let engine = default_engine();
    engine.register("hoimi").await.unwrap();

    // Eleven distinct places pay 20 each (220 total); boundaries are
    // crossed at 100 (5th check-in) and 200 (10th).
    let mut leveled = Vec::new();
    for i in 0..11 {
        let outcome = engine
            .check_in("hoimi", &format!("spot-{i}"))
            .await
            .unwrap();
        leveled.push(outcome.leveled_up);
    }
    assert_eq!(leveled.iter().filter(|l| **l).count(), 2);
    assert!(leveled[4]);
    assert!(leveled[9]);

    // Three decayed repeats (15 + 10 + 5) bring the total to 250.
    let mut outcome = engine.check_in("hoimi", "spot-0").await.unwrap();
    for _ in 0..2 {
        outcome = engine.check_in("hoimi", "spot-0").await.unwrap();
    }
    assert_eq!(outcome.record.experience_awarded, 5);
    assert_eq!(outcome.progress.total_experience, 250);
    assert_eq!(outcome.progress.level, 2);
    assert_eq!(outcome.progress.experience_into_level, 50);
    assert!(!outcome.leveled_up);
}

#[tokio::test]
async fn duplicate_registration_fails_and_preserves_history() {
    let engine = default_engine();
    engine.register("hoimi").await.unwrap();
    engine.check_in("hoimi", "Canal City").await.unwrap();

    let err = engine.register("hoimi").await.unwrap_err();
    assert!(matches!(err, PortError::DuplicatePhrase(ref p) if p == "hoimi"));

    // Existing state untouched.
    let history = engine.history("hoimi").await.unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(engine.progress("hoimi").await.unwrap().total_experience, 20);
}

#[tokio::test]
async fn unregistered_phrase_recall_misses_then_registers_cleanly() {
    let engine = default_engine();

    assert!(engine.recall("xyz").await.unwrap().is_none());
    engine.register("xyz").await.unwrap();
    assert!(engine.recall("xyz").await.unwrap().is_some());
    assert_eq!(engine.progress("xyz").await.unwrap().total_experience, 0);
}

#[tokio::test]
async fn candidate_search_applies_mood_and_live_distance_bucket() {
    let engine = default_engine();

    let params = AdventureParams::from_selections(30, "cafe", "Hakata Station").unwrap();
    let candidates = engine.find_candidates(&params).await.unwrap();

    // Riverwalk matches the mood but sits outside the 0-500 m bucket.
    let names: Vec<&str> = candidates.iter().map(|c| c.place.name.as_str()).collect();
    assert_eq!(names, ["Canal City"]);
    assert_eq!(candidates[0].blurb, "worth a visit");

    // No shopping places are seeded: empty, not an error.
    let params = AdventureParams::from_selections(30, "shopping", "Hakata Station").unwrap();
    assert!(engine.find_candidates(&params).await.unwrap().is_empty());
}

#[tokio::test]
async fn blurb_outage_degrades_to_empty_commentary() {
    let engine = engine_with(seeded_catalog(), Arc::new(DownBlurbs));

    let params = AdventureParams::from_selections(30, "cafe", "Hakata Station").unwrap();
    let candidates = engine.find_candidates(&params).await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(candidates[0].blurb, "");
}

#[tokio::test]
async fn session_walks_the_full_new_identity_path() {
    let mut session = Session::new(default_engine());
    assert_eq!(session.phase(), Phase::Unset);

    session.begin_new().unwrap();
    session.submit_phrase("hoimi").await.unwrap();
    assert_eq!(session.phase(), Phase::Ready);

    session.choose_parameters(30, "cafe", "Hakata Station").unwrap();
    assert_eq!(session.phase(), Phase::ParametersChosen);

    let candidates = session.embark().await.unwrap();
    assert_eq!(candidates.len(), 1);
    assert_eq!(session.phase(), Phase::CandidatesShown);

    let outcome = session.check_in("Canal City").await.unwrap();
    assert_eq!(outcome.record.experience_awarded, 20);
    assert_eq!(session.phase(), Phase::CheckedIn);

    // Loop back for the next cycle; identity and history persist.
    session.next_adventure().unwrap();
    assert_eq!(session.phase(), Phase::Ready);
    assert_eq!(session.identity().unwrap().phrase, "hoimi");
    assert_eq!(session.history().await.unwrap().len(), 1);
}

#[tokio::test]
async fn failed_returning_lookup_allows_retry_or_fall_through() {
    let mut session = Session::new(default_engine());
    session.begin_returning().unwrap();

    let err = session.submit_phrase("xyz").await.unwrap_err();
    assert!(matches!(err, SessionError::PhraseNotRecognized));
    // No state loss: still in the returning phase.
    assert_eq!(session.phase(), Phase::Returning);

    // Fall through to registration with the same phrase.
    let identity = session.register_pending().await.unwrap();
    assert_eq!(identity.phrase, "xyz");
    assert_eq!(session.phase(), Phase::Ready);
    assert_eq!(session.progress().await.unwrap().total_experience, 0);
}

#[tokio::test]
async fn invalid_selections_block_the_parameter_transition() {
    let mut session = Session::new(default_engine());
    session.begin_new().unwrap();
    session.submit_phrase("hoimi").await.unwrap();

    assert!(matches!(
        session.choose_parameters(45, "cafe", "Hakata Station"),
        Err(SessionError::Invalid(_))
    ));
    assert!(matches!(
        session.choose_parameters(30, "karaoke", "Hakata Station"),
        Err(SessionError::Invalid(_))
    ));
    // Failure never advances the machine.
    assert_eq!(session.phase(), Phase::Ready);
}

#[tokio::test]
async fn empty_candidate_set_is_a_valid_state() {
    let mut session = Session::new(default_engine());
    session.begin_new().unwrap();
    session.submit_phrase("hoimi").await.unwrap();
    session
        .choose_parameters(30, "entertainment", "Tenjin Station")
        .unwrap();

    let candidates = session.embark().await.unwrap();
    assert!(candidates.is_empty());
    assert_eq!(session.phase(), Phase::CandidatesShown);

    // But a check-in needs a displayed candidate.
    let err = session.check_in("Canal City").await.unwrap_err();
    assert!(matches!(err, SessionError::UnknownCandidate(_)));
}

#[tokio::test]
async fn out_of_order_actions_are_rejected_without_advancing() {
    let mut session = Session::new(default_engine());

    assert!(matches!(
        session.choose_parameters(30, "cafe", "Hakata Station"),
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.embark().await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert!(matches!(
        session.check_in("Canal City").await,
        Err(SessionError::InvalidTransition { .. })
    ));
    assert_eq!(session.phase(), Phase::Unset);

    // A duplicate phrase on the new path keeps the phase for a retry.
    let engine = default_engine();
    engine.register("taken").await.unwrap();
    let mut session = Session::new(engine);
    session.begin_new().unwrap();
    let err = session.submit_phrase("taken").await.unwrap_err();
    assert!(matches!(
        err,
        SessionError::Port(PortError::DuplicatePhrase(_))
    ));
    assert_eq!(session.phase(), Phase::New);
}
