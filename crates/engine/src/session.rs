use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use trainer_core::model::{Attempt, Scenario, ScenarioId, Session, SessionRecord, SessionSummary, UserId};
use trainer_core::{Clock, DifficultyAdjuster};

use crate::error::SessionError;
use crate::providers::LoadEstimator;
use crate::selector::ScenarioSelector;

/// Feedback returned after processing one response.
#[derive(Debug, Clone, PartialEq)]
pub struct ResponseOutcome {
    pub correct: bool,
    pub previous_difficulty: u8,
    pub new_difficulty: u8,
    pub explanation: String,
}

enum State {
    NotStarted,
    Active(Session),
    Closed {
        session: Session,
        summary: SessionSummary,
    },
}

/// Drives one user's session through `NotStarted -> Active -> Closed`.
///
/// Owns the session exclusively; a deployment serving several users holds
/// one manager per user and never shares one across concurrent callers.
/// All provider calls are timeout-bounded, and load-provider faults degrade
/// to a null score instead of blocking scenario delivery.
pub struct SessionManager {
    selector: ScenarioSelector,
    adjuster: DifficultyAdjuster,
    load_estimator: Option<Arc<dyn LoadEstimator>>,
    clock: Clock,
    provider_timeout: Duration,
    theme_hint: Option<String>,
    state: State,
    /// The scenario handed out by the last `get_next_scenario`, not yet
    /// answered. Kept whole so the response feedback can quote its
    /// explanation.
    issued: Option<Scenario>,
}

impl SessionManager {
    #[must_use]
    pub fn new(selector: ScenarioSelector, adjuster: DifficultyAdjuster) -> Self {
        Self {
            selector,
            adjuster,
            load_estimator: None,
            clock: Clock::default(),
            provider_timeout: Duration::from_secs(2),
            theme_hint: None,
            state: State::NotStarted,
            issued: None,
        }
    }

    /// Attach an optional cognitive-load estimator.
    #[must_use]
    pub fn with_load_estimator(mut self, estimator: Arc<dyn LoadEstimator>) -> Self {
        self.load_estimator = Some(estimator);
        self
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Bound on each load-estimator call.
    #[must_use]
    pub fn with_provider_timeout(mut self, timeout: Duration) -> Self {
        self.provider_timeout = timeout;
        self
    }

    /// Steer selection and generation toward a theme for this session.
    #[must_use]
    pub fn with_theme_hint(mut self, theme: impl Into<String>) -> Self {
        self.theme_hint = Some(theme.into());
        self
    }

    /// Starts a session at the given difficulty (clamped), or at the range
    /// minimum when none is supplied.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyActive` while a session is running, or
    /// `SessionError::Closed` once this manager has finished one.
    pub fn start_session(
        &mut self,
        user_id: UserId,
        initial_difficulty: Option<u8>,
    ) -> Result<(), SessionError> {
        match self.state {
            State::NotStarted => {}
            State::Active(_) => return Err(SessionError::AlreadyActive),
            State::Closed { .. } => return Err(SessionError::Closed),
        }

        let range = self.adjuster.range();
        let difficulty = initial_difficulty.map_or(range.min(), |d| range.clamp(d));
        info!(user = %user_id, difficulty, "session started");

        self.state = State::Active(Session::new(user_id, self.clock.now(), difficulty));
        Ok(())
    }

    /// Starts a session for a returning user, estimating the initial
    /// difficulty from their past attempts.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SessionManager::start_session`].
    pub fn start_session_from_history(
        &mut self,
        user_id: UserId,
        history: &[Attempt],
    ) -> Result<(), SessionError> {
        let difficulty = self.adjuster.starting_difficulty(history);
        self.start_session(user_id, Some(difficulty))
    }

    /// Fetches the next scenario at the current difficulty.
    ///
    /// Exhaustion leaves the session Active; the caller may end the session
    /// or retry later.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive`/`Closed` outside the Active state,
    /// or a `SelectionError` when no scenario can be produced.
    pub async fn get_next_scenario(&mut self) -> Result<Scenario, SessionError> {
        let session = self.active_session()?;

        let mut presented = session.presented_ids();
        if let Some(issued) = &self.issued {
            // An unanswered scenario is still off-limits for re-issue.
            presented.insert(issued.id().clone());
        }

        let target = session.current_difficulty();
        let theme = self.theme_hint.as_deref();
        let scenario = self.selector.select(target, &presented, theme).await?;

        self.issued = Some(scenario.clone());
        Ok(scenario)
    }

    /// Records the response to the most recently issued scenario, then
    /// re-targets difficulty for the next pick.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnexpectedResponse` when `scenario_id` is not
    /// the last issued scenario (session state is left untouched), or
    /// `NotActive`/`Closed` outside the Active state.
    pub async fn process_response(
        &mut self,
        scenario_id: &ScenarioId,
        correct: bool,
    ) -> Result<ResponseOutcome, SessionError> {
        match &self.state {
            State::NotStarted => return Err(SessionError::NotActive),
            State::Closed { .. } => return Err(SessionError::Closed),
            State::Active(_) => {}
        }

        let issued = match &self.issued {
            Some(issued) if issued.id() == scenario_id => issued.clone(),
            other => {
                return Err(SessionError::UnexpectedResponse {
                    expected: other.as_ref().map(|s| s.id().clone()),
                    got: scenario_id.clone(),
                });
            }
        };

        let load = self.query_load().await;
        let now = self.clock.now();

        let State::Active(session) = &mut self.state else {
            return Err(SessionError::NotActive);
        };

        let previous_difficulty = session.current_difficulty();
        session.record_attempt(Attempt::new(
            issued.id().clone(),
            now,
            correct,
            previous_difficulty,
            load,
        ));

        let window = session.recent_attempts(self.adjuster.config().window);
        let new_difficulty = self
            .adjuster
            .next_difficulty(window, previous_difficulty, load);
        session.set_difficulty(new_difficulty);
        self.issued = None;

        info!(
            scenario = %issued.id(),
            correct,
            previous_difficulty,
            new_difficulty,
            "response processed"
        );

        Ok(ResponseOutcome {
            correct,
            previous_difficulty,
            new_difficulty,
            explanation: issued.explanation().to_string(),
        })
    }

    /// Closes the session and returns its summary. Idempotent: repeated
    /// calls return the same summary without touching state again.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotActive` if no session was ever started.
    pub fn end_session(&mut self) -> Result<SessionSummary, SessionError> {
        match std::mem::replace(&mut self.state, State::NotStarted) {
            State::NotStarted => Err(SessionError::NotActive),
            State::Active(mut session) => {
                session.close(self.clock.now());
                let summary = session.summary();
                info!(
                    user = %session.user_id(),
                    attempts = summary.total_attempts,
                    accuracy = summary.accuracy,
                    final_difficulty = summary.final_difficulty,
                    "session ended"
                );
                self.issued = None;
                self.state = State::Closed {
                    session,
                    summary: summary.clone(),
                };
                Ok(summary)
            }
            State::Closed { session, summary } => {
                let result = summary.clone();
                self.state = State::Closed { session, summary };
                Ok(result)
            }
        }
    }

    /// The session, in any state after start.
    #[must_use]
    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            State::NotStarted => None,
            State::Active(session) | State::Closed { session, .. } => Some(session),
        }
    }

    /// Persistable record of a closed session.
    #[must_use]
    pub fn record(&self) -> Option<SessionRecord> {
        match &self.state {
            State::Closed { session, .. } => Some(session.to_record()),
            _ => None,
        }
    }

    fn active_session(&self) -> Result<&Session, SessionError> {
        match &self.state {
            State::NotStarted => Err(SessionError::NotActive),
            State::Closed { .. } => Err(SessionError::Closed),
            State::Active(session) => Ok(session),
        }
    }

    /// Queries the load estimator, degrading every fault to `None`.
    async fn query_load(&self) -> Option<f64> {
        let estimator = self.load_estimator.as_ref()?;
        let user_id = match &self.state {
            State::Active(session) => session.user_id().clone(),
            _ => return None,
        };

        match tokio::time::timeout(self.provider_timeout, estimator.estimate(&user_id)).await {
            Ok(Ok(load)) => Some(load.clamp(0.0, 1.0)),
            Ok(Err(e)) => {
                warn!(error = %e, "load estimation failed, continuing without a score");
                None
            }
            Err(_) => {
                warn!("load estimation timed out, continuing without a score");
                None
            }
        }
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match &self.state {
            State::NotStarted => "NotStarted",
            State::Active(_) => "Active",
            State::Closed { .. } => "Closed",
        };
        f.debug_struct("SessionManager")
            .field("state", &state)
            .field("issued", &self.issued.as_ref().map(Scenario::id))
            .field("has_load_estimator", &self.load_estimator.is_some())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use catalog::InMemoryCatalog;
    use trainer_core::model::{DifficultyRange, ScenarioDraft};
    use trainer_core::time::fixed_clock;

    fn scenario(id: &str, difficulty: u8) -> Scenario {
        ScenarioDraft {
            id: ScenarioId::new(id),
            title: String::new(),
            description: String::new(),
            content: "content".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer: 0,
            difficulty,
            explanation: "because".into(),
            theme: "test".into(),
        }
        .validate(&DifficultyRange::default())
        .unwrap()
    }

    fn manager(scenarios: Vec<Scenario>) -> SessionManager {
        let catalog = InMemoryCatalog::with_scenarios(scenarios).unwrap();
        let selector =
            ScenarioSelector::new(Arc::new(catalog), DifficultyRange::default()).with_seed(7);
        SessionManager::new(selector, DifficultyAdjuster::default()).with_clock(fixed_clock())
    }

    #[test]
    fn operations_require_an_active_session() {
        let mut manager = manager(Vec::new());
        assert!(matches!(
            manager.end_session(),
            Err(SessionError::NotActive)
        ));
        assert!(manager.session().is_none());
    }

    #[test]
    fn second_start_fails() {
        let mut manager = manager(Vec::new());
        manager.start_session(UserId::new("u1"), Some(2)).unwrap();
        let err = manager
            .start_session(UserId::new("u2"), None)
            .unwrap_err();
        assert!(matches!(err, SessionError::AlreadyActive));
    }

    #[test]
    fn start_after_close_reports_closed() {
        let mut manager = manager(Vec::new());
        manager.start_session(UserId::new("u1"), None).unwrap();
        manager.end_session().unwrap();

        let err = manager.start_session(UserId::new("u1"), None).unwrap_err();
        assert!(matches!(err, SessionError::Closed));
    }

    #[test]
    fn initial_difficulty_is_clamped() {
        let mut manager = manager(Vec::new());
        manager.start_session(UserId::new("u1"), Some(99)).unwrap();
        assert_eq!(manager.session().unwrap().current_difficulty(), 5);
    }

    #[tokio::test]
    async fn get_next_requires_active_state() {
        let mut manager = manager(vec![scenario("a", 1)]);
        assert!(matches!(
            manager.get_next_scenario().await,
            Err(SessionError::NotActive)
        ));

        manager.start_session(UserId::new("u1"), None).unwrap();
        manager.end_session().unwrap();
        assert!(matches!(
            manager.get_next_scenario().await,
            Err(SessionError::Closed)
        ));
    }

    #[tokio::test]
    async fn response_must_match_last_issued() {
        let mut manager = manager(vec![scenario("a", 1), scenario("b", 1)]);
        manager.start_session(UserId::new("u1"), None).unwrap();
        let issued = manager.get_next_scenario().await.unwrap();

        let err = manager
            .process_response(&ScenarioId::new("wrong"), true)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnexpectedResponse { .. }));

        // State untouched: the issued scenario is still answerable.
        assert!(manager.session().unwrap().attempts().is_empty());
        let outcome = manager.process_response(issued.id(), true).await.unwrap();
        assert!(outcome.correct);
    }

    #[tokio::test]
    async fn duplicate_response_is_rejected() {
        let mut manager = manager(vec![scenario("a", 1), scenario("b", 1)]);
        manager.start_session(UserId::new("u1"), None).unwrap();
        let issued = manager.get_next_scenario().await.unwrap();
        manager.process_response(issued.id(), true).await.unwrap();

        let err = manager
            .process_response(issued.id(), true)
            .await
            .unwrap_err();
        assert!(matches!(err, SessionError::UnexpectedResponse { .. }));
        assert_eq!(manager.session().unwrap().attempts().len(), 1);
    }

    #[tokio::test]
    async fn exhaustion_leaves_session_active() {
        let mut manager = manager(vec![scenario("only", 1)]);
        manager.start_session(UserId::new("u1"), None).unwrap();

        let issued = manager.get_next_scenario().await.unwrap();
        manager.process_response(issued.id(), false).await.unwrap();

        let err = manager.get_next_scenario().await.unwrap_err();
        assert!(matches!(
            err,
            SessionError::Selection(crate::error::SelectionError::Exhausted)
        ));

        // Still Active: the session can be ended normally.
        let summary = manager.end_session().unwrap();
        assert_eq!(summary.total_attempts, 1);
    }

    #[tokio::test]
    async fn unanswered_issue_is_not_reissued() {
        let mut manager = manager(vec![scenario("a", 1), scenario("b", 1)]);
        manager.start_session(UserId::new("u1"), None).unwrap();

        let first = manager.get_next_scenario().await.unwrap();
        let second = manager.get_next_scenario().await.unwrap();
        assert_ne!(first.id(), second.id());
    }

    #[tokio::test]
    async fn end_session_is_idempotent() {
        let mut manager = manager(vec![scenario("a", 1)]);
        manager.start_session(UserId::new("u1"), None).unwrap();
        let issued = manager.get_next_scenario().await.unwrap();
        manager.process_response(issued.id(), true).await.unwrap();

        let first = manager.end_session().unwrap();
        let second = manager.end_session().unwrap();
        assert_eq!(first, second);
        assert_eq!(manager.record().unwrap().attempts.len(), 1);
    }

    #[test]
    fn history_seeds_starting_difficulty() {
        let mut manager = manager(Vec::new());
        let history: Vec<Attempt> = (0..3)
            .map(|i| {
                Attempt::new(
                    ScenarioId::new(format!("h{i}")),
                    trainer_core::time::fixed_now(),
                    true,
                    3,
                    None,
                )
            })
            .collect();

        manager
            .start_session_from_history(UserId::new("u1"), &history)
            .unwrap();
        assert_eq!(manager.session().unwrap().current_difficulty(), 3);
    }
}
