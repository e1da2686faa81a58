use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::model::{Attempt, ScenarioId, UserId};

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One user's continuous training interaction.
///
/// Owns its attempt history; the presented-id set is always derived from the
/// attempts, never stored separately. Only the session manager mutates a
/// session, and only while it is open.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    user_id: UserId,
    started_at: DateTime<Utc>,
    ended_at: Option<DateTime<Utc>>,
    current_difficulty: u8,
    attempts: Vec<Attempt>,
}

impl Session {
    #[must_use]
    pub fn new(user_id: UserId, started_at: DateTime<Utc>, initial_difficulty: u8) -> Self {
        Self {
            user_id,
            started_at,
            ended_at: None,
            current_difficulty: initial_difficulty,
            attempts: Vec::new(),
        }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    #[must_use]
    pub fn current_difficulty(&self) -> u8 {
        self.current_difficulty
    }

    #[must_use]
    pub fn attempts(&self) -> &[Attempt] {
        &self.attempts
    }

    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.ended_at.is_some()
    }

    /// Scenario ids already presented in this session.
    #[must_use]
    pub fn presented_ids(&self) -> HashSet<ScenarioId> {
        self.attempts
            .iter()
            .map(|a| a.scenario_id.clone())
            .collect()
    }

    /// The trailing `window` attempts, oldest first.
    #[must_use]
    pub fn recent_attempts(&self, window: usize) -> &[Attempt] {
        let start = self.attempts.len().saturating_sub(window);
        &self.attempts[start..]
    }

    /// Appends an attempt. Ignored once the session is closed.
    pub fn record_attempt(&mut self, attempt: Attempt) {
        if self.ended_at.is_none() {
            self.attempts.push(attempt);
        }
    }

    /// Moves the session to a new difficulty level.
    pub fn set_difficulty(&mut self, difficulty: u8) {
        if self.ended_at.is_none() {
            self.current_difficulty = difficulty;
        }
    }

    /// Stamps the end timestamp. Idempotent: a second call keeps the first
    /// timestamp.
    pub fn close(&mut self, ended_at: DateTime<Utc>) {
        if self.ended_at.is_none() {
            self.ended_at = Some(ended_at);
        }
    }

    /// Derives the summary for this session without mutating it.
    #[must_use]
    pub fn summary(&self) -> SessionSummary {
        let total = self.attempts.len();
        let correct = self.attempts.iter().filter(|a| a.correct).count();
        #[allow(clippy::cast_precision_loss)]
        let accuracy = if total == 0 {
            0.0
        } else {
            correct as f64 / total as f64
        };

        SessionSummary {
            total_attempts: total,
            correct_attempts: correct,
            accuracy,
            difficulty_trajectory: self
                .attempts
                .iter()
                .map(|a| a.difficulty_at_time)
                .collect(),
            final_difficulty: self.current_difficulty,
        }
    }

    /// Builds the persisted record shape for this session.
    #[must_use]
    pub fn to_record(&self) -> SessionRecord {
        SessionRecord {
            user_id: self.user_id.clone(),
            started_at: self.started_at,
            ended_at: self.ended_at,
            attempts: self.attempts.clone(),
            final_difficulty: self.current_difficulty,
            accuracy: self.summary().accuracy,
        }
    }
}

//
// ─── SUMMARY ───────────────────────────────────────────────────────────────────
//

/// Aggregate view over a session, derived on demand.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionSummary {
    pub total_attempts: usize,
    pub correct_attempts: usize,
    pub accuracy: f64,
    pub difficulty_trajectory: Vec<u8>,
    pub final_difficulty: u8,
}

/// Persisted session summary record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub user_id: UserId,
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub attempts: Vec<Attempt>,
    pub final_difficulty: u8,
    pub accuracy: f64,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    fn attempt(id: &str, correct: bool, difficulty: u8) -> Attempt {
        Attempt::new(ScenarioId::new(id), fixed_now(), correct, difficulty, None)
    }

    #[test]
    fn presented_ids_match_attempts() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 2);
        session.record_attempt(attempt("a", true, 2));
        session.record_attempt(attempt("b", false, 2));

        let presented = session.presented_ids();
        assert_eq!(presented.len(), 2);
        assert!(presented.contains(&ScenarioId::new("a")));
        assert!(presented.contains(&ScenarioId::new("b")));
    }

    #[test]
    fn summary_counts_and_trajectory() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 2);
        session.record_attempt(attempt("a", true, 2));
        session.record_attempt(attempt("b", true, 2));
        session.set_difficulty(3);
        session.record_attempt(attempt("c", false, 3));

        let summary = session.summary();
        assert_eq!(summary.total_attempts, 3);
        assert_eq!(summary.correct_attempts, 2);
        assert!((summary.accuracy - 2.0 / 3.0).abs() < f64::EPSILON);
        assert_eq!(summary.difficulty_trajectory, vec![2, 2, 3]);
        assert_eq!(summary.final_difficulty, 3);
    }

    #[test]
    fn empty_session_has_zero_accuracy() {
        let session = Session::new(UserId::new("u1"), fixed_now(), 1);
        assert_eq!(session.summary().accuracy, 0.0);
        assert!(session.summary().difficulty_trajectory.is_empty());
    }

    #[test]
    fn closed_session_is_read_only() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 2);
        session.record_attempt(attempt("a", true, 2));
        session.close(fixed_now());

        session.record_attempt(attempt("b", true, 2));
        session.set_difficulty(5);

        assert_eq!(session.attempts().len(), 1);
        assert_eq!(session.current_difficulty(), 2);
    }

    #[test]
    fn close_keeps_first_end_timestamp() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 2);
        let first = fixed_now();
        session.close(first);
        session.close(first + chrono::Duration::minutes(5));
        assert_eq!(session.ended_at(), Some(first));
    }

    #[test]
    fn recent_attempts_returns_trailing_window() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 1);
        for (i, correct) in [true, false, true, true].iter().enumerate() {
            session.record_attempt(attempt(&format!("s{i}"), *correct, 1));
        }

        let window = session.recent_attempts(3);
        assert_eq!(window.len(), 3);
        assert_eq!(window[0].scenario_id, ScenarioId::new("s1"));

        assert_eq!(session.recent_attempts(10).len(), 4);
    }

    #[test]
    fn record_round_trips_through_json() {
        let mut session = Session::new(UserId::new("u1"), fixed_now(), 2);
        session.record_attempt(attempt("a", true, 2));
        session.close(fixed_now());

        let record = session.to_record();
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
        assert_eq!(back.accuracy, 1.0);
    }
}
