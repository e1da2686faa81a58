use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::ScenarioId;

/// Record of one scenario presentation and its response.
///
/// Created exactly once per processed response and immutable afterwards.
/// `load_at_time` is `None` whenever the cognitive-load provider was absent
/// or unavailable; that is a normal state, not an error. Serde field names
/// match the persisted session record format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub scenario_id: ScenarioId,
    pub timestamp: DateTime<Utc>,
    pub correct: bool,
    pub difficulty_at_time: u8,
    pub load_at_time: Option<f64>,
}

impl Attempt {
    #[must_use]
    pub fn new(
        scenario_id: ScenarioId,
        timestamp: DateTime<Utc>,
        correct: bool,
        difficulty_at_time: u8,
        load_at_time: Option<f64>,
    ) -> Self {
        Self {
            scenario_id,
            timestamp,
            correct,
            difficulty_at_time,
            load_at_time,
        }
    }
}
