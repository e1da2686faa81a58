use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::ids::ScenarioId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

/// Errors from building a `DifficultyRange`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RangeError {
    #[error("minimum difficulty must be at least 1, got {provided}")]
    MinTooLow { provided: u8 },
    #[error("minimum difficulty {min} exceeds maximum {max}")]
    Inverted { min: u8, max: u8 },
}

/// Validation failures for scenario content.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ScenarioError {
    #[error("scenario id must not be empty")]
    EmptyId,

    #[error("scenario needs at least 2 answer options, got {len}")]
    TooFewOptions { len: usize },

    #[error("correct answer index {index} is out of range for {len} options")]
    CorrectAnswerOutOfRange { index: usize, len: usize },

    #[error("difficulty {provided} is outside the allowed range {min}..={max}")]
    DifficultyOutOfRange { provided: u8, min: u8, max: u8 },
}

//
// ─── DIFFICULTY RANGE ──────────────────────────────────────────────────────────
//

/// Inclusive bound on scenario difficulty levels.
///
/// The default range is 1..=5, matching the stock catalog format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyRange {
    min: u8,
    max: u8,
}

impl DifficultyRange {
    /// Creates a range after checking `1 <= min <= max`.
    ///
    /// # Errors
    ///
    /// Returns `RangeError` when the bounds are inverted or start below 1.
    pub fn new(min: u8, max: u8) -> Result<Self, RangeError> {
        if min < 1 {
            return Err(RangeError::MinTooLow { provided: min });
        }
        if min > max {
            return Err(RangeError::Inverted { min, max });
        }
        Ok(Self { min, max })
    }

    #[must_use]
    pub fn min(&self) -> u8 {
        self.min
    }

    #[must_use]
    pub fn max(&self) -> u8 {
        self.max
    }

    #[must_use]
    pub fn contains(&self, difficulty: u8) -> bool {
        (self.min..=self.max).contains(&difficulty)
    }

    /// Clamps a difficulty into the range.
    #[must_use]
    pub fn clamp(&self, difficulty: u8) -> u8 {
        difficulty.clamp(self.min, self.max)
    }

    /// One level harder, capped at the maximum.
    #[must_use]
    pub fn step_up(&self, difficulty: u8) -> u8 {
        self.clamp(difficulty.saturating_add(1))
    }

    /// One level easier, floored at the minimum.
    #[must_use]
    pub fn step_down(&self, difficulty: u8) -> u8 {
        self.clamp(difficulty.saturating_sub(1))
    }

    /// All levels in the range, easiest first.
    pub fn levels(&self) -> impl DoubleEndedIterator<Item = u8> + use<> {
        self.min..=self.max
    }
}

impl Default for DifficultyRange {
    fn default() -> Self {
        Self { min: 1, max: 5 }
    }
}

//
// ─── SCENARIO ──────────────────────────────────────────────────────────────────
//

/// Unvalidated scenario data as read from a catalog file or produced by a
/// generator.
///
/// Field names are the catalog compatibility surface; existing catalogs must
/// deserialize unchanged. Construct a [`Scenario`] via [`ScenarioDraft::validate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDraft {
    pub id: ScenarioId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub content: String,
    pub options: Vec<String>,
    pub correct_answer: usize,
    pub difficulty: u8,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub theme: String,
}

impl ScenarioDraft {
    /// Checks the scenario invariants and produces an immutable `Scenario`.
    ///
    /// # Errors
    ///
    /// Returns `ScenarioError` when the id is empty, fewer than two options
    /// are present, the correct-answer index does not address an option, or
    /// the difficulty falls outside `range`.
    pub fn validate(self, range: &DifficultyRange) -> Result<Scenario, ScenarioError> {
        if self.id.is_empty() {
            return Err(ScenarioError::EmptyId);
        }
        if self.options.len() < 2 {
            return Err(ScenarioError::TooFewOptions {
                len: self.options.len(),
            });
        }
        if self.correct_answer >= self.options.len() {
            return Err(ScenarioError::CorrectAnswerOutOfRange {
                index: self.correct_answer,
                len: self.options.len(),
            });
        }
        if !range.contains(self.difficulty) {
            return Err(ScenarioError::DifficultyOutOfRange {
                provided: self.difficulty,
                min: range.min(),
                max: range.max(),
            });
        }

        Ok(Scenario { inner: self })
    }
}

/// A validated, immutable training scenario.
///
/// One multiple-choice training item: narrative, answer options, the index of
/// the correct option, and an explanation shown after answering. Instances
/// only exist with their invariants satisfied (2+ options, valid answer
/// index, in-range difficulty).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Scenario {
    inner: ScenarioDraft,
}

impl Scenario {
    #[must_use]
    pub fn id(&self) -> &ScenarioId {
        &self.inner.id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.inner.title
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.inner.description
    }

    #[must_use]
    pub fn content(&self) -> &str {
        &self.inner.content
    }

    #[must_use]
    pub fn options(&self) -> &[String] {
        &self.inner.options
    }

    #[must_use]
    pub fn correct_answer(&self) -> usize {
        self.inner.correct_answer
    }

    #[must_use]
    pub fn difficulty(&self) -> u8 {
        self.inner.difficulty
    }

    #[must_use]
    pub fn explanation(&self) -> &str {
        &self.inner.explanation
    }

    #[must_use]
    pub fn theme(&self) -> &str {
        &self.inner.theme
    }

    /// Whether the given option index is the correct answer.
    #[must_use]
    pub fn is_correct(&self, choice: usize) -> bool {
        choice == self.inner.correct_answer
    }

    /// Borrow the draft shape, e.g. for re-serialization.
    #[must_use]
    pub fn as_draft(&self) -> &ScenarioDraft {
        &self.inner
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
