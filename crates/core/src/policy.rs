use crate::model::{Attempt, DifficultyRange};

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Policy constants for the difficulty adjuster.
///
/// These are deliberately configuration rather than hard-coded numbers:
/// deployments tune them, and tests parametrize over them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdjusterConfig {
    /// How many trailing attempts the adjuster looks at.
    pub window: usize,
    /// Consecutive correct answers required to raise difficulty.
    pub promote_streak: u32,
    /// Consecutive incorrect answers required to lower difficulty.
    pub demote_streak: u32,
    /// Load score at or above which promotion is suppressed.
    pub high_load_cutoff: f64,
}

impl Default for AdjusterConfig {
    fn default() -> Self {
        Self {
            window: 3,
            promote_streak: 2,
            demote_streak: 2,
            high_load_cutoff: 0.7,
        }
    }
}

//
// ─── ADJUSTER ──────────────────────────────────────────────────────────────────
//

/// Pure difficulty-adjustment policy.
///
/// Maps a window of recent attempts (and an optional cognitive-load score) to
/// the next target difficulty. Deterministic and side-effect free, so every
/// decision is directly testable.
///
/// The policy is streak-based with hysteresis: a trailing run of correct
/// answers promotes, a trailing run of incorrect answers demotes, and any
/// non-qualifying mix leaves the level alone, so alternating results never
/// oscillate. A high load score blocks promotion for that step only; a
/// fatigued user is not pushed harder, but is still allowed to drop down.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DifficultyAdjuster {
    range: DifficultyRange,
    config: AdjusterConfig,
}

impl DifficultyAdjuster {
    #[must_use]
    pub fn new(range: DifficultyRange, config: AdjusterConfig) -> Self {
        Self { range, config }
    }

    #[must_use]
    pub fn range(&self) -> DifficultyRange {
        self.range
    }

    #[must_use]
    pub fn config(&self) -> &AdjusterConfig {
        &self.config
    }

    /// Computes the next difficulty from the trailing attempt window.
    ///
    /// `history` is expected oldest-first; only the last `window` entries are
    /// considered. An out-of-range `current` is clamped before adjustment. A
    /// missing `load` means "no modulation", never an error.
    #[must_use]
    pub fn next_difficulty(&self, history: &[Attempt], current: u8, load: Option<f64>) -> u8 {
        let current = self.range.clamp(current);

        let start = history.len().saturating_sub(self.config.window);
        let window = &history[start..];

        let (correct_run, incorrect_run) = trailing_runs(window);

        let high_load = load.is_some_and(|l| l >= self.config.high_load_cutoff);

        if correct_run >= self.config.promote_streak {
            if high_load {
                // Fatigued users are held at their level even on a hot streak.
                current
            } else {
                self.range.step_up(current)
            }
        } else if incorrect_run >= self.config.demote_streak {
            self.range.step_down(current)
        } else {
            current
        }
    }

    /// Estimates a starting difficulty for a returning user.
    ///
    /// Picks the highest level at which the user has at least three recorded
    /// attempts with accuracy of 0.7 or better, scanning hardest-first; a
    /// user with no qualifying level starts at the minimum.
    #[must_use]
    pub fn starting_difficulty(&self, history: &[Attempt]) -> u8 {
        const MIN_SAMPLES: usize = 3;
        const TARGET_ACCURACY: f64 = 0.7;

        for level in self.range.levels().rev() {
            let at_level: Vec<&Attempt> = history
                .iter()
                .filter(|a| a.difficulty_at_time == level)
                .collect();
            if at_level.len() < MIN_SAMPLES {
                continue;
            }
            let correct = at_level.iter().filter(|a| a.correct).count();
            #[allow(clippy::cast_precision_loss)]
            let accuracy = correct as f64 / at_level.len() as f64;
            if accuracy >= TARGET_ACCURACY {
                return level;
            }
        }
        self.range.min()
    }
}

impl Default for DifficultyAdjuster {
    fn default() -> Self {
        Self::new(DifficultyRange::default(), AdjusterConfig::default())
    }
}

/// Lengths of the trailing correct and incorrect runs. At most one of the two
/// is nonzero.
fn trailing_runs(window: &[Attempt]) -> (u32, u32) {
    let mut correct_run = 0_u32;
    let mut incorrect_run = 0_u32;

    for attempt in window.iter().rev() {
        if attempt.correct {
            if incorrect_run > 0 {
                break;
            }
            correct_run += 1;
        } else {
            if correct_run > 0 {
                break;
            }
            incorrect_run += 1;
        }
    }

    (correct_run, incorrect_run)
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
