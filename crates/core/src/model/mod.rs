mod attempt;
mod ids;
mod scenario;
mod session;

pub use ids::{ScenarioId, UserId};

pub use attempt::Attempt;
pub use scenario::{DifficultyRange, RangeError, Scenario, ScenarioDraft, ScenarioError};
pub use session::{Session, SessionRecord, SessionSummary};
