#![forbid(unsafe_code)]

pub mod error;
pub mod generator;
pub mod providers;
pub mod selector;
pub mod session;

pub use trainer_core::Clock;

pub use error::{ProviderError, SelectionError, SessionError};
pub use generator::{ChatScenarioGenerator, GeneratorConfig};
pub use providers::{HttpLoadEstimator, LoadEstimator, LoadProviderConfig, ScenarioGenerator};
pub use selector::ScenarioSelector;
pub use session::{ResponseOutcome, SessionManager};
