use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;

use trainer_core::model::{Scenario, ScenarioError, ScenarioId};

/// Errors surfaced by catalog backends.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogError {
    #[error("scenario not found")]
    NotFound,

    #[error("duplicate scenario id: {0}")]
    DuplicateId(String),

    #[error("io error: {0}")]
    Io(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Invalid(#[from] ScenarioError),
}

/// Read-mostly access to the scenario catalog.
///
/// `find` and `find_nearest` never return scenarios whose id is in
/// `excluding`; the per-session presented set is the caller's concern.
/// Catalog order is insertion order and is the tie-breaker for
/// `find_nearest`. The catalog is append-only: `insert` exists so accepted
/// generated scenarios can be kept, nothing is ever updated or removed
/// through this interface.
#[async_trait]
pub trait ScenarioCatalog: Send + Sync {
    /// Unseen scenarios at exactly `difficulty`, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the backend cannot be read.
    async fn find(
        &self,
        difficulty: u8,
        excluding: &HashSet<ScenarioId>,
    ) -> Result<Vec<Scenario>, CatalogError>;

    /// All unseen scenarios ordered by distance from `target`, closest
    /// first, ties broken by catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the backend cannot be read.
    async fn find_nearest(
        &self,
        target: u8,
        excluding: &HashSet<ScenarioId>,
    ) -> Result<Vec<Scenario>, CatalogError>;

    /// Fetch a scenario by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` if missing, or other backend errors.
    async fn get(&self, id: &ScenarioId) -> Result<Scenario, CatalogError>;

    /// Append a scenario to the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if the id already exists, or
    /// other backend errors.
    async fn insert(&self, scenario: Scenario) -> Result<(), CatalogError>;
}

/// Exact-difficulty filter preserving catalog order.
pub(crate) fn filter_exact(
    scenarios: &[Scenario],
    difficulty: u8,
    excluding: &HashSet<ScenarioId>,
) -> Vec<Scenario> {
    scenarios
        .iter()
        .filter(|s| s.difficulty() == difficulty && !excluding.contains(s.id()))
        .cloned()
        .collect()
}

/// Distance ordering used by `find_nearest`; the stable sort keeps catalog
/// order within each distance group.
pub(crate) fn order_by_distance(
    scenarios: &[Scenario],
    target: u8,
    excluding: &HashSet<ScenarioId>,
) -> Vec<Scenario> {
    let mut unseen: Vec<Scenario> = scenarios
        .iter()
        .filter(|s| !excluding.contains(s.id()))
        .cloned()
        .collect();
    unseen.sort_by_key(|s| s.difficulty().abs_diff(target));
    unseen
}

/// In-memory catalog for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryCatalog {
    scenarios: Arc<Mutex<Vec<Scenario>>>,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self {
            scenarios: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Builds a catalog pre-populated with the given scenarios.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::DuplicateId` if ids collide.
    pub fn with_scenarios(
        scenarios: impl IntoIterator<Item = Scenario>,
    ) -> Result<Self, CatalogError> {
        let mut seen: HashSet<ScenarioId> = HashSet::new();
        let mut entries = Vec::new();
        for scenario in scenarios {
            if !seen.insert(scenario.id().clone()) {
                return Err(CatalogError::DuplicateId(scenario.id().to_string()));
            }
            entries.push(scenario);
        }
        Ok(Self {
            scenarios: Arc::new(Mutex::new(entries)),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Scenario>>, CatalogError> {
        self.scenarios
            .lock()
            .map_err(|e| CatalogError::Io(e.to_string()))
    }
}

#[async_trait]
impl ScenarioCatalog for InMemoryCatalog {
    async fn find(
        &self,
        difficulty: u8,
        excluding: &HashSet<ScenarioId>,
    ) -> Result<Vec<Scenario>, CatalogError> {
        let guard = self.lock()?;
        Ok(filter_exact(&guard, difficulty, excluding))
    }

    async fn find_nearest(
        &self,
        target: u8,
        excluding: &HashSet<ScenarioId>,
    ) -> Result<Vec<Scenario>, CatalogError> {
        let guard = self.lock()?;
        Ok(order_by_distance(&guard, target, excluding))
    }

    async fn get(&self, id: &ScenarioId) -> Result<Scenario, CatalogError> {
        let guard = self.lock()?;
        guard
            .iter()
            .find(|s| s.id() == id)
            .cloned()
            .ok_or(CatalogError::NotFound)
    }

    async fn insert(&self, scenario: Scenario) -> Result<(), CatalogError> {
        let mut guard = self.lock()?;
        if guard.iter().any(|s| s.id() == scenario.id()) {
            return Err(CatalogError::DuplicateId(scenario.id().to_string()));
        }
        guard.push(scenario);
        Ok(())
    }
}
