use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use trainer_core::model::{DifficultyRange, Scenario, ScenarioDraft, ScenarioId};

use crate::repository::{CatalogError, ScenarioCatalog, filter_exact, order_by_distance};
use crate::samples::sample_scenarios;

/// On-disk document shape: `{"scenarios": [...]}`.
#[derive(Debug, Serialize, Deserialize)]
struct CatalogFile {
    scenarios: Vec<ScenarioDraft>,
}

/// Flat-file catalog backed by a JSON document.
///
/// The whole file is read and validated once at open; queries are served
/// from memory and `insert` rewrites the file. Suitable for the small
/// catalogs this engine works against; a relational backend would slot in
/// behind the same [`ScenarioCatalog`] trait.
#[derive(Debug)]
pub struct JsonCatalog {
    path: PathBuf,
    range: DifficultyRange,
    scenarios: Arc<Mutex<Vec<Scenario>>>,
}

impl JsonCatalog {
    /// Opens an existing catalog file, validating every record.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the file cannot be read,
    /// `Serialization` if it is not a valid catalog document, `Invalid` if
    /// any record violates the scenario invariants, or `DuplicateId` on id
    /// collisions. Invalid records are an error, never silently dropped.
    pub fn open(path: impl AsRef<Path>, range: DifficultyRange) -> Result<Self, CatalogError> {
        let path = path.as_ref().to_path_buf();
        let raw = std::fs::read_to_string(&path).map_err(|e| CatalogError::Io(e.to_string()))?;
        let file: CatalogFile =
            serde_json::from_str(&raw).map_err(|e| CatalogError::Serialization(e.to_string()))?;

        let mut seen: HashSet<ScenarioId> = HashSet::new();
        let mut scenarios = Vec::with_capacity(file.scenarios.len());
        for draft in file.scenarios {
            let scenario = draft.validate(&range)?;
            if !seen.insert(scenario.id().clone()) {
                return Err(CatalogError::DuplicateId(scenario.id().to_string()));
            }
            scenarios.push(scenario);
        }

        Ok(Self {
            path,
            range,
            scenarios: Arc::new(Mutex::new(scenarios)),
        })
    }

    /// Opens the catalog, seeding a missing file with the built-in samples.
    ///
    /// # Errors
    ///
    /// Same conditions as [`JsonCatalog::open`], plus `Io` if the seed file
    /// cannot be written.
    pub fn create_if_missing(
        path: impl AsRef<Path>,
        range: DifficultyRange,
    ) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        if !path.exists() {
            if let Some(dir) = path.parent() {
                std::fs::create_dir_all(dir).map_err(|e| CatalogError::Io(e.to_string()))?;
            }
            let seed = CatalogFile {
                scenarios: sample_scenarios()
                    .iter()
                    .map(|s| s.as_draft().clone())
                    .collect(),
            };
            write_file(path, &seed)?;
        }
        Self::open(path, range)
    }

    /// The difficulty range this catalog validates against.
    #[must_use]
    pub fn range(&self) -> DifficultyRange {
        self.range
    }

    /// Number of scenarios currently in the catalog.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the internal lock is poisoned.
    pub fn len(&self) -> Result<usize, CatalogError> {
        Ok(self.lock()?.len())
    }

    /// Whether the catalog holds no scenarios.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Io` if the internal lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, CatalogError> {
        Ok(self.lock()?.is_empty())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Vec<Scenario>>, CatalogError> {
        self.scenarios
            .lock()
            .map_err(|e| CatalogError::Io(e.to_string()))
    }
}

fn write_file(path: &Path, file: &CatalogFile) -> Result<(), CatalogError> {
    let json = serde_json::to_string_pretty(file)
        .map_err(|e| CatalogError::Serialization(e.to_string()))?;
    std::fs::write(path, json).map_err(|e| CatalogError::Io(e.to_string()))
}

#[async_trait]
impl ScenarioCatalog for JsonCatalog {
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

        // Rewrite the file first so memory never holds a scenario the disk
        // rejected.
        let file = CatalogFile {
            scenarios: guard
                .iter()
                .chain(std::iter::once(&scenario))
                .map(|s| s.as_draft().clone())
                .collect(),
        };
        write_file(&self.path, &file)?;

        guard.push(scenario);
        Ok(())
    }
}
