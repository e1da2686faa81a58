use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use catalog::ScenarioCatalog;
use trainer_core::model::{DifficultyRange, Scenario, ScenarioId};

use crate::error::SelectionError;
use crate::providers::ScenarioGenerator;

/// Picks the next scenario to present.
///
/// Selection order: exact difficulty match first, then nearest unseen
/// difficulty, then on-demand generation, then exhaustion. Within a
/// candidate group the pick is uniform random through an RNG that can be
/// seeded for reproducible tests; an unseeded selector draws from OS
/// entropy.
pub struct ScenarioSelector {
    catalog: Arc<dyn ScenarioCatalog>,
    generator: Option<Arc<dyn ScenarioGenerator>>,
    range: DifficultyRange,
    rng: StdRng,
}

impl ScenarioSelector {
    #[must_use]
    pub fn new(catalog: Arc<dyn ScenarioCatalog>, range: DifficultyRange) -> Self {
        Self {
            catalog,
            generator: None,
            range,
            rng: StdRng::from_os_rng(),
        }
    }

    /// Attach a content generator used when the catalog runs dry.
    #[must_use]
    pub fn with_generator(mut self, generator: Arc<dyn ScenarioGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Seed the selection RNG for reproducible picks.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn range(&self) -> DifficultyRange {
        self.range
    }

    /// Select an unseen scenario as close to `target_difficulty` as possible.
    ///
    /// Never returns a scenario whose id is in `presented`; updating the
    /// presented set afterwards is the caller's responsibility.
    ///
    /// # Errors
    ///
    /// Returns `SelectionError::Exhausted` when no unseen scenario exists
    /// and none can be generated, or `SelectionError::Catalog` on backend
    /// failures.
    pub async fn select(
        &mut self,
        target_difficulty: u8,
        presented: &HashSet<ScenarioId>,
        theme_hint: Option<&str>,
    ) -> Result<Scenario, SelectionError> {
        let target = self.range.clamp(target_difficulty);

        let exact = self.catalog.find(target, presented).await?;
        if let Some(scenario) = exact.choose(&mut self.rng) {
            debug!(id = %scenario.id(), difficulty = target, "selected exact-difficulty scenario");
            return Ok(scenario.clone());
        }

        let nearest = self.catalog.find_nearest(target, presented).await?;
        if let Some(closest) = nearest.first() {
            let best_distance = closest.difficulty().abs_diff(target);
            let group: Vec<&Scenario> = nearest
                .iter()
                .take_while(|s| s.difficulty().abs_diff(target) == best_distance)
                .collect();
            if let Some(scenario) = group.choose(&mut self.rng) {
                debug!(
                    id = %scenario.id(),
                    difficulty = scenario.difficulty(),
                    target,
                    "selected nearest-difficulty scenario"
                );
                return Ok((*scenario).clone());
            }
        }

        if let Some(generator) = &self.generator {
            return self
                .generate(generator.clone(), target, presented, theme_hint)
                .await;
        }

        Err(SelectionError::Exhausted)
    }

    /// Generation path: produce, validate, and keep a new scenario. Any
    /// provider fault or invariant violation degrades to exhaustion.
    async fn generate(
        &self,
        generator: Arc<dyn ScenarioGenerator>,
        target: u8,
        presented: &HashSet<ScenarioId>,
        theme_hint: Option<&str>,
    ) -> Result<Scenario, SelectionError> {
        let mut draft = match generator.generate(target, theme_hint).await {
            Ok(draft) => draft,
            Err(e) => {
                warn!(error = %e, target, "scenario generation failed");
                return Err(SelectionError::Exhausted);
            }
        };

        // Generators sometimes echo an id they were shown. A known id must
        // never be served again, so reassign before validation.
        let id_taken =
            presented.contains(&draft.id) || self.catalog.get(&draft.id).await.is_ok();
        if id_taken {
            let fresh = ScenarioId::generated();
            warn!(echoed = %draft.id, id = %fresh, "generator reused a known id, reassigning");
            draft.id = fresh;
        }

        let scenario = match draft.validate(&self.range) {
            Ok(scenario) => scenario,
            Err(e) => {
                warn!(error = %e, target, "generated scenario failed validation");
                return Err(SelectionError::Exhausted);
            }
        };

        // Keep accepted generations; a duplicate id only means the catalog
        // already has this scenario, which is harmless here.
        if let Err(e) = self.catalog.insert(scenario.clone()).await {
            warn!(error = %e, id = %scenario.id(), "could not persist generated scenario");
        }

        debug!(id = %scenario.id(), difficulty = scenario.difficulty(), "generated scenario accepted");
        Ok(scenario)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use catalog::InMemoryCatalog;
    use std::sync::Mutex;
    use trainer_core::model::ScenarioDraft;

    use crate::error::ProviderError;

    fn scenario(id: &str, difficulty: u8) -> Scenario {
        draft(id, difficulty).validate(&DifficultyRange::default()).unwrap()
    }

    fn draft(id: &str, difficulty: u8) -> ScenarioDraft {
        ScenarioDraft {
            id: ScenarioId::new(id),
            title: String::new(),
            description: String::new(),
            content: "content".into(),
            options: vec!["a".into(), "b".into()],
            correct_answer: 1,
            difficulty,
            explanation: String::new(),
            theme: "test".into(),
        }
    }

    fn selector(scenarios: Vec<Scenario>) -> ScenarioSelector {
        let catalog = InMemoryCatalog::with_scenarios(scenarios).unwrap();
        ScenarioSelector::new(Arc::new(catalog), DifficultyRange::default()).with_seed(7)
    }

    /// Generator stub returning queued drafts, or an error when empty.
    struct QueuedGenerator {
        drafts: Mutex<Vec<ScenarioDraft>>,
    }

    impl QueuedGenerator {
        fn new(drafts: Vec<ScenarioDraft>) -> Self {
            Self {
                drafts: Mutex::new(drafts),
            }
        }
    }

    #[async_trait]
    impl ScenarioGenerator for QueuedGenerator {
        async fn generate(
            &self,
            _difficulty: u8,
            _theme: Option<&str>,
        ) -> Result<ScenarioDraft, ProviderError> {
            self.drafts
                .lock()
                .unwrap()
                .pop()
                .ok_or(ProviderError::Disabled)
        }
    }

    #[tokio::test]
    async fn prefers_exact_difficulty() {
        let mut selector = selector(vec![scenario("a", 2), scenario("b", 3), scenario("c", 4)]);
        let picked = selector.select(3, &HashSet::new(), None).await.unwrap();
        assert_eq!(picked.id(), &ScenarioId::new("b"));
    }

    #[tokio::test]
    async fn never_returns_presented_scenarios() {
        let mut selector = selector(vec![scenario("a", 3), scenario("b", 3)]);
        let mut presented = HashSet::new();

        for _ in 0..2 {
            let picked = selector.select(3, &presented, None).await.unwrap();
            assert!(!presented.contains(picked.id()));
            presented.insert(picked.id().clone());
        }

        let err = selector.select(3, &presented, None).await.unwrap_err();
        assert!(matches!(err, SelectionError::Exhausted));
    }

    #[tokio::test]
    async fn falls_back_to_nearest_difficulty() {
        // Candidates only at 3 and 5; with 3 seen, target 3 must fall back to 5
        // because nothing exists at 4.
        let mut selector = selector(vec![scenario("seen", 3), scenario("far", 5)]);
        let presented: HashSet<ScenarioId> = [ScenarioId::new("seen")].into();

        let picked = selector.select(3, &presented, None).await.unwrap();
        assert_eq!(picked.difficulty(), 5);
    }

    #[tokio::test]
    async fn nearest_prefers_closest_level() {
        let mut selector = selector(vec![scenario("two", 2), scenario("five", 5)]);
        let picked = selector.select(3, &HashSet::new(), None).await.unwrap();
        assert_eq!(picked.difficulty(), 2);
    }

    #[tokio::test]
    async fn seeded_selection_is_reproducible() {
        let pool = vec![scenario("a", 3), scenario("b", 3), scenario("c", 3)];

        let mut first = selector(pool.clone());
        let mut second = selector(pool);

        for _ in 0..3 {
            let x = first.select(3, &HashSet::new(), None).await.unwrap();
            let y = second.select(3, &HashSet::new(), None).await.unwrap();
            assert_eq!(x.id(), y.id());
        }
    }

    #[tokio::test]
    async fn exhaustion_invokes_generator_and_persists_result() {
        let catalog = Arc::new(InMemoryCatalog::new());
        let generator = Arc::new(QueuedGenerator::new(vec![draft("gen_1", 3)]));
        let mut selector = ScenarioSelector::new(catalog.clone(), DifficultyRange::default())
            .with_generator(generator)
            .with_seed(7);

        let picked = selector.select(3, &HashSet::new(), None).await.unwrap();
        assert_eq!(picked.id(), &ScenarioId::new("gen_1"));

        // The accepted generation was appended to the catalog.
        assert!(catalog.get(&ScenarioId::new("gen_1")).await.is_ok());
    }

    #[tokio::test]
    async fn echoed_known_id_is_reassigned_before_serving() {
        let catalog = Arc::new(InMemoryCatalog::with_scenarios(vec![scenario("a", 3)]).unwrap());
        // The generator parrots back the id of a scenario the user has seen.
        let generator = Arc::new(QueuedGenerator::new(vec![draft("a", 3)]));
        let mut selector = ScenarioSelector::new(catalog.clone(), DifficultyRange::default())
            .with_generator(generator)
            .with_seed(7);
        let presented: HashSet<ScenarioId> = [ScenarioId::new("a")].into();

        let picked = selector.select(3, &presented, None).await.unwrap();
        assert!(!presented.contains(picked.id()));
        assert!(picked.id().as_str().starts_with("gen_"));
        assert!(catalog.get(picked.id()).await.is_ok());
    }

    #[tokio::test]
    async fn invalid_generation_is_rejected_as_exhaustion() {
        let mut bad = draft("gen_bad", 3);
        bad.correct_answer = 9;

        let catalog = Arc::new(InMemoryCatalog::new());
        let generator = Arc::new(QueuedGenerator::new(vec![bad]));
        let mut selector = ScenarioSelector::new(catalog.clone(), DifficultyRange::default())
            .with_generator(generator);

        let err = selector.select(3, &HashSet::new(), None).await.unwrap_err();
        assert!(matches!(err, SelectionError::Exhausted));
        assert!(catalog.get(&ScenarioId::new("gen_bad")).await.is_err());
    }

    #[tokio::test]
    async fn generator_failure_degrades_to_exhaustion() {
        let generator = Arc::new(QueuedGenerator::new(Vec::new()));
        let mut selector = ScenarioSelector::new(
            Arc::new(InMemoryCatalog::new()),
            DifficultyRange::default(),
        )
        .with_generator(generator);

        let err = selector.select(2, &HashSet::new(), None).await.unwrap_err();
        assert!(matches!(err, SelectionError::Exhausted));
    }

    #[tokio::test]
    async fn without_generator_reports_exhaustion() {
        let mut selector = selector(Vec::new());
        let err = selector.select(1, &HashSet::new(), None).await.unwrap_err();
        assert!(matches!(err, SelectionError::Exhausted));
    }
}
