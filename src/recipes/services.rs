use std::cmp::Ordering;

use time::OffsetDateTime;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::edamam::client::{RecipeApi, SearchError};
use crate::edamam::dto::FetchedRecipe;
use crate::edamam::query::SearchCriteria;

use super::repo::{Recipe, RecipeIngredient, RecipeNutrient, RecipeStore};
use super::tracker::SearchTracker;

/// What one search call hands back to its caller: an explicit result,
/// never shared mutable state.
#[derive(Debug)]
pub struct SearchOutcome {
    pub generation: u64,
    pub recipes: Vec<Recipe>,
    pub message: Option<String>,
}

/// Which pathway invoked the pipeline. The create flow ranks and filters by
/// the calorie bound and always starts records unsaved; the browse flow
/// returns hits in fetch order and picks up an existing saved flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Create,
    Browse,
}

pub fn calories_per_serving(recipe: &Recipe) -> f64 {
    recipe.calories / recipe.yield_.max(1.0)
}

/// Create-flow ranking: drop records above the per-serving bound (when one
/// is set), then order descending by calories per serving.
pub fn rank_by_calories(mut recipes: Vec<Recipe>, max_calories: Option<f64>) -> Vec<Recipe> {
    if let Some(bound) = max_calories {
        recipes.retain(|recipe| calories_per_serving(recipe) <= bound);
    }
    recipes.sort_by(|a, b| {
        calories_per_serving(b)
            .partial_cmp(&calories_per_serving(a))
            .unwrap_or(Ordering::Equal)
    });
    recipes
}

/// Saved-view filtering: case-insensitive substring on the label and
/// meal-type membership, AND-composed. `All` (or no category) is a no-op.
pub fn filter_saved(mut recipes: Vec<Recipe>, text: Option<&str>, category: Option<&str>) -> Vec<Recipe> {
    if let Some(text) = text.filter(|t| !t.is_empty()) {
        let needle = text.to_lowercase();
        recipes.retain(|recipe| recipe.label.to_lowercase().contains(&needle));
    }
    if let Some(category) = category.filter(|c| !c.is_empty() && *c != "All") {
        let needle = category.to_lowercase();
        recipes.retain(|recipe| {
            recipe
                .meal_type
                .iter()
                .any(|entry| entry.to_lowercase().contains(&needle))
        });
    }
    recipes
}

/// Build the full persistable graph for a recipe seen for the first time.
/// Only nutrients the API actually reported become rows.
pub fn build_graph(
    fetched: &FetchedRecipe,
    is_saved: bool,
) -> (Recipe, Vec<RecipeIngredient>, Vec<RecipeNutrient>) {
    let recipe = Recipe {
        uri: fetched.uri.clone(),
        label: fetched.label.clone(),
        image: fetched.image.clone(),
        source: fetched.source.clone(),
        url: fetched.url.clone(),
        yield_: fetched.yield_,
        diet_labels: fetched.diet_labels.clone(),
        health_labels: fetched.health_labels.clone(),
        cautions: fetched.cautions.clone(),
        ingredient_lines: fetched.ingredient_lines.clone(),
        calories: fetched.calories,
        total_weight: fetched.total_weight,
        total_time: fetched.total_time,
        cuisine_type: fetched.cuisine_type.clone(),
        meal_type: fetched.meal_type.clone(),
        dish_type: fetched.dish_type.clone(),
        is_saved,
        created_at: OffsetDateTime::now_utc(),
    };

    let ingredients = fetched
        .ingredients
        .iter()
        .map(|ing| RecipeIngredient {
            id: Uuid::new_v4(),
            recipe_uri: fetched.uri.clone(),
            text: ing.text.clone(),
            quantity: ing.quantity,
            measure: ing.measure.clone(),
            food: ing.food.clone(),
            weight: ing.weight,
            food_category: ing.food_category.clone(),
            food_id: ing.food_id.clone(),
            image: ing.image.clone(),
        })
        .collect();

    let nutrients = fetched
        .total_nutrients
        .present()
        .into_iter()
        .map(|(code, nutrient)| RecipeNutrient {
            recipe_uri: fetched.uri.clone(),
            code: code.to_string(),
            label: nutrient.label.clone(),
            quantity: nutrient.quantity,
            unit: nutrient.unit.clone(),
        })
        .collect();

    (recipe, ingredients, nutrients)
}

/// Reconcile one fetched recipe against the store, keyed by URI.
///
/// First write wins: an existing record is returned untouched and the fresh
/// transport data for that URI is discarded. A record seen for the first
/// time is inserted as a full graph. `saved_aware` controls whether the new
/// record picks up an existing saved flag; the create pathway always starts
/// unsaved.
pub async fn reconcile(
    store: &dyn RecipeStore,
    fetched: &FetchedRecipe,
    saved_aware: bool,
) -> anyhow::Result<Recipe> {
    if let Some(existing) = store.find_by_uri(&fetched.uri).await? {
        return Ok(existing);
    }

    let is_saved = if saved_aware {
        match store.is_uri_saved(&fetched.uri).await {
            Ok(saved) => saved,
            Err(e) => {
                warn!(error = %e, uri = %fetched.uri, "saved check failed; assuming unsaved");
                false
            }
        }
    } else {
        false
    };

    let (recipe, ingredients, nutrients) = build_graph(fetched, is_saved);
    if let Err(e) = store.insert_graph(&recipe, &ingredients, &nutrients).await {
        // A concurrent insert of the same uri may have won; the unique key
        // makes the lookup authoritative.
        if let Some(winner) = store.find_by_uri(&fetched.uri).await? {
            debug!(uri = %fetched.uri, "lost insert race; reusing stored record");
            return Ok(winner);
        }
        return Err(e);
    }
    Ok(recipe)
}

/// The whole pipeline for one search call: fetch, reconcile each hit,
/// rank, and publish the completion to the tracker. Store failures degrade
/// to transient records and are never surfaced.
pub async fn run_search(
    api: &dyn RecipeApi,
    store: &dyn RecipeStore,
    tracker: &SearchTracker,
    criteria: &SearchCriteria,
    mode: SearchMode,
) -> Result<SearchOutcome, SearchError> {
    let ticket = tracker.begin();

    let fetched = match api.search(criteria).await {
        Ok(fetched) => fetched,
        Err(e) => {
            tracker.fail(&ticket, &e);
            return Err(e);
        }
    };

    let saved_aware = mode == SearchMode::Browse;
    let mut recipes = Vec::with_capacity(fetched.len());
    for item in &fetched {
        let recipe = match reconcile(store, item, saved_aware).await {
            Ok(recipe) => recipe,
            Err(e) => {
                warn!(error = %e, uri = %item.uri, "recipe not persisted; using transient record");
                build_graph(item, false).0
            }
        };
        recipes.push(recipe);
    }

    let (recipes, message) = match mode {
        SearchMode::Create => {
            let bound = criteria.max_calories.map(f64::from);
            let ranked = rank_by_calories(recipes, bound);
            let message = if ranked.is_empty() {
                Some(match criteria.max_calories {
                    Some(bound) => format!(
                        "No recipes found under {} calories. Try increasing your calorie target.",
                        bound
                    ),
                    None => "No recipes found matching your criteria. Try adjusting your filters."
                        .to_string(),
                })
            } else {
                None
            };
            (ranked, message)
        }
        SearchMode::Browse => (recipes, None),
    };

    if !tracker.complete(&ticket, recipes.len()) {
        debug!(
            generation = ticket.generation(),
            "stale search completion; status left to the newer search"
        );
    }

    Ok(SearchOutcome {
        generation: ticket.generation(),
        recipes,
        message,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::sync::Mutex;

    use axum::async_trait;

    use super::*;
    use crate::edamam::dto::test_fixtures::sample_recipe_json;

    fn fetched(uri: &str, label: &str, yield_: f64, calories: f64) -> FetchedRecipe {
        serde_json::from_str(&sample_recipe_json(uri, label, yield_, calories))
            .expect("fixture recipe decodes")
    }

    fn stored(uri: &str, label: &str, yield_: f64, calories: f64) -> Recipe {
        build_graph(&fetched(uri, label, yield_, calories), false).0
    }

    #[derive(Default)]
    struct MemStore {
        recipes: Mutex<HashMap<String, Recipe>>,
        ingredients: Mutex<Vec<RecipeIngredient>>,
        nutrients: Mutex<Vec<RecipeNutrient>>,
    }

    #[async_trait]
    impl RecipeStore for MemStore {
        async fn find_by_uri(&self, uri: &str) -> anyhow::Result<Option<Recipe>> {
            Ok(self.recipes.lock().expect("lock").get(uri).cloned())
        }

        async fn is_uri_saved(&self, uri: &str) -> anyhow::Result<bool> {
            Ok(self
                .recipes
                .lock()
                .expect("lock")
                .get(uri)
                .map(|r| r.is_saved)
                .unwrap_or(false))
        }

        async fn insert_graph(
            &self,
            recipe: &Recipe,
            ingredients: &[RecipeIngredient],
            nutrients: &[RecipeNutrient],
        ) -> anyhow::Result<()> {
            let mut recipes = self.recipes.lock().expect("lock");
            anyhow::ensure!(
                !recipes.contains_key(&recipe.uri),
                "duplicate key value violates unique constraint"
            );
            recipes.insert(recipe.uri.clone(), recipe.clone());
            self.ingredients
                .lock()
                .expect("lock")
                .extend_from_slice(ingredients);
            self.nutrients
                .lock()
                .expect("lock")
                .extend_from_slice(nutrients);
            Ok(())
        }

        async fn list_saved(&self) -> anyhow::Result<Vec<Recipe>> {
            Ok(self
                .recipes
                .lock()
                .expect("lock")
                .values()
                .filter(|r| r.is_saved)
                .cloned()
                .collect())
        }

        async fn set_saved(&self, uri: &str, saved: bool) -> anyhow::Result<bool> {
            let mut recipes = self.recipes.lock().expect("lock");
            match recipes.get_mut(uri) {
                Some(recipe) => {
                    recipe.is_saved = saved;
                    Ok(true)
                }
                None => Ok(false),
            }
        }

        async fn ingredients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeIngredient>> {
            Ok(self
                .ingredients
                .lock()
                .expect("lock")
                .iter()
                .filter(|i| i.recipe_uri == uri)
                .cloned()
                .collect())
        }

        async fn nutrients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeNutrient>> {
            Ok(self
                .nutrients
                .lock()
                .expect("lock")
                .iter()
                .filter(|n| n.recipe_uri == uri)
                .cloned()
                .collect())
        }
    }

    /// A store whose writes always fail, for degradation paths.
    struct BrokenStore;

    #[async_trait]
    impl RecipeStore for BrokenStore {
        async fn find_by_uri(&self, _uri: &str) -> anyhow::Result<Option<Recipe>> {
            anyhow::bail!("store offline")
        }
        async fn is_uri_saved(&self, _uri: &str) -> anyhow::Result<bool> {
            anyhow::bail!("store offline")
        }
        async fn insert_graph(
            &self,
            _recipe: &Recipe,
            _ingredients: &[RecipeIngredient],
            _nutrients: &[RecipeNutrient],
        ) -> anyhow::Result<()> {
            anyhow::bail!("store offline")
        }
        async fn list_saved(&self) -> anyhow::Result<Vec<Recipe>> {
            anyhow::bail!("store offline")
        }
        async fn set_saved(&self, _uri: &str, _saved: bool) -> anyhow::Result<bool> {
            anyhow::bail!("store offline")
        }
        async fn ingredients_for(&self, _uri: &str) -> anyhow::Result<Vec<RecipeIngredient>> {
            anyhow::bail!("store offline")
        }
        async fn nutrients_for(&self, _uri: &str) -> anyhow::Result<Vec<RecipeNutrient>> {
            anyhow::bail!("store offline")
        }
    }

    struct FakeApi {
        result: Result<Vec<FetchedRecipe>, SearchError>,
    }

    #[async_trait]
    impl RecipeApi for FakeApi {
        async fn search(&self, _criteria: &SearchCriteria) -> Result<Vec<FetchedRecipe>, SearchError> {
            self.result.clone()
        }
    }

    #[tokio::test]
    async fn reconcile_is_idempotent_per_uri() {
        let store = MemStore::default();
        let first_fetch = fetched("uri-1", "Lentil Soup", 4.0, 800.0);

        let first = reconcile(&store, &first_fetch, false).await.expect("first");
        assert_eq!(first.uri, "uri-1");
        assert_eq!(store.recipes.lock().expect("lock").len(), 1);

        // A later fetch of the same uri carries different transport data;
        // it must be discarded, not merged.
        let refetch = fetched("uri-1", "Renamed Soup", 2.0, 400.0);
        let second = reconcile(&store, &refetch, false).await.expect("second");
        assert_eq!(second.label, "Lentil Soup");
        assert_eq!(second.yield_, 4.0);
        assert_eq!(store.recipes.lock().expect("lock").len(), 1);
    }

    #[tokio::test]
    async fn reconcile_preserves_locally_set_saved_flag() {
        let store = MemStore::default();
        let item = fetched("uri-1", "Lentil Soup", 4.0, 800.0);
        reconcile(&store, &item, false).await.expect("insert");
        store.set_saved("uri-1", true).await.expect("save");

        let again = reconcile(&store, &item, false).await.expect("refetch");
        assert!(again.is_saved);
    }

    #[tokio::test]
    async fn create_pathway_always_starts_unsaved() {
        /// Simulates the saved-set membership check answering yes while the
        /// primary lookup misses.
        struct SavedProbe(MemStore);

        #[async_trait]
        impl RecipeStore for SavedProbe {
            async fn find_by_uri(&self, _uri: &str) -> anyhow::Result<Option<Recipe>> {
                Ok(None)
            }
            async fn is_uri_saved(&self, _uri: &str) -> anyhow::Result<bool> {
                Ok(true)
            }
            async fn insert_graph(
                &self,
                recipe: &Recipe,
                ingredients: &[RecipeIngredient],
                nutrients: &[RecipeNutrient],
            ) -> anyhow::Result<()> {
                self.0.insert_graph(recipe, ingredients, nutrients).await
            }
            async fn list_saved(&self) -> anyhow::Result<Vec<Recipe>> {
                self.0.list_saved().await
            }
            async fn set_saved(&self, uri: &str, saved: bool) -> anyhow::Result<bool> {
                self.0.set_saved(uri, saved).await
            }
            async fn ingredients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeIngredient>> {
                self.0.ingredients_for(uri).await
            }
            async fn nutrients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeNutrient>> {
                self.0.nutrients_for(uri).await
            }
        }

        let store = SavedProbe(MemStore::default());
        let item = fetched("uri-1", "Lentil Soup", 4.0, 800.0);

        let created = reconcile(&store, &item, false).await.expect("create flow");
        assert!(!created.is_saved);

        let browsed = reconcile(&store, &fetched("uri-2", "Granola", 6.0, 900.0), true)
            .await
            .expect("saved-aware flow");
        assert!(browsed.is_saved);
    }

    #[tokio::test]
    async fn only_reported_nutrients_become_rows() {
        let store = MemStore::default();
        let item = fetched("uri-1", "Lentil Soup", 4.0, 800.0);
        reconcile(&store, &item, false).await.expect("insert");

        let nutrients = store.nutrients_for("uri-1").await.expect("nutrients");
        // the fixture reports energy, fat and protein only
        assert_eq!(nutrients.len(), 3);
        assert!(nutrients.iter().all(|n| n.recipe_uri == "uri-1"));
        assert!(nutrients.iter().any(|n| n.code == "ENERC_KCAL"));
        assert!(!nutrients.iter().any(|n| n.code == "SUGAR"));
    }

    #[test]
    fn calories_per_serving_clamps_yield_below_one() {
        let zero_yield = stored("u", "x", 0.0, 500.0);
        assert_eq!(calories_per_serving(&zero_yield), 500.0);

        let fractional = stored("u", "x", 0.5, 500.0);
        assert_eq!(calories_per_serving(&fractional), 500.0);

        let normal = stored("u", "x", 4.0, 800.0);
        assert_eq!(calories_per_serving(&normal), 200.0);
    }

    #[test]
    fn ranking_filters_by_bound_and_sorts_descending() {
        let recipes = vec![
            stored("a", "A", 2.0, 700.0),  // 350 per serving
            stored("b", "B", 4.0, 800.0),  // 200
            stored("c", "C", 1.0, 1200.0), // 1200
            stored("d", "D", 2.0, 500.0),  // 250
        ];

        let ranked = rank_by_calories(recipes.clone(), Some(300.0));
        let uris: Vec<&str> = ranked.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["d", "b"]);

        let unbounded = rank_by_calories(recipes, None);
        let uris: Vec<&str> = unbounded.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["c", "a", "d", "b"]);
    }

    #[test]
    fn saved_filter_composes_text_and_category() {
        let mut chicken = stored("a", "Roast Chicken", 4.0, 900.0);
        chicken.meal_type = vec!["lunch/dinner".into()];
        let mut soup = stored("b", "Chicken Soup", 4.0, 400.0);
        soup.meal_type = vec!["lunch".into()];
        let mut pancakes = stored("c", "Pancakes", 4.0, 600.0);
        pancakes.meal_type = vec!["breakfast".into()];

        let saved = vec![chicken, soup, pancakes];

        let filtered = filter_saved(saved.clone(), Some("chicken"), Some("Dinner"));
        assert_eq!(filtered.len(), 1);
        assert_eq!(filtered[0].uri, "a");

        // "All" and empty category are no-ops
        let all = filter_saved(saved.clone(), Some("chicken"), Some("All"));
        assert_eq!(all.len(), 2);
        let none = filter_saved(saved.clone(), None, None);
        assert_eq!(none.len(), 3);

        let by_category = filter_saved(saved, None, Some("breakfast"));
        assert_eq!(by_category.len(), 1);
        assert_eq!(by_category[0].uri, "c");
    }

    #[tokio::test]
    async fn pipeline_persists_ranks_and_reports() {
        let api = FakeApi {
            result: Ok(vec![
                fetched("uri-1", "Lentil Soup", 4.0, 800.0),  // 200 per serving
                fetched("uri-2", "Cheesecake", 2.0, 1800.0), // 900
            ]),
        };
        let store = MemStore::default();
        let tracker = SearchTracker::new();
        let criteria = SearchCriteria {
            max_calories: Some(500),
            ..Default::default()
        };

        let outcome = run_search(&api, &store, &tracker, &criteria, SearchMode::Create)
            .await
            .expect("pipeline");

        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.recipes[0].uri, "uri-1");
        assert!(outcome.message.is_none());
        // both fetched records were reconciled even though one was filtered out
        assert_eq!(store.recipes.lock().expect("lock").len(), 2);

        let status = tracker.snapshot();
        assert_eq!(status.result_count, 1);
        assert!(!status.in_flight);
    }

    #[tokio::test]
    async fn filtered_to_empty_reports_the_calorie_message() {
        let api = FakeApi {
            result: Ok(vec![fetched("uri-1", "Cheesecake", 1.0, 1800.0)]),
        };
        let store = MemStore::default();
        let tracker = SearchTracker::new();
        let criteria = SearchCriteria {
            max_calories: Some(300),
            ..Default::default()
        };

        let outcome = run_search(&api, &store, &tracker, &criteria, SearchMode::Create)
            .await
            .expect("pipeline");
        assert!(outcome.recipes.is_empty());
        assert_eq!(
            outcome.message.as_deref(),
            Some("No recipes found under 300 calories. Try increasing your calorie target.")
        );
    }

    #[tokio::test]
    async fn browse_mode_keeps_fetch_order_and_ignores_the_bound() {
        let api = FakeApi {
            result: Ok(vec![
                fetched("uri-1", "Lentil Soup", 4.0, 800.0),  // 200 per serving
                fetched("uri-2", "Cheesecake", 2.0, 1800.0), // 900
            ]),
        };
        let store = MemStore::default();
        let tracker = SearchTracker::new();
        let criteria = SearchCriteria {
            max_calories: Some(500),
            ..Default::default()
        };

        let outcome = run_search(&api, &store, &tracker, &criteria, SearchMode::Browse)
            .await
            .expect("pipeline");

        let uris: Vec<&str> = outcome.recipes.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(uris, vec!["uri-1", "uri-2"]);
        assert!(outcome.message.is_none());
    }

    #[tokio::test]
    async fn api_no_matches_is_an_error_not_an_empty_list() {
        let api = FakeApi {
            result: Err(SearchError::NoMatches),
        };
        let store = MemStore::default();
        let tracker = SearchTracker::new();

        let err = run_search(&api, &store, &tracker, &SearchCriteria::default(), SearchMode::Create)
            .await
            .unwrap_err();
        assert_eq!(err, SearchError::NoMatches);
        assert_eq!(
            tracker.snapshot().error.as_deref(),
            Some("No recipes found")
        );
    }

    #[tokio::test]
    async fn store_failure_degrades_to_transient_records() {
        let api = FakeApi {
            result: Ok(vec![fetched("uri-1", "Lentil Soup", 4.0, 800.0)]),
        };
        let tracker = SearchTracker::new();

        let outcome = run_search(&api, &BrokenStore, &tracker, &SearchCriteria::default(), SearchMode::Create)
            .await
            .expect("pipeline despite store failure");
        assert_eq!(outcome.recipes.len(), 1);
        assert_eq!(outcome.recipes[0].label, "Lentil Soup");
    }
}
