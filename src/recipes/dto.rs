use serde::{Deserialize, Serialize};

use super::repo::{Recipe, RecipeIngredient, RecipeNutrient};
use super::services::calories_per_serving;

/// List-level projection of a recipe for search and saved views.
#[derive(Debug, Serialize)]
pub struct RecipeSummary {
    pub uri: String,
    pub label: String,
    pub image: String,
    pub source: String,
    pub url: String,
    #[serde(rename = "yield")]
    pub yield_: f64,
    pub calories: f64,
    pub calories_per_serving: f64,
    pub total_time: f64,
    pub meal_type: Vec<String>,
    pub is_saved: bool,
}

impl From<&Recipe> for RecipeSummary {
    fn from(recipe: &Recipe) -> Self {
        Self {
            uri: recipe.uri.clone(),
            label: recipe.label.clone(),
            image: recipe.image.clone(),
            source: recipe.source.clone(),
            url: recipe.url.clone(),
            yield_: recipe.yield_,
            calories: recipe.calories,
            calories_per_serving: calories_per_serving(recipe),
            total_time: recipe.total_time,
            meal_type: recipe.meal_type.clone(),
            is_saved: recipe.is_saved,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub generation: u64,
    pub results: Vec<RecipeSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// The fixed choices the filter sheet offers.
#[derive(Debug, Serialize)]
pub struct FilterOptions {
    pub meal_types: Vec<&'static str>,
    pub dietary_restrictions: Vec<&'static str>,
}

#[derive(Debug, Deserialize)]
pub struct SavedQuery {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DetailQuery {
    pub uri: String,
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub query: String,
}

#[derive(Debug, Deserialize)]
pub struct SavedFlagRequest {
    pub uri: String,
}

/// `applied` is false when the flag could not be written (unknown uri or a
/// store failure, which is logged and otherwise has no effect).
#[derive(Debug, Serialize)]
pub struct SavedFlagResponse {
    pub uri: String,
    pub is_saved: bool,
    pub applied: bool,
}

#[derive(Debug, Serialize)]
pub struct RecipeDetails {
    #[serde(flatten)]
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub nutrients: Vec<RecipeNutrient>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recipes::services::build_graph;
    use crate::edamam::dto::test_fixtures::sample_recipe_json;

    #[test]
    fn summary_serializes_yield_under_its_wire_name() {
        let fetched = serde_json::from_str(&sample_recipe_json("u1", "Soup", 4.0, 800.0))
            .expect("fixture decodes");
        let (recipe, _, _) = build_graph(&fetched, false);
        let summary = RecipeSummary::from(&recipe);

        let json = serde_json::to_value(&summary).expect("serialize");
        assert_eq!(json["yield"], 4.0);
        assert_eq!(json["calories_per_serving"], 200.0);
        assert_eq!(json["is_saved"], false);
    }
}
