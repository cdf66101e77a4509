use serde::Deserialize;

/// One recipe as the API returns it. The `uri` is globally unique and is
/// the identity key everywhere downstream.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchedRecipe {
    pub uri: String,
    pub label: String,
    pub image: String,
    pub source: String,
    pub url: String,
    #[serde(rename = "yield")]
    pub yield_: f64,
    pub diet_labels: Vec<String>,
    pub health_labels: Vec<String>,
    pub cautions: Vec<String>,
    pub ingredient_lines: Vec<String>,
    pub ingredients: Vec<ApiIngredient>,
    pub calories: f64,
    pub total_weight: f64,
    pub total_time: f64,
    pub cuisine_type: Vec<String>,
    pub meal_type: Vec<String>,
    pub dish_type: Vec<String>,
    pub total_nutrients: ApiNutrients,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiIngredient {
    pub text: String,
    pub quantity: f64,
    pub measure: Option<String>,
    pub food: String,
    pub weight: f64,
    pub food_category: Option<String>,
    pub food_id: String,
    pub image: Option<String>,
}

/// The fixed 12-slot nutrient bundle. A slot the API leaves out stays
/// `None` and produces no persisted record.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiNutrients {
    #[serde(rename = "ENERC_KCAL")]
    pub energy: Option<ApiNutrient>,
    #[serde(rename = "FAT")]
    pub fat: Option<ApiNutrient>,
    #[serde(rename = "CHOCDF")]
    pub carbohydrate: Option<ApiNutrient>,
    #[serde(rename = "PROCNT")]
    pub protein: Option<ApiNutrient>,
    #[serde(rename = "CHOLE")]
    pub cholesterol: Option<ApiNutrient>,
    #[serde(rename = "NA")]
    pub sodium: Option<ApiNutrient>,
    #[serde(rename = "CA")]
    pub calcium: Option<ApiNutrient>,
    #[serde(rename = "MG")]
    pub magnesium: Option<ApiNutrient>,
    #[serde(rename = "K")]
    pub potassium: Option<ApiNutrient>,
    #[serde(rename = "FE")]
    pub iron: Option<ApiNutrient>,
    #[serde(rename = "FIBTG")]
    pub fiber: Option<ApiNutrient>,
    #[serde(rename = "SUGAR")]
    pub sugar: Option<ApiNutrient>,
}

impl ApiNutrients {
    /// Present slots as (code, nutrient) pairs, in bundle order.
    pub fn present(&self) -> Vec<(&'static str, &ApiNutrient)> {
        let slots = [
            ("ENERC_KCAL", &self.energy),
            ("FAT", &self.fat),
            ("CHOCDF", &self.carbohydrate),
            ("PROCNT", &self.protein),
            ("CHOLE", &self.cholesterol),
            ("NA", &self.sodium),
            ("CA", &self.calcium),
            ("MG", &self.magnesium),
            ("K", &self.potassium),
            ("FE", &self.iron),
            ("FIBTG", &self.fiber),
            ("SUGAR", &self.sugar),
        ];
        slots
            .into_iter()
            .filter_map(|(code, slot)| slot.as_ref().map(|n| (code, n)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiNutrient {
    pub label: String,
    pub quantity: f64,
    pub unit: String,
}

/// Response envelope: paging counters plus one hit wrapper per recipe.
#[derive(Debug, Deserialize)]
pub struct SearchResponse {
    pub from: i64,
    pub to: i64,
    pub count: i64,
    pub hits: Vec<RecipeHit>,
}

#[derive(Debug, Deserialize)]
pub struct RecipeHit {
    pub recipe: FetchedRecipe,
}

#[cfg(test)]
pub(crate) mod test_fixtures {
    /// A minimal but schema-complete response body with one hit.
    pub fn single_hit_body() -> String {
        format!(
            r#"{{"from":1,"to":1,"count":1,"hits":[{{"recipe":{}}}]}}"#,
            sample_recipe_json("https://example.com#recipe_1", "Lentil Soup", 4.0, 800.0)
        )
    }

    pub fn sample_recipe_json(uri: &str, label: &str, yield_: f64, calories: f64) -> String {
        format!(
            r#"{{
              "uri": "{uri}",
              "label": "{label}",
              "image": "https://img.example.com/soup.jpg",
              "source": "Test Kitchen",
              "url": "https://example.com/lentil-soup",
              "yield": {yield_},
              "dietLabels": ["High-Fiber"],
              "healthLabels": ["Vegan"],
              "cautions": [],
              "ingredientLines": ["1 cup lentils", "4 cups water"],
              "ingredients": [
                {{
                  "text": "1 cup lentils",
                  "quantity": 1.0,
                  "measure": "cup",
                  "food": "lentils",
                  "weight": 192.0,
                  "foodCategory": "plant-based protein",
                  "foodId": "food_lentils",
                  "image": null
                }}
              ],
              "calories": {calories},
              "totalWeight": 1200.0,
              "totalTime": 45.0,
              "cuisineType": ["mediterranean"],
              "mealType": ["lunch/dinner"],
              "dishType": ["soup"],
              "totalNutrients": {{
                "ENERC_KCAL": {{"label": "Energy", "quantity": {calories}, "unit": "kcal"}},
                "FAT": {{"label": "Fat", "quantity": 3.2, "unit": "g"}},
                "PROCNT": {{"label": "Protein", "quantity": 49.8, "unit": "g"}}
              }}
            }}"#
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_a_full_response_envelope() {
        let body = test_fixtures::single_hit_body();
        let parsed: SearchResponse = serde_json::from_str(&body).expect("decode response");
        assert_eq!(parsed.count, 1);
        assert_eq!(parsed.hits.len(), 1);
        let recipe = &parsed.hits[0].recipe;
        assert_eq!(recipe.label, "Lentil Soup");
        assert_eq!(recipe.yield_, 4.0);
        assert_eq!(recipe.ingredients.len(), 1);
        assert_eq!(recipe.ingredients[0].measure.as_deref(), Some("cup"));
    }

    #[test]
    fn absent_nutrient_slots_stay_none() {
        let body = test_fixtures::single_hit_body();
        let parsed: SearchResponse = serde_json::from_str(&body).expect("decode response");
        let nutrients = &parsed.hits[0].recipe.total_nutrients;
        assert!(nutrients.energy.is_some());
        assert!(nutrients.sugar.is_none());
        assert!(nutrients.sodium.is_none());
        let present = nutrients.present();
        assert_eq!(present.len(), 3);
        assert_eq!(present[0].0, "ENERC_KCAL");
    }
}
