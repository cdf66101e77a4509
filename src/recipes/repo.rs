use anyhow::Context;
use axum::async_trait;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// A recipe as stored locally. Identity is the source URI; `is_saved` is the
/// only locally mutated field and survives re-fetches of the same URI.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recipe {
    pub uri: String,
    pub label: String,
    pub image: String,
    pub source: String,
    pub url: String,
    #[serde(rename = "yield")]
    #[sqlx(rename = "yield")]
    pub yield_: f64,
    pub diet_labels: Vec<String>,
    pub health_labels: Vec<String>,
    pub cautions: Vec<String>,
    pub ingredient_lines: Vec<String>,
    pub calories: f64,
    pub total_weight: f64,
    pub total_time: f64,
    pub cuisine_type: Vec<String>,
    pub meal_type: Vec<String>,
    pub dish_type: Vec<String>,
    pub is_saved: bool,
    pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeIngredient {
    pub id: Uuid,
    pub recipe_uri: String,
    pub text: String,
    pub quantity: f64,
    pub measure: Option<String>,
    pub food: String,
    pub weight: f64,
    pub food_category: Option<String>,
    pub food_id: String,
    pub image: Option<String>,
}

/// One row per nutrient the API actually reported; absent nutrients have no
/// row rather than a zero placeholder.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct RecipeNutrient {
    pub recipe_uri: String,
    pub code: String,
    pub label: String,
    pub quantity: f64,
    pub unit: String,
}

/// Seam over the local store so the reconciler can run against a fake.
#[async_trait]
pub trait RecipeStore: Send + Sync {
    async fn find_by_uri(&self, uri: &str) -> anyhow::Result<Option<Recipe>>;
    async fn is_uri_saved(&self, uri: &str) -> anyhow::Result<bool>;
    async fn insert_graph(
        &self,
        recipe: &Recipe,
        ingredients: &[RecipeIngredient],
        nutrients: &[RecipeNutrient],
    ) -> anyhow::Result<()>;
    async fn list_saved(&self) -> anyhow::Result<Vec<Recipe>>;
    /// Returns whether a row was actually updated.
    async fn set_saved(&self, uri: &str, saved: bool) -> anyhow::Result<bool>;
    async fn ingredients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeIngredient>>;
    async fn nutrients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeNutrient>>;
}

#[derive(Clone)]
pub struct PgRecipeStore {
    db: PgPool,
}

impl PgRecipeStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

const RECIPE_COLUMNS: &str = r#"uri, label, image, source, url, yield, diet_labels, health_labels,
       cautions, ingredient_lines, calories, total_weight, total_time,
       cuisine_type, meal_type, dish_type, is_saved, created_at"#;

#[async_trait]
impl RecipeStore for PgRecipeStore {
    async fn find_by_uri(&self, uri: &str) -> anyhow::Result<Option<Recipe>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE uri = $1
            "#
        ))
        .bind(uri)
        .fetch_optional(&self.db)
        .await
        .context("find recipe by uri")?;
        Ok(recipe)
    }

    async fn is_uri_saved(&self, uri: &str) -> anyhow::Result<bool> {
        let saved: Option<bool> =
            sqlx::query_scalar(r#"SELECT is_saved FROM recipes WHERE uri = $1"#)
                .bind(uri)
                .fetch_optional(&self.db)
                .await
                .context("check saved flag")?;
        Ok(saved.unwrap_or(false))
    }

    async fn insert_graph(
        &self,
        recipe: &Recipe,
        ingredients: &[RecipeIngredient],
        nutrients: &[RecipeNutrient],
    ) -> anyhow::Result<()> {
        let mut tx = self.db.begin().await.context("begin tx")?;

        sqlx::query(
            r#"
            INSERT INTO recipes (uri, label, image, source, url, yield, diet_labels,
                                 health_labels, cautions, ingredient_lines, calories,
                                 total_weight, total_time, cuisine_type, meal_type,
                                 dish_type, is_saved, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            "#,
        )
        .bind(&recipe.uri)
        .bind(&recipe.label)
        .bind(&recipe.image)
        .bind(&recipe.source)
        .bind(&recipe.url)
        .bind(recipe.yield_)
        .bind(&recipe.diet_labels)
        .bind(&recipe.health_labels)
        .bind(&recipe.cautions)
        .bind(&recipe.ingredient_lines)
        .bind(recipe.calories)
        .bind(recipe.total_weight)
        .bind(recipe.total_time)
        .bind(&recipe.cuisine_type)
        .bind(&recipe.meal_type)
        .bind(&recipe.dish_type)
        .bind(recipe.is_saved)
        .bind(recipe.created_at)
        .execute(&mut *tx)
        .await
        .context("insert recipe")?;

        for ing in ingredients {
            sqlx::query(
                r#"
                INSERT INTO recipe_ingredients (id, recipe_uri, text, quantity, measure,
                                                food, weight, food_category, food_id, image)
                VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
                "#,
            )
            .bind(ing.id)
            .bind(&ing.recipe_uri)
            .bind(&ing.text)
            .bind(ing.quantity)
            .bind(&ing.measure)
            .bind(&ing.food)
            .bind(ing.weight)
            .bind(&ing.food_category)
            .bind(&ing.food_id)
            .bind(&ing.image)
            .execute(&mut *tx)
            .await
            .context("insert ingredient")?;
        }

        for nutrient in nutrients {
            sqlx::query(
                r#"
                INSERT INTO recipe_nutrients (recipe_uri, code, label, quantity, unit)
                VALUES ($1, $2, $3, $4, $5)
                "#,
            )
            .bind(&nutrient.recipe_uri)
            .bind(&nutrient.code)
            .bind(&nutrient.label)
            .bind(nutrient.quantity)
            .bind(&nutrient.unit)
            .execute(&mut *tx)
            .await
            .context("insert nutrient")?;
        }

        tx.commit().await.context("commit recipe graph")?;
        Ok(())
    }

    async fn list_saved(&self) -> anyhow::Result<Vec<Recipe>> {
        let rows = sqlx::query_as::<_, Recipe>(&format!(
            r#"
            SELECT {RECIPE_COLUMNS}
            FROM recipes
            WHERE is_saved = TRUE
            ORDER BY created_at DESC
            "#
        ))
        .fetch_all(&self.db)
        .await
        .context("list saved recipes")?;
        Ok(rows)
    }

    async fn set_saved(&self, uri: &str, saved: bool) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE recipes SET is_saved = $2 WHERE uri = $1"#)
            .bind(uri)
            .bind(saved)
            .execute(&self.db)
            .await
            .context("update saved flag")?;
        Ok(result.rows_affected() > 0)
    }

    async fn ingredients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeIngredient>> {
        let rows = sqlx::query_as::<_, RecipeIngredient>(
            r#"
            SELECT id, recipe_uri, text, quantity, measure, food, weight,
                   food_category, food_id, image
            FROM recipe_ingredients
            WHERE recipe_uri = $1
            "#,
        )
        .bind(uri)
        .fetch_all(&self.db)
        .await
        .context("list ingredients")?;
        Ok(rows)
    }

    async fn nutrients_for(&self, uri: &str) -> anyhow::Result<Vec<RecipeNutrient>> {
        let rows = sqlx::query_as::<_, RecipeNutrient>(
            r#"
            SELECT recipe_uri, code, label, quantity, unit
            FROM recipe_nutrients
            WHERE recipe_uri = $1
            "#,
        )
        .bind(uri)
        .fetch_all(&self.db)
        .await
        .context("list nutrients")?;
        Ok(rows)
    }
}
