use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub id: Uuid,
    pub name: String,
    pub cuisine: String,
    pub rating: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    pub dietary_options: Vec<String>,
    pub is_favorite: bool,
    pub date_added: OffsetDateTime,
}

const RESTAURANT_COLUMNS: &str = r#"id, name, cuisine, rating, latitude, longitude, address,
       dietary_options, is_favorite, date_added"#;

impl Restaurant {
    pub async fn list(db: &PgPool) -> anyhow::Result<Vec<Restaurant>> {
        let rows = sqlx::query_as::<_, Restaurant>(&format!(
            r#"
            SELECT {RESTAURANT_COLUMNS}
            FROM restaurants
            ORDER BY date_added DESC
            "#
        ))
        .fetch_all(db)
        .await
        .context("list restaurants")?;
        Ok(rows)
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn create(
        db: &PgPool,
        name: &str,
        cuisine: &str,
        rating: f64,
        latitude: f64,
        longitude: f64,
        address: &str,
        dietary_options: &[String],
    ) -> anyhow::Result<Restaurant> {
        let row = sqlx::query_as::<_, Restaurant>(&format!(
            r#"
            INSERT INTO restaurants (name, cuisine, rating, latitude, longitude, address, dietary_options)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {RESTAURANT_COLUMNS}
            "#
        ))
        .bind(name)
        .bind(cuisine)
        .bind(rating)
        .bind(latitude)
        .bind(longitude)
        .bind(address)
        .bind(dietary_options)
        .fetch_one(db)
        .await
        .context("create restaurant")?;
        Ok(row)
    }

    /// Returns whether the restaurant existed.
    pub async fn set_favorite(db: &PgPool, id: Uuid, is_favorite: bool) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"UPDATE restaurants SET is_favorite = $2 WHERE id = $1"#)
            .bind(id)
            .bind(is_favorite)
            .execute(db)
            .await
            .context("update favorite flag")?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(db: &PgPool, id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query(r#"DELETE FROM restaurants WHERE id = $1"#)
            .bind(id)
            .execute(db)
            .await
            .context("delete restaurant")?;
        Ok(result.rows_affected() > 0)
    }
}
