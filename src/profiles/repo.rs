use anyhow::Context;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::OffsetDateTime;
use uuid::Uuid;

/// The app treats the first profile as the active one; an empty table means
/// onboarding is still required.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserProfile {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub daily_calorie_goal: i32,
    pub dietary_restrictions: Vec<String>,
    pub health_goals: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl UserProfile {
    pub async fn find_first(db: &PgPool) -> anyhow::Result<Option<UserProfile>> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            SELECT id, name, email, daily_calorie_goal, dietary_restrictions,
                   health_goals, created_at
            FROM profiles
            ORDER BY created_at ASC
            LIMIT 1
            "#,
        )
        .fetch_optional(db)
        .await
        .context("find first profile")?;
        Ok(profile)
    }

    pub async fn create(
        db: &PgPool,
        name: &str,
        email: &str,
        daily_calorie_goal: i32,
        dietary_restrictions: &[String],
        health_goals: &[String],
    ) -> anyhow::Result<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            INSERT INTO profiles (name, email, daily_calorie_goal, dietary_restrictions, health_goals)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, daily_calorie_goal, dietary_restrictions,
                      health_goals, created_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(daily_calorie_goal)
        .bind(dietary_restrictions)
        .bind(health_goals)
        .fetch_one(db)
        .await
        .context("create profile")?;
        Ok(profile)
    }

    pub async fn update(
        db: &PgPool,
        id: Uuid,
        name: &str,
        email: &str,
        daily_calorie_goal: i32,
        dietary_restrictions: &[String],
        health_goals: &[String],
    ) -> anyhow::Result<UserProfile> {
        let profile = sqlx::query_as::<_, UserProfile>(
            r#"
            UPDATE profiles
            SET name = $2, email = $3, daily_calorie_goal = $4,
                dietary_restrictions = $5, health_goals = $6
            WHERE id = $1
            RETURNING id, name, email, daily_calorie_goal, dietary_restrictions,
                      health_goals, created_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(email)
        .bind(daily_calorie_goal)
        .bind(dietary_restrictions)
        .bind(health_goals)
        .fetch_one(db)
        .await
        .context("update profile")?;
        Ok(profile)
    }
}

/// Sign-out resets the whole local store. The sweeps run per table even
/// though the schema would cascade ingredient/nutrient rows with their
/// recipe; the outcome is the same either way.
pub async fn sign_out_reset(db: &PgPool) -> anyhow::Result<()> {
    let mut tx = db.begin().await.context("begin sign-out tx")?;

    sqlx::query("DELETE FROM profiles")
        .execute(&mut *tx)
        .await
        .context("delete profiles")?;
    sqlx::query("DELETE FROM recipes")
        .execute(&mut *tx)
        .await
        .context("delete recipes")?;
    sqlx::query("DELETE FROM recipe_ingredients")
        .execute(&mut *tx)
        .await
        .context("delete ingredients")?;
    sqlx::query("DELETE FROM recipe_nutrients")
        .execute(&mut *tx)
        .await
        .context("delete nutrients")?;
    sqlx::query("DELETE FROM restaurants")
        .execute(&mut *tx)
        .await
        .context("delete restaurants")?;

    tx.commit().await.context("commit sign-out tx")?;
    Ok(())
}
