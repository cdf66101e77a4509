use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo::UserProfile;

/// Request body for onboarding. Defaults mirror the fresh-install profile.
#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    #[serde(default = "default_name")]
    pub name: String,
    #[serde(default = "default_email")]
    pub email: String,
    #[serde(default = "default_calorie_goal")]
    pub daily_calorie_goal: i32,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub health_goals: Vec<String>,
}

fn default_name() -> String {
    "New User".to_string()
}
fn default_email() -> String {
    "user@example.com".to_string()
}
fn default_calorie_goal() -> i32 {
    2000
}

#[derive(Debug, Deserialize)]
pub struct UpdateProfileRequest {
    pub name: String,
    pub email: String,
    pub daily_calorie_goal: i32,
    pub dietary_restrictions: Vec<String>,
    pub health_goals: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub daily_calorie_goal: i32,
    pub dietary_restrictions: Vec<String>,
    pub health_goals: Vec<String>,
    pub created_at: OffsetDateTime,
}

impl From<UserProfile> for ProfileResponse {
    fn from(profile: UserProfile) -> Self {
        Self {
            id: profile.id,
            name: profile.name,
            email: profile.email,
            daily_calorie_goal: profile.daily_calorie_goal,
            dietary_restrictions: profile.dietary_restrictions,
            health_goals: profile.health_goals,
            created_at: profile.created_at,
        }
    }
}
