use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct EdamamConfig {
    pub app_id: String,
    pub app_key: String,
    pub base_url: String,
    pub account_user: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub database_url: String,
    pub edamam: EdamamConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url = std::env::var("DATABASE_URL")?;
        // Missing API credentials are the one fatal startup condition.
        let edamam = EdamamConfig {
            app_id: std::env::var("EDAMAM_APP_ID")?,
            app_key: std::env::var("EDAMAM_APP_KEY")?,
            base_url: std::env::var("EDAMAM_BASE_URL")
                .unwrap_or_else(|_| "https://api.edamam.com/api/recipes/v2".into()),
            account_user: std::env::var("EDAMAM_ACCOUNT_USER").unwrap_or_else(|_| "0".into()),
        };
        Ok(Self {
            database_url,
            edamam,
        })
    }
}
