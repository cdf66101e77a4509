use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct CreateRestaurantRequest {
    pub name: String,
    pub cuisine: String,
    #[serde(default)]
    pub rating: f64,
    pub latitude: f64,
    pub longitude: f64,
    pub address: String,
    #[serde(default)]
    pub dietary_options: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub is_favorite: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn create_request_defaults_rating_and_options() {
        let body = r#"{
            "name": "Green Fork",
            "cuisine": "Vegetarian",
            "latitude": 37.33,
            "longitude": -122.01,
            "address": "1 Main St"
        }"#;
        let req: CreateRestaurantRequest = serde_json::from_str(body).expect("decodes");
        assert_eq!(req.rating, 0.0);
        assert!(req.dietary_options.is_empty());
    }
}
