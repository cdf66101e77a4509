use std::collections::BTreeSet;

use serde::Deserialize;

use super::diet::{self, ParamKind};

/// Meal slots the UI offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub enum MealType {
    Breakfast,
    Lunch,
    Dinner,
    Snack,
}

impl MealType {
    pub const ALL: [MealType; 4] = [
        MealType::Breakfast,
        MealType::Lunch,
        MealType::Dinner,
        MealType::Snack,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MealType::Breakfast => "Breakfast",
            MealType::Lunch => "Lunch",
            MealType::Dinner => "Dinner",
            MealType::Snack => "Snack",
        }
    }
}

/// Filter state a search is built from.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SearchCriteria {
    #[serde(default)]
    pub query: String,
    #[serde(default)]
    pub meal_type: Option<MealType>,
    #[serde(default)]
    pub dietary_restrictions: Vec<String>,
    #[serde(default)]
    pub max_calories: Option<u32>,
}

impl SearchCriteria {
    /// The term actually sent as `q`: the meal-type label stands in when the
    /// free text is empty. May itself be empty (no text, no meal type).
    pub fn effective_term(&self) -> &str {
        if self.query.is_empty() {
            self.meal_type.map(MealType::label).unwrap_or("")
        } else {
            &self.query
        }
    }
}

/// Build the ordered outbound parameter list. Credentials always lead;
/// an otherwise empty criteria set still yields a valid request and the
/// server decides relevance.
pub fn build_query(criteria: &SearchCriteria, app_id: &str, app_key: &str) -> Vec<(&'static str, String)> {
    let mut params: Vec<(&'static str, String)> = vec![
        ("type", "public".to_string()),
        ("app_id", app_id.to_string()),
        ("app_key", app_key.to_string()),
    ];

    let term = criteria.effective_term();
    if !term.is_empty() {
        params.push(("q", term.to_string()));
    }

    if let Some(meal_type) = criteria.meal_type {
        params.push(("mealType", meal_type.label().to_lowercase()));
    }

    let mut health_values: BTreeSet<&'static str> = BTreeSet::new();
    let mut diet_values: BTreeSet<&'static str> = BTreeSet::new();
    for restriction in &criteria.dietary_restrictions {
        match diet::lookup(restriction) {
            Some((ParamKind::Health, value)) => {
                health_values.insert(value);
            }
            Some((ParamKind::Diet, value)) => {
                diet_values.insert(value);
            }
            None => {}
        }
    }
    for value in health_values {
        params.push(("health", value.to_string()));
    }
    for value in diet_values {
        params.push(("diet", value.to_string()));
    }

    if let Some(bound) = criteria.max_calories {
        params.push(("calories", format!("0-{}", bound)));
    }

    params.push(("random", "true".to_string()));
    params
}
