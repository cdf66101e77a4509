/// Which request parameter a dietary restriction maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Health,
    Diet,
}

/// Map a user-facing dietary-restriction label to its API parameter.
/// Labels outside the fixed table are dropped by callers, not errors.
pub fn lookup(label: &str) -> Option<(ParamKind, &'static str)> {
    let mapped = match label {
        "Vegetarian" => (ParamKind::Health, "vegetarian"),
        "Vegan" => (ParamKind::Health, "vegan"),
        "Gluten-Free" => (ParamKind::Health, "gluten-free"),
        "Dairy-Free" => (ParamKind::Health, "dairy-free"),
        // the API has no nut-free value; peanut-free is the closest filter
        "Nut-Free" => (ParamKind::Health, "peanut-free"),
        "Low-Carb" => (ParamKind::Diet, "low-carb"),
        "Low-Fat" => (ParamKind::Diet, "low-fat"),
        "High-Protein" => (ParamKind::Diet, "high-protein"),
        "High-Fiber" => (ParamKind::Diet, "high-fiber"),
        "Low-Sodium" => (ParamKind::Diet, "low-sodium"),
        _ => return None,
    };
    Some(mapped)
}

/// Labels the UI offers; also the full domain of `lookup`.
pub const AVAILABLE_RESTRICTIONS: [&str; 10] = [
    "Vegetarian",
    "Vegan",
    "Gluten-Free",
    "Dairy-Free",
    "Nut-Free",
    "Low-Carb",
    "Low-Fat",
    "High-Protein",
    "High-Fiber",
    "Low-Sodium",
];
