use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Maximum length of a category name, in characters.
pub const MAX_CATEGORY_NAME_LEN: usize = 100;

/// Database identifier of a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CategoryId(pub i64);

impl fmt::Display for CategoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for CategoryId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.trim().parse()?))
    }
}

/// A user-owned task category. Names are unique per owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: CategoryId,
    pub name: String,
}

/// Body of `POST /categories`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

/// Body of `PUT/PATCH /categories/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCategoryRequest {
    pub name: String,
}

/// Trim and validate a category name.
///
/// Returns the trimmed name, or a human-readable reason it was rejected.
pub fn normalize_category_name(raw: &str) -> Result<String, String> {
    let name = raw.trim();
    if name.is_empty() {
        return Err("category name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        return Err(format!(
            "category name must be at most {MAX_CATEGORY_NAME_LEN} characters"
        ));
    }
    Ok(name.to_string())
}
