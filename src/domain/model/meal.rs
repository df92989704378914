use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// One dish on a day's menu.
///
/// `notes` carries the source's free-form allergen/diet markers. The API
/// delivers them under that name; the scraper derives them from row
/// classes. Order is irrelevant, duplicates are dropped on construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meal {
    pub name: String,
    pub category: String,
    #[serde(default)]
    pub notes: Vec<String>,
    #[serde(default)]
    pub prices: Prices,
}

impl Meal {
    pub fn new(
        name: impl Into<String>,
        category: impl Into<String>,
        notes: Vec<String>,
        prices: Prices,
    ) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            notes: notes.into_iter().sorted().dedup().collect(),
            prices,
        }
    }
}

/// Price breakdown per customer tier, in euros.
///
/// A missing tier stays `None`; it never collapses to 0 unless the source
/// literally prints a zero price.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Prices {
    pub students: Option<f64>,
    pub employees: Option<f64>,
    pub pupils: Option<f64>,
    pub others: Option<f64>,
}

impl Prices {
    pub fn student_only(price: f64) -> Self {
        Self {
            students: Some(price),
            ..Self::default()
        }
    }
}
