//! # Health Scoring
//!
//! Summarizes how balanced a basket is. Items are re-classified by name with a
//! classifier whose fallback is [`Category::Other`], independent of the parser's
//! pantry fallback, so unknown products never inflate the pantry share.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

use crate::catalog::Catalog;
use crate::classifier::CategoryClassifier;
use crate::config::HealthConfig;
use crate::model::{Category, LineItem};

/// Per-category weight on a 0-100 scale; `None` means not food.
fn category_weight(category: Category) -> Option<u32> {
    match category {
        Category::Fruits | Category::Vegetables => Some(100),
        Category::Seafood => Some(85),
        Category::Poultry => Some(75),
        Category::Dairy => Some(70),
        Category::Bakery => Some(55),
        Category::Meat | Category::Pantry | Category::Other => Some(50),
        Category::Frozen => Some(40),
        Category::Beverages => Some(35),
        Category::Snacks => Some(15),
        Category::Household => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryCount {
    pub category: Category,
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthSummary {
    /// Quantity-weighted score, 0-100; 0 when the basket holds no food
    pub score: u8,
    /// Food units that contributed to the score
    pub scored_items: u32,
    /// Non-zero counts in category order
    pub categories: Vec<CategoryCount>,
}

#[derive(Debug, Clone)]
pub struct HealthScorer {
    classifier: CategoryClassifier,
}

impl HealthScorer {
    pub fn new(classifier: CategoryClassifier) -> Self {
        Self { classifier }
    }

    pub fn from_catalog(catalog: Arc<Catalog>, config: &HealthConfig) -> Self {
        Self::new(CategoryClassifier::new(catalog, config.default_category))
    }

    pub fn score(&self, items: &[LineItem]) -> HealthSummary {
        let mut counts = [0u32; Category::ALL.len()];
        let mut weighted: u64 = 0;
        let mut scored_items: u32 = 0;

        for item in items {
            let category = self.classifier.classify(&item.name, None);
            let quantity = item.quantity.max(1);
            if let Some(index) = Category::ALL.iter().position(|c| *c == category) {
                counts[index] += quantity;
            }
            if let Some(weight) = category_weight(category) {
                weighted += u64::from(weight) * u64::from(quantity);
                scored_items += quantity;
            }
        }

        let score = if scored_items == 0 {
            0
        } else {
            ((weighted as f64 / f64::from(scored_items)).round() as u64).min(100) as u8
        };

        let categories = Category::ALL
            .iter()
            .zip(counts.iter())
            .filter(|(_, count)| **count > 0)
            .map(|(category, count)| CategoryCount {
                category: *category,
                count: *count,
            })
            .collect();

        debug!(score, scored_items, "Basket health scored");
        HealthSummary {
            score,
            scored_items,
            categories,
        }
    }
}
