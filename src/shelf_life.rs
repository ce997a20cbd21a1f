//! # Shelf-Life Estimator
//!
//! Maps an item name and category to an expected freshness horizon. Ordered
//! name rules are tried first (first match wins); the category default applies
//! when none matches. Dates are plain calendar dates, no timezone shifting.

use chrono::{Days, NaiveDate};
use std::sync::Arc;
use tracing::trace;

use crate::catalog::Catalog;
use crate::model::Category;

#[derive(Debug, Clone)]
pub struct ShelfLifeEstimator {
    catalog: Arc<Catalog>,
}

impl ShelfLifeEstimator {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self { catalog }
    }

    /// Days of freshness for `item_name`, falling back to the category default.
    pub fn shelf_life_days(&self, item_name: &str, category: Category) -> u32 {
        let name = item_name.to_lowercase();
        match self
            .catalog
            .shelf_life_rules()
            .iter()
            .find(|rule| rule.pattern.is_match(&name))
        {
            Some(rule) => {
                trace!(item = %item_name, pattern = %rule.pattern, days = rule.days, "Shelf-life rule matched");
                rule.days
            }
            None => self.catalog.default_shelf_life(category),
        }
    }

    /// `reference` plus the estimated shelf life.
    pub fn estimate_expiry(
        &self,
        item_name: &str,
        category: Category,
        reference: NaiveDate,
    ) -> NaiveDate {
        let days = self.shelf_life_days(item_name, category);
        reference
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(NaiveDate::MAX)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn estimator() -> ShelfLifeEstimator {
        ShelfLifeEstimator::new(Arc::new(Catalog::builtin()))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_rule_beats_category_default() {
        let e = estimator();
        assert_eq!(e.shelf_life_days("MILK 2%", Category::Dairy), 7);
        assert_eq!(e.shelf_life_days("CHEDDAR CHEESE", Category::Dairy), 21);
    }

    #[test]
    fn test_poultry_precedes_generic_meat() {
        let e = estimator();
        assert_eq!(e.shelf_life_days("CHICKEN BREAST", Category::Meat), 2);
        assert_eq!(e.shelf_life_days("PORK CHOPS", Category::Meat), 4);
    }

    #[test]
    fn test_potato_is_not_an_apple() {
        let e = estimator();
        assert_eq!(e.shelf_life_days("POMME DE TERRE", Category::Vegetables), 30);
        assert_eq!(e.shelf_life_days("POMMES GALA", Category::Fruits), 21);
    }

    #[test]
    fn test_category_fallback() {
        let e = estimator();
        assert_eq!(e.shelf_life_days("ZXQW", Category::Pantry), 365);
        assert_eq!(e.shelf_life_days("ZXQW", Category::Other), 14);
    }

    #[test]
    fn test_calendar_arithmetic_crosses_months() {
        let e = estimator();
        assert_eq!(
            e.estimate_expiry("CHICKEN", Category::Poultry, date(2024, 2, 28)),
            date(2024, 3, 1)
        );
        assert_eq!(
            e.estimate_expiry("BANANES", Category::Fruits, date(2024, 12, 30)),
            date(2025, 1, 4)
        );
    }
}
