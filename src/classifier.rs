//! # Category Classifier
//!
//! Maps free-text item names to the fixed grocery category set.
//!
//! A caller-supplied hint wins when it can be normalized to a category; otherwise
//! the lowercased name is tested against the ordered keyword table and the first
//! category with a substring hit is returned. First match, not best match.

use std::sync::Arc;
use tracing::trace;

use crate::catalog::Catalog;
use crate::model::Category;

/// Keyword classifier with a call-site specific default category
#[derive(Debug, Clone)]
pub struct CategoryClassifier {
    catalog: Arc<Catalog>,
    default_category: Category,
}

impl CategoryClassifier {
    pub fn new(catalog: Arc<Catalog>, default_category: Category) -> Self {
        Self {
            catalog,
            default_category,
        }
    }

    pub fn default_category(&self) -> Category {
        self.default_category
    }

    /// Classifies `item_name`, honoring a normalizable `hint` first.
    pub fn classify(&self, item_name: &str, hint: Option<&str>) -> Category {
        self.classify_detailed(item_name, hint)
            .unwrap_or(self.default_category)
    }

    /// Like [`classify`](Self::classify) but returns `None` instead of the default,
    /// so callers can tell a real match from the fallback.
    pub fn classify_detailed(&self, item_name: &str, hint: Option<&str>) -> Option<Category> {
        if let Some(category) = hint.and_then(|h| self.normalize_hint(h)) {
            trace!(item = %item_name, category = %category, "Category taken from hint");
            return Some(category);
        }
        self.match_keywords(item_name)
    }

    /// Coarse normalization of a free-form category hint.
    pub fn normalize_hint(&self, hint: &str) -> Option<Category> {
        let hint = hint.trim().to_lowercase();
        if hint.is_empty() {
            return None;
        }
        if let Ok(category) = hint.parse::<Category>() {
            return Some(category);
        }
        self.catalog
            .category_hints()
            .iter()
            .find(|(needle, _)| hint.contains(needle.as_str()))
            .map(|(_, category)| *category)
    }

    /// First category in table order whose keywords hit the lowercased name.
    pub fn match_keywords(&self, item_name: &str) -> Option<Category> {
        let name = item_name.to_lowercase();
        self.catalog
            .category_keywords()
            .iter()
            .find(|(_, keywords)| keywords.iter().any(|keyword| name.contains(keyword.as_str())))
            .map(|(category, _)| *category)
    }
}
