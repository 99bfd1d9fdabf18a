//! Review text lookup and the public landing payload.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::IndexedRandom;
use serde::{Deserialize, Serialize};

use super::business::{Business, BusinessId};

/// Category used when a business's own category has no texts.
pub const FALLBACK_CATEGORY: &str = "general";

/// Suggested review texts keyed by business category.
///
/// Read from the `reviews` collection, an object of `category -> [text, ...]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReviewCatalog(HashMap<String, Vec<String>>);

impl ReviewCatalog {
    /// Pick a random text for `category`, falling back to the general list.
    pub fn choose<R: Rng + ?Sized>(&self, category: &str, rng: &mut R) -> Option<&str> {
        let texts = self
            .0
            .get(category)
            .filter(|texts| !texts.is_empty())
            .or_else(|| self.0.get(FALLBACK_CATEGORY))?;
        texts.choose(rng).map(String::as_str)
    }
}

/// Body of a successful landing page request.
#[derive(Debug, Clone, Serialize)]
pub struct LandingPage {
    pub business_id: BusinessId,
    pub business_name: String,
    pub category: String,
    pub review_text: Option<String>,
    /// Relative link that forwards to the external review site.
    pub review_link: String,
}

impl LandingPage {
    pub fn new(business: Business, review_text: Option<String>) -> Self {
        Self {
            review_link: format!("/redirect-review?bid={}", business.id),
            business_id: business.id,
            business_name: business.name,
            category: business.category,
            review_text,
        }
    }
}
