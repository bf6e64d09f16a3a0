use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Product tracked by the backend (read-only copy on the client)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: i64,
    pub name: String,
    /// Source platform tag, e.g. "amazon"
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    /// Official marketplace rating (0-5)
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(with = "crate::domain::timestamp")]
    pub created_at: DateTime<Utc>,
}

/// One row of a cross-platform search. Has no identity beyond its fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub name: String,
    pub price: f64,
    pub platform: String,
    pub url: String,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub reviews_count: Option<u64>,
}

/// A single platform's price inside a comparison
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlatformPrice {
    pub platform: String,
    pub price: f64,
}

/// Price comparison across platforms, cheapest first
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PriceComparison {
    pub entries: Vec<PlatformPrice>,
}

impl PriceComparison {
    /// Build a comparison from a platform → price map.
    /// Returns `None` when there is nothing to compare.
    pub fn from_prices(prices: &HashMap<String, f64>) -> Option<Self> {
        if prices.is_empty() {
            return None;
        }

        let mut entries: Vec<PlatformPrice> = prices
            .iter()
            .map(|(platform, price)| PlatformPrice {
                platform: platform.clone(),
                price: *price,
            })
            .collect();
        entries.sort_by(|a, b| {
            a.price
                .partial_cmp(&b.price)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.platform.cmp(&b.platform))
        });

        Some(Self { entries })
    }

    pub fn lowest(&self) -> Option<&PlatformPrice> {
        self.entries.first()
    }

    pub fn highest(&self) -> Option<&PlatformPrice> {
        self.entries.last()
    }

    /// Difference between the most and least expensive platform
    pub fn savings(&self) -> f64 {
        match (self.lowest(), self.highest()) {
            (Some(low), Some(high)) => high.price - low.price,
            _ => 0.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_accepts_naive_backend_timestamp() {
        let json = r#"{
            "id": 7,
            "name": "Echo Dot",
            "platform": "amazon",
            "url": "https://www.amazon.com/dp/B07XJ8C8F5",
            "price": 49.99,
            "created_at": "2024-03-02T10:11:12.345678"
        }"#;
        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, 7);
        assert_eq!(product.image_url, None);
        assert_eq!(product.rating, None);
        assert_eq!(product.price, Some(49.99));
    }

    #[test]
    fn search_result_optional_fields_default_to_none() {
        let json = r#"{"name":"Kindle","price":99.0,"platform":"ebay","url":"https://ebay.com/itm/1"}"#;
        let row: SearchResult = serde_json::from_str(json).unwrap();
        assert_eq!(row.rating, None);
        assert_eq!(row.reviews_count, None);
    }

    #[test]
    fn price_comparison_sorts_cheapest_first() {
        let prices = HashMap::from([
            ("amazon".to_string(), 120.0),
            ("ebay".to_string(), 95.5),
            ("mercadolibre".to_string(), 130.25),
        ]);
        let comparison = PriceComparison::from_prices(&prices).unwrap();

        assert_eq!(comparison.lowest().unwrap().platform, "ebay");
        assert_eq!(comparison.highest().unwrap().platform, "mercadolibre");
        assert!((comparison.savings() - 34.75).abs() < 1e-9);
    }

    #[test]
    fn empty_prices_have_no_comparison() {
        assert!(PriceComparison::from_prices(&HashMap::new()).is_none());
    }
}
